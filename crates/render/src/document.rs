//! 文档渲染协作方接口
//!
//! 控制器只通过这组 trait 与渲染库交互：加载文档得到句柄，
//! 按页码（从 1 开始）取页面，计算视口并渲染到画布。

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::surface::{RasterSurface, Viewport};

/// 文档渲染器
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    type Document: DocumentHandle;

    /// 解析 PDF 内容，得到文档句柄
    ///
    /// 内容损坏或格式不支持时返回 `RenderError::Parse`。
    async fn load(&self, bytes: Arc<[u8]>) -> Result<Self::Document>;
}

/// 已解析文档的句柄
#[async_trait]
pub trait DocumentHandle: Send + Sync + 'static {
    type Page: PageHandle;

    /// 总页数
    fn page_count(&self) -> u32;

    /// 获取页面，页码从 1 开始
    async fn page(&self, number: u32) -> Result<Self::Page>;
}

/// 单个页面
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// 页码，从 1 开始
    fn number(&self) -> u32;

    /// 指定缩放比例下的视口
    fn viewport(&self, scale: f32) -> Viewport;

    /// 把页面渲染到画布
    ///
    /// 调用方负责先把画布调整到视口尺寸。
    async fn render(&self, viewport: &Viewport, surface: &mut RasterSurface) -> Result<()>;
}
