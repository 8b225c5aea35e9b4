//! 渲染错误类型

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Pdfium 库不可用: {0}")]
    LibraryUnavailable(String),

    #[error("无法解析 PDF: {0}")]
    Parse(String),

    #[error("页码 {page} 超出范围 (共 {page_count} 页)")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("渲染页面失败: {0}")]
    Rasterize(String),

    #[error("图片编码失败: {0}")]
    Encode(#[from] image::ImageError),

    #[error("后台任务失败: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
