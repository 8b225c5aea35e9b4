//! OCR 引擎 trait 定义

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Recognition, RecognizeProgress};

/// 进度回调
pub type ProgressFn<'a> = &'a (dyn Fn(RecognizeProgress) + Send + Sync);

/// OCR 引擎统一 trait
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// 引擎名称
    fn name(&self) -> &str;

    /// 识别编码后的图片（`data:image/...;base64,...`）
    ///
    /// `lang` 为 Tesseract 语言代码，识别过程中通过 `progress` 报告中间状态。
    async fn recognize(
        &self,
        data_uri: &str,
        lang: &str,
        progress: ProgressFn<'_>,
    ) -> Result<Recognition>;
}
