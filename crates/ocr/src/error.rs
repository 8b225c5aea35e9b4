//! OCR 错误类型

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR 引擎不可用: {0}")]
    EngineUnavailable(String),

    #[error("无效的图片数据: {0}")]
    InvalidImage(String),

    #[error("图像处理失败: {0}")]
    ImageProcess(#[from] image::ImageError),

    #[error("识别失败: {0}")]
    Recognition(String),

    #[error("后台任务失败: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OcrError>;
