//! OCR 识别
//!
//! 提供统一的 `OcrEngine` 接口和基于 Tesseract CLI 的实现。
//! 输入为编码后的图片 data URI，输出为重建后的全文和单词级结果。

mod data_uri;
mod engine;
mod error;
mod tesseract;
mod types;

pub use data_uri::{decode_data_uri, DecodedImage};
pub use engine::{OcrEngine, ProgressFn};
pub use error::{OcrError, Result};
pub use tesseract::{
    detect_tesseract_status, get_tesseract_langs, get_tesseract_version, TesseractEngine,
};
pub use types::*;
