//! data URI 解析

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{OcrError, Result};

/// 解码后的图片数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// 解析 `data:<mime>;base64,<payload>`
///
/// 只接受 base64 编码的 image/* 数据。
pub fn decode_data_uri(uri: &str) -> Result<DecodedImage> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| OcrError::InvalidImage("缺少 data: 前缀".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| OcrError::InvalidImage("缺少数据分隔符".to_string()))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| OcrError::InvalidImage("仅支持 base64 编码".to_string()))?;

    if !mime_type.starts_with("image/") {
        return Err(OcrError::InvalidImage(format!("不支持的类型: {}", mime_type)));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| OcrError::InvalidImage(format!("base64 解码失败: {}", e)))?;
    if bytes.is_empty() {
        return Err(OcrError::InvalidImage("图片数据为空".to_string()));
    }

    Ok(DecodedImage {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

impl DecodedImage {
    /// 临时文件扩展名
    pub fn extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/bmp" => "bmp",
            "image/tiff" => "tif",
            _ => "png",
        }
    }
}
