//! OCR 共享类型定义

use serde::{Deserialize, Serialize};

/// 默认识别语言
pub const DEFAULT_LANG: &str = "eng";

/// 单词级识别结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    /// 置信度 0-1
    pub confidence: f32,
    pub bbox: BBox,
}

/// 边界框（相对坐标 0-1）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// 一次识别的结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recognition {
    /// 按行重建的全文
    pub text: String,
    pub words: Vec<OcrWord>,
}

impl Recognition {
    /// 平均置信度，无单词时为 0
    pub fn mean_confidence(&self) -> f32 {
        if self.words.is_empty() {
            return 0.0;
        }
        self.words.iter().map(|w| w.confidence).sum::<f32>() / self.words.len() as f32
    }
}

/// 识别进度事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizeProgress {
    pub status: String,
    /// 0.0 ~ 1.0
    pub progress: f32,
}

impl RecognizeProgress {
    pub fn new(status: &str, progress: f32) -> Self {
        Self {
            status: status.to_string(),
            progress: progress.clamp(0.0, 1.0),
        }
    }
}

impl std::fmt::Display for RecognizeProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:.0}%", self.status, self.progress * 100.0)
    }
}

/// Tesseract 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TesseractConfig {
    /// Tesseract 可执行文件路径
    pub binary_path: Option<String>,
    /// tessdata 目录路径
    pub tessdata_path: Option<String>,
    /// 语言（如 "eng"、"chi_sim+eng"）
    pub lang: Option<String>,
    /// 页面分割模式 (0-13)
    pub psm: Option<u8>,
    /// OCR 引擎模式 (0-3)
    pub oem: Option<u8>,
}

impl TesseractConfig {
    pub fn binary_or_default(&self) -> &str {
        self.binary_path.as_deref().unwrap_or("tesseract")
    }

    pub fn lang_or_default(&self) -> &str {
        self.lang.as_deref().unwrap_or(DEFAULT_LANG)
    }

    pub fn psm_or_default(&self) -> u8 {
        self.psm.unwrap_or(6)
    }

    pub fn oem_or_default(&self) -> u8 {
        self.oem.unwrap_or(1)
    }
}

/// Tesseract 安装状态
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TesseractStatus {
    /// 是否已安装
    pub installed: bool,
    /// 版本信息
    pub version: Option<String>,
    /// 可执行文件路径
    pub binary_path: Option<String>,
    /// tessdata 路径
    pub tessdata_path: Option<String>,
    /// 可用语言列表
    pub available_langs: Vec<String>,
    /// 错误信息
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tesseract_config_defaults() {
        let config = TesseractConfig::default();
        assert_eq!(config.binary_or_default(), "tesseract");
        assert_eq!(config.lang_or_default(), "eng");
        assert_eq!(config.psm_or_default(), 6);
        assert_eq!(config.oem_or_default(), 1);
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(RecognizeProgress::new("recognizing text", 1.7).progress, 1.0);
        assert_eq!(
            RecognizeProgress::new("loading image", 0.5).to_string(),
            "loading image 50%"
        );
    }

    #[test]
    fn test_mean_confidence() {
        let bbox = BBox { x: 0.0, y: 0.0, w: 0.1, h: 0.1 };
        let recognition = Recognition {
            text: "a b".to_string(),
            words: vec![
                OcrWord { text: "a".into(), confidence: 0.5, bbox },
                OcrWord { text: "b".into(), confidence: 1.0, bbox },
            ],
        };
        assert!((recognition.mean_confidence() - 0.75).abs() < 0.001);
        assert_eq!(Recognition::default().mean_confidence(), 0.0);
    }
}
