//! PDF 页面渲染
//!
//! 定义文档渲染协作方的接口（文档句柄、页面、视口），
//! 以及基于 pdfium-render 的实现和用于 OCR 的位图画布。

mod document;
mod error;
mod pdfium;
mod surface;

pub use document::{DocumentHandle, DocumentRenderer, PageHandle};
pub use error::{RenderError, Result};
pub use pdfium::{probe_pdfium, PdfiumDocument, PdfiumPage, PdfiumRenderer, PdfiumSource};
pub use surface::{RasterSurface, Viewport, PNG_DATA_URI_PREFIX};

use serde::{Deserialize, Serialize};

/// 默认渲染缩放比例
pub const DEFAULT_SCALE: f32 = 1.5;

/// 最大缩放比例，A4 页面约 4800x6700 像素
pub const MAX_SCALE: f32 = 8.0;

/// 缩放比例须在 (0, MAX_SCALE] 之间
pub fn is_valid_scale(scale: f32) -> bool {
    scale.is_finite() && scale > 0.0 && scale <= MAX_SCALE
}

/// 渲染配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// 视口缩放比例（1.0 = 每个 PDF 点对应 1 像素）
    pub scale: f32,
    /// pdfium 动态库路径（文件或所在目录）
    pub pdfium_path: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            pdfium_path: None,
        }
    }
}

impl RenderConfig {
    /// 无效的缩放比例回退到默认值
    pub fn scale_or_default(&self) -> f32 {
        if is_valid_scale(self.scale) {
            self.scale
        } else {
            DEFAULT_SCALE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_config_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.scale_or_default(), 1.5);
        assert!(config.pdfium_path.is_none());

        let config: RenderConfig = serde_json::from_str(r#"{"pdfiumPath":"/opt/pdfium"}"#).unwrap();
        assert_eq!(config.scale, 1.5);
        assert_eq!(config.pdfium_path.as_deref(), Some("/opt/pdfium"));
    }

    #[test]
    fn test_invalid_scale_falls_back() {
        let config = RenderConfig {
            scale: 0.0,
            pdfium_path: None,
        };
        assert_eq!(config.scale_or_default(), DEFAULT_SCALE);

        let config = RenderConfig {
            scale: f32::NAN,
            pdfium_path: None,
        };
        assert_eq!(config.scale_or_default(), DEFAULT_SCALE);

        let config = RenderConfig {
            scale: 1000.0,
            pdfium_path: None,
        };
        assert_eq!(config.scale_or_default(), DEFAULT_SCALE);
    }

    #[test]
    fn test_scale_bounds() {
        assert!(is_valid_scale(DEFAULT_SCALE));
        assert!(is_valid_scale(MAX_SCALE));
        assert!(!is_valid_scale(MAX_SCALE + 0.5));
        assert!(!is_valid_scale(-1.0));
        assert!(!is_valid_scale(f32::INFINITY));
    }
}
