use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use scanview_ocr::TesseractConfig;
use scanview_render::RenderConfig;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    // ============ 渲染配置 ============
    pub render: RenderConfig,

    // ============ OCR 配置 ============
    pub tesseract: TesseractConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config dir unavailable")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 默认配置文件路径
pub fn config_path() -> ConfigResult<PathBuf> {
    let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join("scanview").join("config.json"))
}

/// 读取配置，文件不存在时使用默认值
pub fn load_config(path: &Path) -> ConfigResult<AppConfig> {
    if !path.exists() {
        log::debug!("[Config] {} 不存在，使用默认配置", path.display());
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn save_config(path: &Path, config: &AppConfig) -> ConfigResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let raw = serde_json::to_string_pretty(config)?;
    fs::write(path, raw)?;
    log::info!("[Config] 配置已保存到 {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.render.scale_or_default(), 1.5);
        assert_eq!(config.tesseract.lang_or_default(), "eng");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.render.scale = 2.0;
        config.tesseract.lang = Some("deu".to_string());
        save_config(&path, &config).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.render.scale, 2.0);
        assert_eq!(loaded.tesseract.lang_or_default(), "deu");
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"tesseract":{"binaryPath":"/usr/bin/tesseract","psm":3}}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.tesseract.binary_or_default(), "/usr/bin/tesseract");
        assert_eq!(config.tesseract.psm_or_default(), 3);
        assert_eq!(config.render.scale, 1.5);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Json(_))));
    }
}
