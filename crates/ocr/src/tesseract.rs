//! Tesseract OCR 引擎实现（CLI 包装）

use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

use crate::data_uri::decode_data_uri;
use crate::engine::{OcrEngine, ProgressFn};
use crate::error::{OcrError, Result};
use crate::types::{
    BBox, OcrWord, Recognition, RecognizeProgress, TesseractConfig, TesseractStatus,
};

/// Tesseract OCR 引擎
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    config: TesseractConfig,
    version: String,
}

impl TesseractEngine {
    /// 创建 Tesseract 引擎，验证可执行文件可用
    pub fn new(config: TesseractConfig) -> Result<Self> {
        let version = get_tesseract_version(config.binary_or_default())?;
        log::info!("[Tesseract] 初始化成功，版本: {}", version);
        Ok(Self { config, version })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn config(&self) -> &TesseractConfig {
        &self.config
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(
        &self,
        data_uri: &str,
        lang: &str,
        progress: ProgressFn<'_>,
    ) -> Result<Recognition> {
        let start = Instant::now();
        progress(RecognizeProgress::new("loading image", 0.0));

        let payload = decode_data_uri(data_uri)?;
        let decoded = image::load_from_memory(&payload.bytes)?;
        let (img_width, img_height) = (decoded.width() as f32, decoded.height() as f32);
        drop(decoded);

        // 临时文件在离开作用域时删除
        let mut temp_input = tempfile::Builder::new()
            .prefix("scanview_ocr_")
            .suffix(&format!(".{}", payload.extension()))
            .tempfile()?;
        temp_input.write_all(&payload.bytes)?;
        temp_input.flush()?;
        progress(RecognizeProgress::new("loading image", 1.0));

        progress(RecognizeProgress::new("recognizing text", 0.0));
        let config = self.config.clone();
        let lang = lang.to_string();
        let input_path = temp_input.path().to_path_buf();
        let tsv = tokio::task::spawn_blocking(move || run_tesseract(&config, &input_path, &lang))
            .await??;

        let words = parse_tesseract_tsv(&tsv, img_width, img_height);
        let text = reconstruct_text(&tsv);
        progress(RecognizeProgress::new("recognizing text", 1.0));

        log::info!(
            "[Tesseract] 识别完成，耗时: {} ms，单词数: {}",
            start.elapsed().as_millis(),
            words.len()
        );

        Ok(Recognition { text, words })
    }
}

/// 调用 tesseract，返回 TSV 输出
fn run_tesseract(config: &TesseractConfig, image_path: &Path, lang: &str) -> Result<String> {
    let mut cmd = Command::new(config.binary_or_default());

    cmd.arg(image_path)
        .arg("stdout")
        .arg("-l")
        .arg(lang)
        .arg("--psm")
        .arg(config.psm_or_default().to_string())
        .arg("--oem")
        .arg(config.oem_or_default().to_string())
        .arg("tsv");

    if let Some(tessdata_path) = &config.tessdata_path {
        cmd.env("TESSDATA_PREFIX", tessdata_path);
    }

    log::info!(
        "[Tesseract] 执行: {} {} -l {} --psm {} --oem {} tsv",
        config.binary_or_default(),
        image_path.display(),
        lang,
        config.psm_or_default(),
        config.oem_or_default()
    );

    let output = cmd
        .output()
        .map_err(|e| OcrError::EngineUnavailable(format!("执行 tesseract 失败: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OcrError::Recognition(format!(
            "Tesseract 执行失败: {}",
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// TSV 中的一个单词行
struct TsvWord<'a> {
    block: u32,
    par: u32,
    line: u32,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    conf: f32,
    text: &'a str,
}

/// 逐行读取 level=5（单词）的记录，跳过表头和其他层级
///
/// TSV 格式：
/// level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
fn tsv_words(tsv: &str) -> impl Iterator<Item = TsvWord<'_>> {
    tsv.lines().skip(1).filter_map(|line| {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 {
            return None;
        }
        let level: i32 = cols[0].parse().unwrap_or(-1);
        let text = cols[11].trim();
        if level != 5 || text.is_empty() {
            return None;
        }
        Some(TsvWord {
            block: cols[2].parse().unwrap_or(0),
            par: cols[3].parse().unwrap_or(0),
            line: cols[4].parse().unwrap_or(0),
            left: cols[6].parse().unwrap_or(0.0),
            top: cols[7].parse().unwrap_or(0.0),
            width: cols[8].parse().unwrap_or(0.0),
            height: cols[9].parse().unwrap_or(0.0),
            conf: cols[10].parse().unwrap_or(-1.0),
            text,
        })
    })
}

/// 解析单词级结果，bbox 归一化到 0-1
fn parse_tesseract_tsv(tsv: &str, img_width: f32, img_height: f32) -> Vec<OcrWord> {
    let img_width = img_width.max(1.0);
    let img_height = img_height.max(1.0);

    tsv_words(tsv)
        .filter(|w| w.conf >= 0.0)
        .map(|w| OcrWord {
            text: w.text.to_string(),
            confidence: w.conf / 100.0, // Tesseract 置信度是 0-100
            bbox: BBox {
                x: w.left / img_width,
                y: w.top / img_height,
                w: w.width / img_width,
                h: w.height / img_height,
            },
        })
        .collect()
}

/// 按 block/段落/行重建全文
///
/// 同一行的单词用空格连接，行之间换行，段落之间空一行，末尾带换行。
fn reconstruct_text(tsv: &str) -> String {
    let mut text = String::new();
    let mut last: Option<(u32, u32, u32)> = None;

    for word in tsv_words(tsv) {
        let key = (word.block, word.par, word.line);
        match last {
            None => {}
            Some(prev) if prev == key => text.push(' '),
            Some((block, par, _)) if block == word.block && par == word.par => text.push('\n'),
            Some(_) => text.push_str("\n\n"),
        }
        text.push_str(word.text);
        last = Some(key);
    }

    if !text.is_empty() {
        text.push('\n');
    }
    text
}

/// 获取 Tesseract 版本
pub fn get_tesseract_version(binary_path: &str) -> Result<String> {
    let output = Command::new(binary_path)
        .arg("--version")
        .output()
        .map_err(|e| OcrError::EngineUnavailable(format!("无法执行 {}: {}", binary_path, e)))?;

    if !output.status.success() {
        return Err(OcrError::EngineUnavailable(
            "tesseract --version 执行失败".to_string(),
        ));
    }

    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(parse_version(&combined))
}

/// 版本号通常在第一行："tesseract 5.3.0" 或 "tesseract v5.3.0"
fn parse_version(output: &str) -> String {
    output
        .lines()
        .filter(|line| line.contains("tesseract"))
        .find_map(|line| line.split_whitespace().nth(1))
        .map(|v| v.trim_start_matches('v').to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 获取 Tesseract 可用语言列表
pub fn get_tesseract_langs(binary_path: &str, tessdata_path: Option<&str>) -> Result<Vec<String>> {
    let mut cmd = Command::new(binary_path);
    cmd.arg("--list-langs");

    if let Some(path) = tessdata_path {
        cmd.env("TESSDATA_PREFIX", path);
    }

    let output = cmd
        .output()
        .map_err(|e| OcrError::EngineUnavailable(format!("执行失败: {}", e)))?;

    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(parse_lang_list(&combined))
}

fn parse_lang_list(output: &str) -> Vec<String> {
    let mut langs = Vec::new();
    let mut found_list = false;

    for line in output.lines() {
        let line = line.trim();
        if line.contains("List of available languages") || line.contains("traineddata") {
            found_list = true;
            continue;
        }
        if found_list && !line.is_empty() && !line.contains(':') {
            langs.push(line.to_string());
        }
    }

    langs
}

/// 检测 Tesseract 安装状态
pub fn detect_tesseract_status(config: &TesseractConfig) -> TesseractStatus {
    let binary_path = config.binary_or_default();

    match get_tesseract_version(binary_path) {
        Ok(version) => {
            let langs = get_tesseract_langs(binary_path, config.tessdata_path.as_deref())
                .unwrap_or_default();
            let tessdata = config
                .tessdata_path
                .clone()
                .or_else(|| find_tessdata_path(binary_path));

            TesseractStatus {
                installed: true,
                version: Some(version),
                binary_path: which_tesseract(binary_path).or_else(|| Some(binary_path.to_string())),
                tessdata_path: tessdata,
                available_langs: langs,
                error: None,
            }
        }
        Err(e) => TesseractStatus {
            installed: false,
            version: None,
            binary_path: None,
            tessdata_path: None,
            available_langs: Vec::new(),
            error: Some(format!("无法检测到 Tesseract，请确认已安装并正确配置: {}", e)),
        },
    }
}

/// 查找 tesseract 可执行文件的完整路径
fn which_tesseract(binary: &str) -> Option<String> {
    if Path::new(binary).is_absolute() {
        return Some(binary.to_string());
    }

    #[cfg(target_os = "windows")]
    let finder = "where";
    #[cfg(not(target_os = "windows"))]
    let finder = "which";

    Command::new(finder)
        .arg(binary)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| {
            String::from_utf8_lossy(&o.stdout)
                .lines()
                .next()
                .map(|line| line.trim().to_string())
        })
        .filter(|s| !s.is_empty())
}

/// 查找 tessdata 路径
fn find_tessdata_path(binary_path: &str) -> Option<String> {
    if let Ok(path) = std::env::var("TESSDATA_PREFIX") {
        if Path::new(&path).exists() {
            return Some(path);
        }
    }

    // 尝试从 tesseract 输出中获取
    if let Ok(output) = Command::new(binary_path).arg("--list-langs").output() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(path) = stdout
            .lines()
            .next()
            .and_then(|line| line.split('"').nth(1))
            .filter(|p| Path::new(p).exists())
        {
            return Some(path.to_string());
        }
    }

    #[cfg(target_os = "windows")]
    let common_paths = [
        "C:\\Program Files\\Tesseract-OCR\\tessdata",
        "C:\\Program Files (x86)\\Tesseract-OCR\\tessdata",
    ];

    #[cfg(not(target_os = "windows"))]
    let common_paths = [
        "/usr/share/tesseract-ocr/5/tessdata",
        "/usr/share/tesseract-ocr/4.00/tessdata",
        "/usr/share/tessdata",
        "/usr/local/share/tessdata",
        "/opt/homebrew/share/tessdata",
    ];

    common_paths
        .iter()
        .find(|p| Path::new(p).exists())
        .map(|p| p.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t1000\t1000\t-1\t
2\t1\t1\t0\t0\t0\t100\t200\t160\t70\t-1\t
5\t1\t1\t1\t1\t1\t100\t200\t50\t20\t95.5\tHello
5\t1\t1\t1\t1\t2\t160\t200\t60\t20\t92.3\tWorld
5\t1\t1\t1\t2\t1\t100\t250\t100\t20\t88.0\tTest
5\t1\t2\t1\t1\t1\t100\t400\t80\t20\t90.0\tNext
5\t1\t2\t1\t1\t2\t190\t400\t80\t20\t91.0\tblock
";

    #[test]
    fn test_parse_tsv_word_level() {
        let results = parse_tesseract_tsv(TSV, 1000.0, 1000.0);
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].text, "Hello");
        assert_eq!(results[1].text, "World");
        assert_eq!(results[2].text, "Test");

        // 验证 bbox 归一化
        assert!((results[0].bbox.x - 0.1).abs() < 0.001);
        assert!((results[0].bbox.y - 0.2).abs() < 0.001);
        assert!((results[0].bbox.w - 0.05).abs() < 0.001);
        assert!((results[0].confidence - 0.955).abs() < 0.001);
    }

    #[test]
    fn test_parse_tsv_skips_negative_confidence() {
        let tsv = "header\n5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t-1\tghost\n";
        assert!(parse_tesseract_tsv(tsv, 100.0, 100.0).is_empty());
    }

    #[test]
    fn test_reconstruct_text_lines_and_blocks() {
        assert_eq!(reconstruct_text(TSV), "Hello World\nTest\n\nNext block\n");
    }

    #[test]
    fn test_reconstruct_text_empty() {
        let header = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n";
        assert_eq!(reconstruct_text(header), "");
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("tesseract 5.3.0\n leptonica-1.82.0"), "5.3.0");
        assert_eq!(parse_version("tesseract v4.1.1"), "4.1.1");
        assert_eq!(parse_version("something else"), "unknown");
    }

    #[test]
    fn test_parse_lang_list() {
        let output = "List of available languages in \"/usr/share/tessdata/\" (3):\nchi_sim\neng\nosd\n";
        assert_eq!(parse_lang_list(output), vec!["chi_sim", "eng", "osd"]);
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let config = TesseractConfig {
            binary_path: Some("/nonexistent/scanview-tesseract".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            TesseractEngine::new(config.clone()),
            Err(OcrError::EngineUnavailable(_))
        ));

        let status = detect_tesseract_status(&config);
        assert!(!status.installed);
        assert!(status.error.is_some());
    }
}
