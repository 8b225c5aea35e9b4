mod config;
mod session;
mod terminal;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use scanview_core::{PdfPageViewer, SelectedFile, SubmitOutcome, ViewerOptions};
use scanview_ocr::{detect_tesseract_status, OcrEngine, TesseractConfig, TesseractEngine};
use scanview_render::{is_valid_scale, probe_pdfium, PdfiumRenderer, MAX_SCALE};

use config::{config_path, load_config, save_config, AppConfig};
use session::Viewer;

#[derive(Parser)]
#[command(name = "scanview")]
#[command(about = "View PDF pages and recognize their text with OCR")]
#[command(version)]
struct Cli {
    /// 配置文件路径
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// OCR 语言（Tesseract 语言代码）
    #[arg(long, global = true)]
    lang: Option<String>,

    /// 渲染缩放比例
    #[arg(long, global = true)]
    scale: Option<f32>,

    /// 日志详细程度（-v info，-vv debug）
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive page viewer
    View {
        /// File to select on start
        file: Option<PathBuf>,
    },
    /// Recognize one page and print the text
    Ocr {
        file: PathBuf,
        /// 1-based page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Check pdfium and Tesseract availability
    Doctor,
    /// Show the configuration
    Config {
        /// Write the default configuration if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let path = match &cli.config {
        Some(path) => path.clone(),
        None => config_path()?,
    };
    let config = load_config(&path)
        .with_context(|| format!("读取配置失败: {}", path.display()))?;

    match cli.command {
        Commands::View { ref file } => {
            let viewer = Arc::new(build_viewer(&cli, &config)?);
            session::run(viewer, file.clone()).await?;
        }
        Commands::Ocr { ref file, page } => {
            let viewer = build_viewer(&cli, &config)?;
            let text = recognize_page(&viewer, file, page).await?;
            print!("{}", text);
        }
        Commands::Doctor => doctor(&config),
        Commands::Config { init } => {
            if init && !path.exists() {
                save_config(&path, &AppConfig::default())?;
            }
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn viewer_options(cli: &Cli, config: &AppConfig) -> ViewerOptions {
    ViewerOptions {
        scale: cli.scale.unwrap_or_else(|| config.render.scale_or_default()),
        language: cli
            .lang
            .clone()
            .unwrap_or_else(|| config.tesseract.lang_or_default().to_string()),
    }
}

fn build_viewer(cli: &Cli, config: &AppConfig) -> Result<Viewer> {
    let options = viewer_options(cli, config);
    if !is_valid_scale(options.scale) {
        bail!("缩放比例必须在 (0, {}] 之间: {}", MAX_SCALE, options.scale);
    }

    let engine = TesseractEngine::new(config.tesseract.clone())
        .context("Tesseract 不可用，请运行 `scanview doctor` 检查安装")?;
    let renderer = PdfiumRenderer::new(config.render.pdfium_path.as_ref().map(PathBuf::from));

    log::info!(
        "[Startup] scale: {}, lang: {}, ocr: {}",
        options.scale,
        options.language,
        describe_engine(engine.name(), engine.version(), engine.config())
    );
    Ok(PdfPageViewer::new(renderer, engine, options))
}

fn describe_engine(name: &str, version: &str, config: &TesseractConfig) -> String {
    format!(
        "{} {} ({}, psm {}, oem {})",
        name,
        version,
        config.binary_or_default(),
        config.psm_or_default(),
        config.oem_or_default()
    )
}

/// 选择文件、跳到指定页并提交，返回识别文本
async fn recognize_page(viewer: &Viewer, file: &Path, page: u32) -> Result<String> {
    let selected = SelectedFile::from_path(file)
        .with_context(|| format!("无法读取 {}", file.display()))?;

    viewer.select_file(Some(selected))?;
    viewer.go_to_page(page).await?;

    match viewer.submit().await? {
        SubmitOutcome::Loaded { page: rendered, page_count } if rendered != page => {
            log::warn!("[Ocr] 文档只有 {} 页，识别最后一页", page_count);
        }
        _ => {}
    }
    Ok(viewer.extracted_text())
}

fn doctor(config: &AppConfig) {
    let pdfium_path = config.render.pdfium_path.as_deref().map(Path::new);
    match probe_pdfium(pdfium_path) {
        Ok(source) => println!("pdfium:     ok ({})", source),
        Err(e) => println!("pdfium:     missing ({})", e),
    }

    let status = detect_tesseract_status(&config.tesseract);
    if status.installed {
        println!(
            "tesseract:  ok ({} at {})",
            status.version.as_deref().unwrap_or("unknown"),
            status.binary_path.as_deref().unwrap_or("?")
        );
        if let Some(tessdata) = &status.tessdata_path {
            println!("tessdata:   {}", tessdata);
        }
        let lang = config.tesseract.lang_or_default();
        let missing: Vec<&str> = lang
            .split('+')
            .filter(|l| !status.available_langs.iter().any(|a| a == l))
            .collect();
        if missing.is_empty() {
            println!("languages:  {}", status.available_langs.join(", "));
        } else {
            println!(
                "languages:  missing {} (have: {})",
                missing.join("+"),
                status.available_langs.join(", ")
            );
        }
    } else {
        println!(
            "tesseract:  missing ({})",
            status.error.as_deref().unwrap_or("unknown error")
        );
    }
}
