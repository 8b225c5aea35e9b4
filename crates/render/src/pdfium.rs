//! 基于 pdfium-render 的文档渲染器
//!
//! pdfium 的调用是阻塞的，全部放到 `spawn_blocking` 中执行。
//! 文档句柄只保存 PDF 字节和页面尺寸，每次渲染时重新加载文档，
//! 避免跨线程持有 pdfium 对象。

use async_trait::async_trait;
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::document::{DocumentHandle, DocumentRenderer, PageHandle};
use crate::error::{RenderError, Result};
use crate::surface::{RasterSurface, Viewport};

/// pdfium 库的来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfiumSource {
    Library(PathBuf),
    System,
}

impl fmt::Display for PdfiumSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfiumSource::Library(path) => write!(f, "{}", path.display()),
            PdfiumSource::System => write!(f, "system"),
        }
    }
}

/// 获取 pdfium 库的搜索路径
fn get_pdfium_search_paths(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 0. 用户配置的目录
    if let Some(dir) = configured.filter(|p| p.is_dir()) {
        paths.push(dir.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            // 1. 可执行文件同级的 libs 目录
            paths.push(exe_dir.join("libs"));

            // 2. 可执行文件同级目录
            paths.push(exe_dir.to_path_buf());

            // 3. macOS: app bundle 内的 Resources 目录
            #[cfg(target_os = "macos")]
            {
                if let Some(contents_dir) = exe_dir.parent() {
                    paths.push(contents_dir.join("Resources").join("libs"));
                    paths.push(contents_dir.join("Resources"));
                }
            }

            // 4. Linux AppImage
            #[cfg(target_os = "linux")]
            {
                if let Ok(appdir) = std::env::var("APPDIR") {
                    let appdir_path = PathBuf::from(appdir);
                    paths.push(appdir_path.join("usr").join("lib"));
                }
            }
        }
    }

    // 5. 本地开发目录
    paths.push(PathBuf::from("libs"));

    paths
}

/// 绑定 pdfium 库
fn bind_pdfium(configured: Option<&Path>) -> Result<(Pdfium, PdfiumSource)> {
    // 配置项直接指向库文件
    if let Some(file) = configured.filter(|p| p.is_file()) {
        return Pdfium::bind_to_library(file)
            .map(|bindings| {
                (
                    Pdfium::new(bindings),
                    PdfiumSource::Library(file.to_path_buf()),
                )
            })
            .map_err(|e| RenderError::LibraryUnavailable(format!("{}: {}", file.display(), e)));
    }

    for path in &get_pdfium_search_paths(configured) {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(path);
        log::debug!("[Render] 尝试加载 pdfium: {:?}", lib_path);

        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            log::debug!("[Render] 成功从 {:?} 加载 pdfium", lib_path);
            return Ok((Pdfium::new(bindings), PdfiumSource::Library(lib_path)));
        }
    }

    log::debug!("[Render] 尝试加载系统 pdfium 库");
    Pdfium::bind_to_system_library()
        .map(|bindings| (Pdfium::new(bindings), PdfiumSource::System))
        .map_err(|e| RenderError::LibraryUnavailable(e.to_string()))
}

/// 检测 pdfium 是否可用，返回实际加载的位置
pub fn probe_pdfium(configured: Option<&Path>) -> Result<PdfiumSource> {
    bind_pdfium(configured).map(|(_, source)| source)
}

/// pdfium 渲染器
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }
}

#[async_trait]
impl DocumentRenderer for PdfiumRenderer {
    type Document = PdfiumDocument;

    async fn load(&self, bytes: Arc<[u8]>) -> Result<PdfiumDocument> {
        let library_path = self.library_path.clone();
        let doc_bytes = Arc::clone(&bytes);

        let page_sizes = tokio::task::spawn_blocking(move || -> Result<Vec<(f32, f32)>> {
            let (pdfium, source) = bind_pdfium(library_path.as_deref())?;
            log::info!("[Render] 使用 pdfium: {}", source);

            let document = pdfium
                .load_pdf_from_byte_slice(&doc_bytes, None)
                .map_err(|e| RenderError::Parse(e.to_string()))?;

            let sizes = document
                .pages()
                .iter()
                .map(|page| (page.width().value, page.height().value))
                .collect();
            Ok(sizes)
        })
        .await??;

        log::info!(
            "[Render] 文档加载完成: {} 字节, {} 页",
            bytes.len(),
            page_sizes.len()
        );

        Ok(PdfiumDocument {
            bytes,
            library_path: self.library_path.clone(),
            page_sizes,
        })
    }
}

/// pdfium 文档句柄
#[derive(Debug, Clone)]
pub struct PdfiumDocument {
    bytes: Arc<[u8]>,
    library_path: Option<PathBuf>,
    /// 各页尺寸（PDF 点）
    page_sizes: Vec<(f32, f32)>,
}

#[async_trait]
impl DocumentHandle for PdfiumDocument {
    type Page = PdfiumPage;

    fn page_count(&self) -> u32 {
        self.page_sizes.len() as u32
    }

    async fn page(&self, number: u32) -> Result<PdfiumPage> {
        let page_count = self.page_count();
        if number == 0 || number > page_count {
            return Err(RenderError::PageOutOfRange {
                page: number,
                page_count,
            });
        }

        let (width_pt, height_pt) = self.page_sizes[(number - 1) as usize];
        Ok(PdfiumPage {
            bytes: Arc::clone(&self.bytes),
            library_path: self.library_path.clone(),
            number,
            width_pt,
            height_pt,
        })
    }
}

/// pdfium 页面
#[derive(Debug, Clone)]
pub struct PdfiumPage {
    bytes: Arc<[u8]>,
    library_path: Option<PathBuf>,
    number: u32,
    width_pt: f32,
    height_pt: f32,
}

#[async_trait]
impl PageHandle for PdfiumPage {
    fn number(&self) -> u32 {
        self.number
    }

    fn viewport(&self, scale: f32) -> Viewport {
        Viewport::from_points(self.width_pt, self.height_pt, scale)
    }

    async fn render(&self, viewport: &Viewport, surface: &mut RasterSurface) -> Result<()> {
        let (target_width, target_height) = viewport.pixel_size();
        let bytes = Arc::clone(&self.bytes);
        let library_path = self.library_path.clone();
        let index = u16::try_from(self.number - 1)
            .map_err(|_| RenderError::Rasterize(format!("页码过大: {}", self.number)))?;

        log::info!(
            "[Render] 页面 {}: {}x{} pt -> {}x{} px (scale: {})",
            self.number,
            self.width_pt,
            self.height_pt,
            target_width,
            target_height,
            viewport.scale
        );

        let bitmap = tokio::task::spawn_blocking(move || -> Result<RgbaImage> {
            let (pdfium, _) = bind_pdfium(library_path.as_deref())?;
            let document = pdfium
                .load_pdf_from_byte_slice(&bytes, None)
                .map_err(|e| RenderError::Parse(e.to_string()))?;

            let page = document
                .pages()
                .get(index)
                .map_err(|e| RenderError::Rasterize(format!("获取页面 {} 失败: {}", index, e)))?;

            let render_config = PdfRenderConfig::new()
                .set_target_width(target_width as i32)
                .set_target_height(target_height as i32);

            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| RenderError::Rasterize(e.to_string()))?;

            let image = bitmap.as_image().to_rgba8();
            Ok(image)
        })
        .await??;

        surface.draw(&bitmap);
        Ok(())
    }
}
