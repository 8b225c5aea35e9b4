//! 带记录的渲染器和 OCR 替身
//!
//! 渲染器把页码写进画布左上角像素的红色通道，OCR 替身从收到的
//! PNG 中读回页码，据此返回 "Text of page N"。

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::Rgba;
use scanview_core::{PdfPageViewer, SelectedFile, ViewerOptions, PDF_MEDIA_TYPE};
use scanview_ocr::{
    decode_data_uri, OcrEngine, OcrError, ProgressFn, Recognition, RecognizeProgress,
};
use scanview_render::{
    DocumentHandle, DocumentRenderer, PageHandle, RasterSurface, RenderError, Viewport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Load,
    Rasterize(u32),
    Recognize { page: u32, lang: String },
    Recognized(u32),
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == event)
    }

    pub fn recognize_position(&self, page: u32) -> Option<usize> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .position(|e| matches!(e, Event::Recognize { page: p, .. } if *p == page))
    }
}

pub struct FakeRenderer {
    /// 文件内容未写明页数时使用
    pub pages: u32,
    pub fail_load: bool,
    pub load_delay: Duration,
    pub log: EventLog,
}

/// 从 `%PDF-1.7 pages=N` 形式的内容读出页数
fn declared_pages(bytes: &[u8]) -> Option<u32> {
    let text = std::str::from_utf8(bytes).ok()?;
    text.split_once("pages=")?.1.trim().parse().ok()
}

pub struct FakeDocument {
    pages: u32,
    log: EventLog,
}

pub struct FakePage {
    number: u32,
    log: EventLog,
}

#[async_trait]
impl DocumentRenderer for FakeRenderer {
    type Document = FakeDocument;

    async fn load(&self, bytes: Arc<[u8]>) -> Result<FakeDocument, RenderError> {
        self.log.push(Event::Load);
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        if self.fail_load || !bytes.starts_with(b"%PDF") {
            return Err(RenderError::Parse("Invalid PDF structure".to_string()));
        }
        Ok(FakeDocument {
            pages: declared_pages(&bytes).unwrap_or(self.pages),
            log: self.log.clone(),
        })
    }
}

#[async_trait]
impl DocumentHandle for FakeDocument {
    type Page = FakePage;

    fn page_count(&self) -> u32 {
        self.pages
    }

    async fn page(&self, number: u32) -> Result<FakePage, RenderError> {
        if number == 0 || number > self.pages {
            return Err(RenderError::PageOutOfRange {
                page: number,
                page_count: self.pages,
            });
        }
        Ok(FakePage {
            number,
            log: self.log.clone(),
        })
    }
}

#[async_trait]
impl PageHandle for FakePage {
    fn number(&self) -> u32 {
        self.number
    }

    fn viewport(&self, scale: f32) -> Viewport {
        Viewport::from_points(100.0, 200.0, scale)
    }

    async fn render(&self, _viewport: &Viewport, surface: &mut RasterSurface) -> Result<(), RenderError> {
        self.log.push(Event::Rasterize(self.number));
        surface.fill(Rgba([self.number as u8, 0, 0, 255]));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeOcr {
    pub log: EventLog,
    pub delays: HashMap<u32, Duration>,
    pub fail_pages: HashSet<u32>,
    pub progress: Arc<Mutex<Vec<RecognizeProgress>>>,
}

#[async_trait]
impl OcrEngine for FakeOcr {
    fn name(&self) -> &str {
        "fake"
    }

    async fn recognize(
        &self,
        data_uri: &str,
        lang: &str,
        progress: ProgressFn<'_>,
    ) -> Result<Recognition, OcrError> {
        let payload = decode_data_uri(data_uri)?;
        let page = image::load_from_memory(&payload.bytes)?.to_rgba8().get_pixel(0, 0)[0] as u32;
        self.log.push(Event::Recognize {
            page,
            lang: lang.to_string(),
        });

        let start = RecognizeProgress::new("recognizing text", 0.0);
        self.progress.lock().unwrap().push(start.clone());
        progress(start);

        if let Some(delay) = self.delays.get(&page) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_pages.contains(&page) {
            return Err(OcrError::Recognition(format!("page {} unreadable", page)));
        }

        let done = RecognizeProgress::new("recognizing text", 1.0);
        self.progress.lock().unwrap().push(done.clone());
        progress(done);
        self.log.push(Event::Recognized(page));

        Ok(Recognition {
            text: format!("Text of page {}", page),
            words: Vec::new(),
        })
    }
}

pub type TestViewer = PdfPageViewer<FakeRenderer, FakeOcr>;

pub fn viewer_with(pages: u32, ocr: FakeOcr) -> (TestViewer, EventLog) {
    slow_viewer_with(pages, Duration::ZERO, ocr)
}

/// 加载文档需要 `load_delay` 的查看器
pub fn slow_viewer_with(pages: u32, load_delay: Duration, ocr: FakeOcr) -> (TestViewer, EventLog) {
    let log = ocr.log.clone();
    let renderer = FakeRenderer {
        pages,
        fail_load: false,
        load_delay,
        log: log.clone(),
    };
    (PdfPageViewer::new(renderer, ocr, ViewerOptions::default()), log)
}

pub fn viewer(pages: u32) -> (TestViewer, EventLog) {
    viewer_with(pages, FakeOcr::default())
}

pub fn pdf(name: &str) -> SelectedFile {
    SelectedFile::new(name, PDF_MEDIA_TYPE, b"%PDF-1.7 fixture".to_vec())
}

/// 内容写明页数的 PDF
pub fn pdf_with_pages(name: &str, pages: u32) -> SelectedFile {
    SelectedFile::new(name, PDF_MEDIA_TYPE, format!("%PDF-1.7 pages={}", pages).into_bytes())
}
