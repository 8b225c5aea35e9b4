//! PDF 页面查看器控制器
//!
//! 持有全部界面状态（已选文件、当前页、画布、识别文本、加载标记），
//! 对外提供四个操作：选择文件、提交、上一页、下一页。
//!
//! 每次渲染分配一个递增的序号，只有序号仍是最新的渲染才能写回画布、
//! 文本和失败信息；被新操作取代的结果直接丢弃。
//! 状态锁只在同步代码中持有，不跨越 `.await`。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scanview_ocr::{OcrEngine, RecognizeProgress, DEFAULT_LANG};
use scanview_render::{
    DocumentHandle, DocumentRenderer, PageHandle, RasterSurface, DEFAULT_SCALE,
};

use crate::error::{Result, ViewerError, ViewerFailure};
use crate::file::{SelectedFile, INVALID_FILE_MESSAGE};
use crate::view::{
    CanvasView, NavigationView, ViewModel, LOADING_MESSAGE, PROCESSING_LABEL, SUBMIT_LABEL,
};

/// 查看器选项
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    /// 渲染缩放比例
    pub scale: f32,
    /// OCR 语言
    pub language: String,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            language: DEFAULT_LANG.to_string(),
        }
    }
}

/// 提交结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 没有选择文件，什么也不做
    NoFile,
    /// 文档已加载并渲染了指定页
    Loaded { page: u32, page_count: u32 },
    /// 加载期间有更新的操作，结果已丢弃
    Superseded,
}

/// 翻页结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// 已切换到指定页
    Moved(u32),
    /// 没有文档或已到边界，什么也不做
    AtBoundary,
}

/// 单次渲染的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderOutcome {
    Rendered,
    Superseded,
}

struct ViewerState<D> {
    selected: Option<SelectedFile>,
    validation_error: Option<String>,
    document: Option<Arc<D>>,
    current_page: u32,
    surface: RasterSurface,
    rendered_page: Option<u32>,
    extracted_text: String,
    loading: bool,
    failure: Option<ViewerFailure>,
    progress: Option<RecognizeProgress>,
    /// 最新渲染序号
    render_token: u64,
    /// 最新提交序号
    load_token: u64,
}

impl<D> Default for ViewerState<D> {
    fn default() -> Self {
        Self {
            selected: None,
            validation_error: None,
            document: None,
            current_page: 1,
            surface: RasterSurface::default(),
            rendered_page: None,
            extracted_text: String::new(),
            loading: false,
            failure: None,
            progress: None,
            render_token: 0,
            load_token: 0,
        }
    }
}

impl<D: DocumentHandle> ViewerState<D> {
    /// 开始新的渲染，之前未完成的渲染全部作废
    fn begin_render(&mut self) -> u64 {
        self.render_token += 1;
        self.progress = None;
        self.render_token
    }

    fn page_count(&self) -> Option<u32> {
        self.document.as_ref().map(|doc| doc.page_count())
    }
}

/// PDF 页面查看器
pub struct PdfPageViewer<R: DocumentRenderer, O: OcrEngine> {
    renderer: R,
    ocr: O,
    options: ViewerOptions,
    state: Mutex<ViewerState<R::Document>>,
}

impl<R: DocumentRenderer, O: OcrEngine> PdfPageViewer<R, O> {
    pub fn new(renderer: R, ocr: O, options: ViewerOptions) -> Self {
        Self {
            renderer,
            ocr,
            options,
            state: Mutex::new(ViewerState::default()),
        }
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    fn state(&self) -> MutexGuard<'_, ViewerState<R::Document>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============ 操作 ============

    /// 选择文件
    ///
    /// 只接受声明为 `application/pdf` 的文件。接受后清空错误、识别文本，
    /// 页码回到 1；已加载的文档保留到下一次提交。
    pub fn select_file(&self, file: Option<SelectedFile>) -> Result<()> {
        let mut state = self.state();

        let file = match file {
            Some(file) if file.is_pdf() => file,
            other => {
                if let Some(rejected) = &other {
                    log::info!(
                        "[Viewer] 拒绝文件 {} (类型: {:?})",
                        rejected.name(),
                        rejected.media_type()
                    );
                }
                state.validation_error = Some(INVALID_FILE_MESSAGE.to_string());
                state.selected = None;
                return Err(ViewerError::InvalidFile);
            }
        };

        log::info!("[Viewer] 选择文件 {} ({} 字节)", file.name(), file.len());
        if let Some(previous) = state.selected.replace(file) {
            log::debug!("[Viewer] 释放上一个文件 {}", previous.name());
        }
        state.validation_error = None;
        state.failure = None;
        state.current_page = 1;
        state.extracted_text.clear();
        // 进行中的加载和渲染都不能再写回
        state.load_token += 1;
        state.loading = false;
        state.begin_render();
        Ok(())
    }

    /// 提交：加载已选文件并渲染当前页
    ///
    /// 无论成功失败，结束时都会清除加载标记。
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let (bytes, page, load_token) = {
            let mut state = self.state();
            let Some(file) = state.selected.as_ref() else {
                return Ok(SubmitOutcome::NoFile);
            };
            let bytes = Arc::clone(file.bytes());
            state.loading = true;
            state.failure = None;
            state.load_token += 1;
            (bytes, state.current_page, state.load_token)
        };

        log::info!("[Viewer] 开始加载文档 (#{})", load_token);
        let result = self.load_and_render(bytes, page, load_token).await;

        let mut state = self.state();
        if state.load_token == load_token {
            state.loading = false;
        }
        result
    }

    /// 上一页，第一页或没有文档时不做任何事
    pub async fn previous_page(&self) -> Result<NavigationOutcome> {
        let target = {
            let state = self.state();
            if state.document.is_none() || state.current_page <= 1 {
                return Ok(NavigationOutcome::AtBoundary);
            }
            state.current_page - 1
        };
        self.navigate_to(target).await
    }

    /// 下一页，最后一页或没有文档时不做任何事
    pub async fn next_page(&self) -> Result<NavigationOutcome> {
        let target = {
            let state = self.state();
            match state.page_count() {
                Some(count) if state.current_page < count => state.current_page + 1,
                _ => return Ok(NavigationOutcome::AtBoundary),
            }
        };
        self.navigate_to(target).await
    }

    /// 跳转到指定页
    ///
    /// 已加载文档时超出范围的页码不做任何事；尚未加载时只记录页码，
    /// 下一次提交会渲染该页（超出总页数时取最后一页）。
    pub async fn go_to_page(&self, number: u32) -> Result<NavigationOutcome> {
        {
            let mut state = self.state();
            if state.document.is_none() {
                if number == 0 {
                    return Ok(NavigationOutcome::AtBoundary);
                }
                state.current_page = number;
                return Ok(NavigationOutcome::Moved(number));
            }
        }
        self.navigate_to(number).await
    }

    // ============ 状态查询 ============

    /// 生成当前界面
    pub fn view(&self) -> ViewModel {
        let state = self.state();
        let navigation = state
            .page_count()
            .map(|total| NavigationView::new(state.current_page, total));
        let canvas = state.rendered_page.map(|page| CanvasView {
            page,
            width: state.surface.width(),
            height: state.surface.height(),
        });

        ViewModel {
            file_name: state.selected.as_ref().map(|f| f.name().to_string()),
            validation_error: state.validation_error.clone(),
            failure: state
                .failure
                .as_ref()
                .map(|f| format!("{} ({})", f.message, f.detail)),
            submit_label: if state.loading {
                PROCESSING_LABEL
            } else {
                SUBMIT_LABEL
            },
            loading_message: state.loading.then_some(LOADING_MESSAGE),
            navigation,
            canvas,
            progress: state.progress.as_ref().map(|p| p.to_string()),
            extracted_text: (!state.extracted_text.is_empty())
                .then(|| state.extracted_text.clone()),
        }
    }

    pub fn current_page(&self) -> u32 {
        self.state().current_page
    }

    pub fn page_count(&self) -> Option<u32> {
        self.state().page_count()
    }

    pub fn has_document(&self) -> bool {
        self.state().document.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn extracted_text(&self) -> String {
        self.state().extracted_text.clone()
    }

    pub fn validation_error(&self) -> Option<String> {
        self.state().validation_error.clone()
    }

    pub fn failure(&self) -> Option<ViewerFailure> {
        self.state().failure.clone()
    }

    pub fn selected_file(&self) -> Option<SelectedFile> {
        self.state().selected.clone()
    }

    /// 读取画布
    pub fn with_surface<T>(&self, f: impl FnOnce(&RasterSurface) -> T) -> T {
        f(&self.state().surface)
    }

    // ============ 内部流程 ============

    /// 加载文档并渲染提交时记录的页码
    async fn load_and_render(
        &self,
        bytes: Arc<[u8]>,
        page: u32,
        load_token: u64,
    ) -> Result<SubmitOutcome> {
        let document = match self.renderer.load(bytes).await {
            Ok(document) => Arc::new(document),
            Err(e) => return self.fail_load(load_token, ViewerError::DocumentParse(e)),
        };

        let page_count = document.page_count();
        if page_count == 0 {
            return self.fail_load(load_token, ViewerError::EmptyDocument);
        }

        let (page, render_token) = {
            let mut state = self.state();
            if state.load_token != load_token {
                log::info!("[Viewer] 文档加载 #{} 已被取代", load_token);
                return Ok(SubmitOutcome::Superseded);
            }
            state.document = Some(Arc::clone(&document));
            state.current_page = page.clamp(1, page_count);
            state.rendered_page = None;
            state.surface = RasterSurface::default();
            state.extracted_text.clear();
            (state.current_page, state.begin_render())
        };

        log::info!("[Viewer] 文档加载完成，共 {} 页", page_count);
        match self.render_page(document, page, render_token).await? {
            RenderOutcome::Rendered => Ok(SubmitOutcome::Loaded { page, page_count }),
            RenderOutcome::Superseded => Ok(SubmitOutcome::Superseded),
        }
    }

    /// 切换到目标页；页码在加锁后按当前文档重新校验
    async fn navigate_to(&self, target: u32) -> Result<NavigationOutcome> {
        let (document, token) = {
            let mut state = self.state();
            let Some(document) = state.document.clone() else {
                return Ok(NavigationOutcome::AtBoundary);
            };
            if !(1..=document.page_count()).contains(&target) {
                return Ok(NavigationOutcome::AtBoundary);
            }
            state.current_page = target;
            state.failure = None;
            (document, state.begin_render())
        };

        log::info!("[Viewer] 切换到第 {} 页", target);
        self.render_page(document, target, token).await?;
        Ok(NavigationOutcome::Moved(target))
    }

    /// 渲染并识别一页
    ///
    /// 顺序：取页面 → 计算视口 → 调整画布 → 渲染 → 导出 PNG → 显示画布
    /// → OCR → 写回文本。识别一定在同一页渲染完成之后才开始。
    async fn render_page(
        &self,
        document: Arc<R::Document>,
        number: u32,
        token: u64,
    ) -> Result<RenderOutcome> {
        let page = match document.page(number).await {
            Ok(page) => page,
            Err(source) => {
                return self.fail_render(token, ViewerError::Rasterize { page: number, source })
            }
        };

        let viewport = page.viewport(self.options.scale);
        let mut surface = RasterSurface::default();
        surface.resize_to(&viewport);

        if let Err(source) = page.render(&viewport, &mut surface).await {
            return self.fail_render(token, ViewerError::Rasterize { page: number, source });
        }

        let data_uri = match surface.to_data_uri() {
            Ok(uri) => uri,
            Err(source) => {
                return self.fail_render(token, ViewerError::Rasterize { page: number, source })
            }
        };

        // 先显示画布，再开始较慢的识别
        {
            let mut state = self.state();
            if state.render_token != token {
                log::info!("[Viewer] 第 {} 页渲染已被取代，跳过识别", number);
                return Ok(RenderOutcome::Superseded);
            }
            state.surface = surface;
            state.rendered_page = Some(number);
        }

        let on_progress = |p: RecognizeProgress| {
            log::debug!("[Viewer] 第 {} 页识别进度: {}", number, p);
            let mut state = self.state();
            if state.render_token == token {
                state.progress = Some(p);
            }
        };

        let recognition = self
            .ocr
            .recognize(&data_uri, &self.options.language, &on_progress)
            .await;

        let recognition = match recognition {
            Ok(recognition) => recognition,
            Err(source) => {
                return self.fail_render(token, ViewerError::Recognition { page: number, source })
            }
        };

        let mut state = self.state();
        if state.render_token != token {
            log::info!("[Viewer] 第 {} 页识别结果已过期，丢弃", number);
            return Ok(RenderOutcome::Superseded);
        }
        state.progress = None;
        state.extracted_text = format!("{}\n", recognition.text);
        log::info!(
            "[Viewer] 第 {} 页识别完成，{} 个单词，平均置信度 {:.2}",
            number,
            recognition.words.len(),
            recognition.mean_confidence()
        );
        Ok(RenderOutcome::Rendered)
    }

    /// 记录加载失败；已被取代的加载只返回 Superseded
    fn fail_load(&self, load_token: u64, err: ViewerError) -> Result<SubmitOutcome> {
        let mut state = self.state();
        if state.load_token != load_token {
            log::info!("[Viewer] 丢弃过期的加载错误: {}", err);
            return Ok(SubmitOutcome::Superseded);
        }
        log::warn!("[Viewer] {}", err);
        state.failure = err.to_failure();
        Err(err)
    }

    /// 记录渲染或识别失败；已被取代的渲染只返回 Superseded
    fn fail_render(&self, token: u64, err: ViewerError) -> Result<RenderOutcome> {
        let mut state = self.state();
        if state.render_token != token {
            log::info!("[Viewer] 丢弃过期的渲染错误: {}", err);
            return Ok(RenderOutcome::Superseded);
        }
        log::warn!("[Viewer] {}", err);
        state.progress = None;
        state.failure = err.to_failure();
        Err(err)
    }
}
