//! PDF 页面查看器
//!
//! 选择 PDF 文件后逐页渲染到画布，并对渲染结果做文字识别。
//! 渲染和识别分别委托给 `scanview-render` 与 `scanview-ocr`，
//! 这里只负责界面状态和调用顺序。

mod error;
mod file;
mod view;
mod viewer;

pub use error::{FailureKind, Result, ViewerError, ViewerFailure};
pub use file::{media_type_for_path, SelectedFile, INVALID_FILE_MESSAGE, PDF_MEDIA_TYPE};
pub use view::{
    CanvasView, NavigationView, ViewModel, LOADING_MESSAGE, PROCESSING_LABEL, SUBMIT_LABEL,
};
pub use viewer::{NavigationOutcome, PdfPageViewer, SubmitOutcome, ViewerOptions};
