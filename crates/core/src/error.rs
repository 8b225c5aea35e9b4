//! 查看器错误类型

use scanview_ocr::OcrError;
use scanview_render::RenderError;
use serde::Serialize;
use thiserror::Error;

use crate::file::INVALID_FILE_MESSAGE;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("{}", INVALID_FILE_MESSAGE)]
    InvalidFile,

    #[error("无法加载 PDF: {0}")]
    DocumentParse(#[source] RenderError),

    #[error("PDF 不包含任何页面")]
    EmptyDocument,

    #[error("渲染第 {page} 页失败: {source}")]
    Rasterize {
        page: u32,
        #[source]
        source: RenderError,
    },

    #[error("第 {page} 页文字识别失败: {source}")]
    Recognition {
        page: u32,
        #[source]
        source: OcrError,
    },
}

pub type Result<T> = std::result::Result<T, ViewerError>;

/// 向用户展示的失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    DocumentParse,
    Rasterize,
    Recognition,
}

/// 当前显示的失败信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerFailure {
    pub kind: FailureKind,
    pub message: String,
    pub detail: String,
}

impl ViewerError {
    /// 协作方失败对应的类别，文件校验错误没有类别
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            ViewerError::InvalidFile => None,
            ViewerError::DocumentParse(_) | ViewerError::EmptyDocument => {
                Some(FailureKind::DocumentParse)
            }
            ViewerError::Rasterize { .. } => Some(FailureKind::Rasterize),
            ViewerError::Recognition { .. } => Some(FailureKind::Recognition),
        }
    }

    pub fn to_failure(&self) -> Option<ViewerFailure> {
        let kind = self.kind()?;
        let message = match self {
            ViewerError::Rasterize { page, .. } => format!("Could not render page {}.", page),
            ViewerError::Recognition { page, .. } => {
                format!("Text recognition failed for page {}.", page)
            }
            _ => "Could not open this PDF file.".to_string(),
        };
        Some(ViewerFailure {
            kind,
            message,
            detail: self.to_string(),
        })
    }
}
