//! 由控制器状态推导出的展示模型
//!
//! 页码、按钮文字、提示信息全部从状态计算，不在别处单独维护。

use serde::Serialize;

pub const SUBMIT_LABEL: &str = "Submit";
pub const PROCESSING_LABEL: &str = "Processing...";
pub const LOADING_MESSAGE: &str = "Loading PDF, please wait...";

/// 翻页控件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationView {
    /// 当前页码，从 1 开始
    pub current: u32,
    /// 总页数
    pub total: u32,
    pub can_previous: bool,
    pub can_next: bool,
}

impl NavigationView {
    pub fn new(current: u32, total: u32) -> Self {
        Self {
            current,
            total,
            can_previous: current > 1,
            can_next: current < total,
        }
    }

    /// 页码指示，如 "2 / 3"
    pub fn indicator(&self) -> String {
        format!("{} / {}", self.current, self.total)
    }
}

/// 画布区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasView {
    pub page: u32,
    pub width: u32,
    pub height: u32,
}

/// 界面展示模型
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    /// 已选文件名
    pub file_name: Option<String>,
    /// 文件校验错误
    pub validation_error: Option<String>,
    /// 加载、渲染或识别失败
    pub failure: Option<String>,
    pub submit_label: &'static str,
    pub loading_message: Option<&'static str>,
    /// 只有加载了文档后才显示
    pub navigation: Option<NavigationView>,
    pub canvas: Option<CanvasView>,
    /// 识别进度
    pub progress: Option<String>,
    /// 只有非空时才显示
    pub extracted_text: Option<String>,
}

impl ViewModel {
    pub fn is_loading(&self) -> bool {
        self.loading_message.is_some()
    }
}
