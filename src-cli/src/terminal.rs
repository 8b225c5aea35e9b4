//! 把 ViewModel 绘制成终端文本

use scanview_core::ViewModel;

const TITLE: &str = "Upload PDF File";
const RULE_WIDTH: usize = 48;

/// 绘制整个界面
pub fn draw(view: &ViewModel) -> String {
    let mut out = String::new();

    out.push_str(&format!("── {} {}\n", TITLE, "─".repeat(RULE_WIDTH - TITLE.len() - 4)));
    match &view.file_name {
        Some(name) => out.push_str(&format!("File: {}\n", name)),
        None => out.push_str("File: (none)\n"),
    }
    if let Some(error) = &view.validation_error {
        out.push_str(&format!("! {}\n", error));
    }

    out.push_str(&format!("[ {} ]\n", view.submit_label));
    if let Some(message) = view.loading_message {
        out.push_str(message);
        out.push('\n');
    }
    if let Some(failure) = &view.failure {
        out.push_str(&format!("Error: {}\n", failure));
    }

    if let Some(nav) = &view.navigation {
        let previous = if nav.can_previous { "< Previous" } else { "  Previous" };
        let next = if nav.can_next { "Next >" } else { "Next  " };
        out.push_str(&format!("{}   Page: {}   {}\n", previous, nav.indicator(), next));
    }

    if let Some(canvas) = &view.canvas {
        out.push_str(&format!(
            "Canvas: page {}, {}x{} px\n",
            canvas.page, canvas.width, canvas.height
        ));
    }
    if let Some(progress) = &view.progress {
        out.push_str(&format!("OCR: {}\n", progress));
    }

    if let Some(text) = &view.extracted_text {
        out.push_str("\nExtracted Text:\n");
        out.push_str(text);
        if !text.ends_with('\n') {
            out.push('\n');
        }
    }

    out.push_str(&"─".repeat(RULE_WIDTH));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanview_core::{CanvasView, NavigationView, LOADING_MESSAGE, PROCESSING_LABEL, SUBMIT_LABEL};

    fn empty_view() -> ViewModel {
        ViewModel {
            file_name: None,
            validation_error: None,
            failure: None,
            submit_label: SUBMIT_LABEL,
            loading_message: None,
            navigation: None,
            canvas: None,
            progress: None,
            extracted_text: None,
        }
    }

    #[test]
    fn test_draw_initial_view() {
        let out = draw(&empty_view());
        assert!(out.contains("File: (none)"));
        assert!(out.contains("[ Submit ]"));
        assert!(!out.contains("Page:"));
        assert!(!out.contains("Extracted Text:"));
    }

    #[test]
    fn test_draw_validation_error() {
        let view = ViewModel {
            validation_error: Some("Please upload a valid PDF file.".to_string()),
            ..empty_view()
        };
        assert!(draw(&view).contains("! Please upload a valid PDF file."));
    }

    #[test]
    fn test_draw_loaded_page() {
        let view = ViewModel {
            file_name: Some("scan.pdf".to_string()),
            navigation: Some(NavigationView::new(1, 3)),
            canvas: Some(CanvasView { page: 1, width: 918, height: 1188 }),
            extracted_text: Some("Hello  World\n\n  indented\n\n".to_string()),
            ..empty_view()
        };
        let out = draw(&view);
        assert!(out.contains("  Previous   Page: 1 / 3   Next >"));
        assert!(out.contains("Canvas: page 1, 918x1188 px"));
        // 文本原样输出
        assert!(out.contains("Extracted Text:\nHello  World\n\n  indented\n\n"));
    }

    #[test]
    fn test_draw_processing() {
        let view = ViewModel {
            submit_label: PROCESSING_LABEL,
            loading_message: Some(LOADING_MESSAGE),
            progress: Some("recognizing text 0%".to_string()),
            ..empty_view()
        };
        let out = draw(&view);
        assert!(out.contains("[ Processing... ]"));
        assert!(out.contains("Loading PDF, please wait..."));
        assert!(out.contains("OCR: recognizing text 0%"));
    }
}
