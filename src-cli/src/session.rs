//! 交互式查看会话
//!
//! 从标准输入读取命令。提交和翻页在后台任务中执行，执行期间
//! 仍可继续输入命令；任务完成后重新绘制界面。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scanview_core::{PdfPageViewer, SelectedFile};
use scanview_ocr::TesseractEngine;
use scanview_render::PdfiumRenderer;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::terminal;

pub type Viewer = PdfPageViewer<PdfiumRenderer, TesseractEngine>;

pub const HELP: &str = "\
Commands:
  open <path>   select a file
  submit        load the selected file and recognize the current page
  next, n       next page
  prev, p       previous page
  page <n>      jump to page n
  save <path>   save the rendered page as PNG
  help          show this help
  quit, q       exit
  (empty line)  refresh the view";

/// 会话命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(PathBuf),
    Submit,
    Next,
    Previous,
    Page(u32),
    Save(PathBuf),
    Help,
    Refresh,
    Quit,
}

/// 解析一行输入
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "" => Command::Refresh,
        "open" | "o" if !arg.is_empty() => Command::Open(PathBuf::from(arg)),
        "open" | "o" => return Err("usage: open <path>".to_string()),
        "submit" | "s" => Command::Submit,
        "next" | "n" => Command::Next,
        "prev" | "previous" | "p" => Command::Previous,
        "page" | "g" => match arg.parse::<u32>() {
            Ok(number) => Command::Page(number),
            Err(_) => return Err("usage: page <number>".to_string()),
        },
        "save" if !arg.is_empty() => Command::Save(PathBuf::from(arg)),
        "save" => return Err("usage: save <path>".to_string()),
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {} (type help)", other)),
    };
    Ok(command)
}

/// 选择磁盘上的文件
pub fn open_file(viewer: &Viewer, path: &Path) {
    match SelectedFile::from_path(path) {
        Ok(file) => {
            // 校验失败的提示在界面中显示
            let _ = viewer.select_file(Some(file));
        }
        Err(e) => {
            log::warn!("[Session] 无法读取 {}: {}", path.display(), e);
            println!("Cannot read {}: {}", path.display(), e);
        }
    }
}

fn redraw(viewer: &Viewer) {
    print!("{}", terminal::draw(&viewer.view()));
}

/// 在后台执行耗时操作
fn spawn_action(viewer: &Arc<Viewer>, command: Command, done: &mpsc::UnboundedSender<()>) {
    let viewer = Arc::clone(viewer);
    let done = done.clone();

    tokio::spawn(async move {
        let result = match command {
            Command::Submit => viewer.submit().await.map(|outcome| format!("{:?}", outcome)),
            Command::Next => viewer.next_page().await.map(|outcome| format!("{:?}", outcome)),
            Command::Previous => viewer
                .previous_page()
                .await
                .map(|outcome| format!("{:?}", outcome)),
            Command::Page(number) => viewer
                .go_to_page(number)
                .await
                .map(|outcome| format!("{:?}", outcome)),
            _ => return,
        };
        match result {
            Ok(outcome) => log::debug!("[Session] 操作完成: {}", outcome),
            // 失败信息已写入界面状态
            Err(e) => log::debug!("[Session] 操作失败: {}", e),
        }
        let _ = done.send(());
    });
}

/// 运行交互会话，直到输入 quit 或标准输入结束
pub async fn run(viewer: Arc<Viewer>, initial: Option<PathBuf>) -> anyhow::Result<()> {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();

    if let Some(path) = initial {
        open_file(&viewer, &path);
    }
    redraw(&viewer);
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => println!("{}", HELP),
                    Ok(Command::Refresh) => redraw(&viewer),
                    Ok(Command::Open(path)) => {
                        open_file(&viewer, &path);
                        redraw(&viewer);
                    }
                    Ok(Command::Save(path)) => save_canvas(&viewer, &path),
                    Ok(command) => {
                        spawn_action(&viewer, command, &done_tx);
                        redraw(&viewer);
                    }
                    Err(message) => println!("{}", message),
                }
            }
            Some(()) = done_rx.recv() => redraw(&viewer),
        }
    }

    Ok(())
}

fn save_canvas(viewer: &Viewer, path: &Path) {
    if viewer.view().canvas.is_none() {
        println!("Nothing rendered yet.");
        return;
    }
    match viewer.with_surface(|surface| surface.save_png(path)) {
        Ok(()) => println!("Saved {}", path.display()),
        Err(e) => println!("Could not save {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("submit"), Ok(Command::Submit));
        assert_eq!(parse_command("  N "), Ok(Command::Next));
        assert_eq!(parse_command("prev"), Ok(Command::Previous));
        assert_eq!(parse_command("page 4"), Ok(Command::Page(4)));
        assert_eq!(parse_command(""), Ok(Command::Refresh));
        assert_eq!(parse_command("q"), Ok(Command::Quit));
        assert_eq!(
            parse_command("open ~/My Scans/report.pdf"),
            Ok(Command::Open(PathBuf::from("~/My Scans/report.pdf")))
        );
        assert_eq!(
            parse_command("save page.png"),
            Ok(Command::Save(PathBuf::from("page.png")))
        );
    }

    #[test]
    fn test_parse_command_errors() {
        assert!(parse_command("open").is_err());
        assert!(parse_command("page two").is_err());
        assert!(parse_command("save").is_err());
        assert!(parse_command("zoom 2").unwrap_err().contains("unknown command"));
    }
}
