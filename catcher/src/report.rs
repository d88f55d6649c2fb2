//! Human-readable fault reports.
//!
//! ```text
//! Catcher (Warning): disk almost full (File: src/disk.rs - Line: 88)
//! Backtrace:
//! app->main() (File: src/main.rs - Line: 12)
//! app::disk->check() (File: src/disk.rs - Line: 88)
//!
//! ```
//!
//! Reports are plain text. Display markup is applied by the console sink
//! only, never here.

use crate::severity::Severity;
use crate::stack::Frame;
use std::fmt::Write;

/// Label used for exception reports.
pub const EXCEPTION_LABEL: &str = "Exception";

fn header(out: &mut String, label: &str, message: &str, file: &str, line: u32) {
    let _ = writeln!(out, "Catcher ({label}): {message} (File: {file} - Line: {line})");
}

/// Render an exception report.
pub fn format_exception(message: &str, file: &str, line: u32) -> String {
    let mut out = String::new();
    header(&mut out, EXCEPTION_LABEL, message, file, line);
    out
}

/// Render an error report, with a backtrace block when `frames` is given.
///
/// `frames` is innermost first, as returned by
/// [`Runtime::capture_call_stack`](crate::runtime::Runtime::capture_call_stack).
/// Frame 0 is the fault callback and is never rendered, so a stack of one
/// frame or fewer produces no block at all.
pub fn format_error(
    severity: Severity,
    message: &str,
    file: &str,
    line: u32,
    frames: Option<&[Frame]>,
) -> String {
    let mut out = String::new();
    header(&mut out, severity.label(), message, file, line);
    if let Some(frames) = frames.filter(|frames| frames.len() > 1) {
        out.push_str("Backtrace:\n");
        for frame in frames[1..].iter().rev() {
            render_frame(&mut out, frame);
        }
        out.push('\n');
    }
    out
}

fn render_frame(out: &mut String, frame: &Frame) {
    if let Some(owner) = frame.owner.as_deref().filter(|owner| !owner.is_empty()) {
        out.push_str(owner);
        out.push_str("->");
    }
    out.push_str(&frame.function);
    out.push_str("()");
    if let (Some(file), Some(line)) = (frame.file.as_deref(), frame.line) {
        if !file.is_empty() && line != 0 {
            let _ = write!(out, " (File: {file} - Line: {line})");
        }
    }
    out.push('\n');
}
