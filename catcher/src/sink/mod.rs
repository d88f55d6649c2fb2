//! Report sinks and the fan-out dispatcher.
//!
//! A report goes to every active sink:
//!
//! | Sink    | Active when                                   |
//! |---------|-----------------------------------------------|
//! | console | `output.console`                              |
//! | mail    | recipient, sender and subject all configured  |
//! | log     | `output.log_file` configured                  |
//!
//! Sinks are isolated from each other and from the fault path: a failing
//! sink is logged at `warn` and otherwise ignored.

pub mod console;
pub mod log;
pub mod mail;

pub use self::console::{TerminalConsole, line_breaks_to_markup};
pub use self::log::AppendLog;
pub use self::mail::SendmailTransport;

use crate::config::OutputConfig;
use crate::error::SinkResult;
use chrono::{DateTime, Local};
use std::path::Path;
use tracing::warn;

/// Timestamp layout of log lines, e.g. `17/Oct/2026 09:41:07`.
pub const LOG_TIMESTAMP_FORMAT: &str = "%d/%b/%Y %H:%M:%S";

/// Displays reports to a user.
pub trait ConsoleSink: Send + Sync {
    fn write(&self, text: &str) -> SinkResult<()>;

    /// Convert line breaks to their display markup form.
    fn render_line_breaks_as_markup(&self, text: &str) -> String {
        line_breaks_to_markup(text)
    }
}

/// Persists reports by appending to a file.
pub trait LogSink: Send + Sync {
    /// Append `text` as one newline-terminated write.
    fn append_line(&self, path: &Path, text: &str) -> SinkResult<()>;
}

/// Delivers reports by mail.
pub trait MailSink: Send + Sync {
    fn send(&self, to: &str, from: &str, subject: &str, body: &str) -> SinkResult<()>;
}

/// The set of sink implementations a catcher dispatches to.
pub struct Sinks {
    pub console: Box<dyn ConsoleSink>,
    pub log: Box<dyn LogSink>,
    pub mail: Box<dyn MailSink>,
}

impl Sinks {
    pub fn new(
        console: impl ConsoleSink + 'static,
        log: impl LogSink + 'static,
        mail: impl MailSink + 'static,
    ) -> Self {
        Self {
            console: Box::new(console),
            log: Box::new(log),
            mail: Box::new(mail),
        }
    }

    /// Default sinks, honouring a configured `sendmail` program.
    pub fn from_config(output: &OutputConfig) -> Self {
        let transport = output
            .mail
            .sendmail
            .as_ref()
            .map(SendmailTransport::new)
            .unwrap_or_default();
        Self::new(TerminalConsole::stdout(), AppendLog, transport)
    }
}

impl Default for Sinks {
    fn default() -> Self {
        Self::new(TerminalConsole::stdout(), AppendLog, SendmailTransport::default())
    }
}

/// Fan `report` out to every active sink. Never fails.
pub fn dispatch(report: &str, output: &OutputConfig, sinks: &Sinks) {
    dispatch_at(report, output, sinks, Local::now());
}

/// [`dispatch`] with an explicit log timestamp.
pub fn dispatch_at(report: &str, output: &OutputConfig, sinks: &Sinks, now: DateTime<Local>) {
    if output.console {
        let result = if output.markup {
            sinks.console.write(&sinks.console.render_line_breaks_as_markup(report))
        } else {
            sinks.console.write(report)
        };
        if let Err(e) = result {
            warn!("console sink failed: {e}");
        }
    }

    if let Some((to, from, subject)) = output.mail.active() {
        if let Err(e) = sinks.mail.send(to, from, subject, report) {
            warn!(to, "mail sink failed: {e}");
        }
    }

    if let Some(path) = output.log_file.as_deref() {
        if let Err(e) = sinks.log.append_line(path, &log_line(report, now)) {
            warn!(path = %path.display(), "log sink failed: {e}");
        }
    }
}

/// `[<timestamp>] <report>`; a multi-line report stays in one line entry.
pub fn log_line(report: &str, now: DateTime<Local>) -> String {
    format!("[{}] {report}", now.format(LOG_TIMESTAMP_FORMAT))
}
