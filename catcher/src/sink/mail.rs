//! Mail notification sink backed by a local `sendmail` program.

use super::MailSink;
use crate::error::{SinkError, SinkResult};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Default location of the local mail submission program.
pub const DEFAULT_SENDMAIL: &str = "/usr/sbin/sendmail";

/// Hands each message to `sendmail -t -i` on standard input.
///
/// Recipients are taken from the headers (`-t`); a lone `.` line does not
/// end the message (`-i`). Delivery time is bounded only by the program.
#[derive(Debug, Clone)]
pub struct SendmailTransport {
    program: PathBuf,
}

impl SendmailTransport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SendmailTransport {
    fn default() -> Self {
        Self::new(DEFAULT_SENDMAIL)
    }
}

impl MailSink for SendmailTransport {
    fn send(&self, to: &str, from: &str, subject: &str, body: &str) -> SinkResult<()> {
        let program = self.program.display().to_string();
        let mut child = Command::new(&self.program)
            .args(["-t", "-i"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SinkError::MailSpawn {
                program: program.clone(),
                source,
            })?;

        // Reap the child even when it stopped reading early.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(compose_message(to, from, subject, body).as_bytes()),
            None => Ok(()),
        };

        let status = child.wait()?;
        written?;
        if status.success() {
            Ok(())
        } else {
            Err(SinkError::MailRejected {
                status: status.code(),
            })
        }
    }
}

/// Build the message text: headers, blank line, body.
pub fn compose_message(to: &str, from: &str, subject: &str, body: &str) -> String {
    format!(
        "To: {}\nFrom: {}\nSubject: {}\n\n{body}",
        single_line(to),
        single_line(from),
        single_line(subject)
    )
}

// Header values must not carry their own line breaks.
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
