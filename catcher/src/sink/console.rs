//! Terminal console sink.

use super::ConsoleSink;
use crate::error::SinkResult;
use console::Term;

/// Writes reports to standard output.
#[derive(Debug, Clone)]
pub struct TerminalConsole {
    term: Term,
}

impl TerminalConsole {
    pub fn stdout() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    pub fn stderr() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::stdout()
    }
}

impl ConsoleSink for TerminalConsole {
    fn write(&self, text: &str) -> SinkResult<()> {
        self.term.write_str(text)?;
        self.term.flush()?;
        Ok(())
    }
}

/// Insert `<br />` before every line break, keeping the break.
///
/// `\r\n` and `\n\r` count as a single break.
pub fn line_breaks_to_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' | '\n' => {
                out.push_str("<br />");
                out.push(c);
                let pair = if c == '\r' { '\n' } else { '\r' };
                if chars.peek() == Some(&pair) {
                    out.push(pair);
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}
