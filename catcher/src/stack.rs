//! Call-stack frames and parsing of captured backtraces.

use std::backtrace::Backtrace;

/// One frame of a captured call stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Path the function lives under (module, type or trait impl).
    pub owner: Option<String>,
    pub function: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl Frame {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            ..Self::default()
        }
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Build a frame from a demangled symbol path such as
    /// `app::server::Handler::run::h0123456789abcdef`.
    pub fn from_symbol(symbol: &str) -> Self {
        let symbol = strip_generic_args(strip_hash(symbol.trim()));
        match split_owner(symbol) {
            Some((owner, function)) => Self::new(function).owned_by(owner),
            None => Self::new(symbol),
        }
    }

    /// True when the frame's full symbol path starts with `prefix`.
    pub fn path_starts_with(&self, prefix: &str) -> bool {
        match &self.owner {
            Some(owner) => format!("{owner}::{}", self.function).starts_with(prefix),
            None => self.function.starts_with(prefix),
        }
    }
}

/// Capture the current thread's stack, innermost frame first.
#[inline(never)]
pub fn capture() -> Vec<Frame> {
    parse_backtrace(&Backtrace::force_capture().to_string())
}

/// Parse the `Display` rendering of a [`Backtrace`].
///
/// Each numbered line starts a frame, and so does an indented symbol line
/// without an index (an inlined caller sharing the previous address). An
/// `at file:line:col` line that follows attaches a location to it.
pub fn parse_backtrace(rendered: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    for raw in rendered.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                if frame.file.is_none() {
                    if let Some((file, lineno)) = parse_location(location) {
                        frame.file = Some(file);
                        frame.line = Some(lineno);
                    }
                }
            }
            continue;
        }
        match line.split_once(": ") {
            Some((index, symbol)) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => {
                frames.push(Frame::from_symbol(symbol));
            }
            _ if !frames.is_empty() && raw.starts_with(char::is_whitespace) => {
                frames.push(Frame::from_symbol(line));
            }
            _ => {}
        }
    }
    frames
}

fn parse_location(location: &str) -> Option<(String, u32)> {
    // file:line:col, the file itself may contain ':'
    let mut parts = location.rsplitn(3, ':');
    let _column = parts.next()?;
    let line = parts.next()?.parse().ok()?;
    let file = parts.next()?;
    Some((file.to_string(), line))
}

fn strip_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((head, hash)) if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) => {
            head
        }
        _ => symbol,
    }
}

// `->` inside `fn(A) -> B` is not a closing bracket.
fn closes_bracket(bytes: &[u8], i: usize) -> bool {
    bytes[i] == b'>' && (i == 0 || bytes[i - 1] != b'-')
}

/// Drop a trailing `::<...>` generic argument list: `m::f::<T, U>` -> `m::f`.
fn strip_generic_args(symbol: &str) -> &str {
    let bytes = symbol.as_bytes();
    let mut depth = 0usize;
    let mut open = None;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'<' {
            if depth == 0 {
                open = Some(i);
            }
            depth += 1;
        } else if closes_bracket(bytes, i) {
            depth = depth.saturating_sub(1);
        }
    }
    match open {
        Some(at) if depth == 0 && at >= 2 && symbol.ends_with('>') => {
            symbol[..at].strip_suffix("::").unwrap_or(symbol)
        }
        _ => symbol,
    }
}

/// Split `a::b::<T as c::D>::f` at the last `::` outside angle brackets.
fn split_owner(symbol: &str) -> Option<(&str, &str)> {
    let bytes = symbol.as_bytes();
    let mut depth = 0usize;
    let mut split = None;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' if closes_bracket(bytes, i) => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                split = Some(i);
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    let at = split?;
    let (owner, function) = (&symbol[..at], &symbol[at + 2..]);
    if owner.is_empty() || function.is_empty() {
        None
    } else {
        Some((owner, function))
    }
}
