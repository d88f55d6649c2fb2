//! Fault events delivered by the runtime and the records kept of them.

use crate::severity::{Severity, classify};
use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::panic::{Location, PanicHookInfo};
use std::sync::Arc;

/// Caller-supplied payload attached to a raised diagnostic.
///
/// Kept only so it can be handed back through [`FaultRecord::context`];
/// the catcher never looks inside it.
pub type Context = Arc<dyn Any + Send + Sync>;

/// An unhandled exception as seen by the exception receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    pub message: String,
    pub file: String,
    pub line: u32,
}

impl Exception {
    pub fn new(message: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            file: file.into(),
            line,
        }
    }

    /// Build an exception from a panic in flight.
    ///
    /// String payloads (`&str`, `String`) become the message; anything
    /// else is reported as `Box<dyn Any>`.
    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };
        let (file, line) = info
            .location()
            .map(|loc| (loc.file().to_string(), loc.line()))
            .unwrap_or_default();
        Self {
            message,
            file,
            line,
        }
    }
}

/// A raised runtime diagnostic as seen by the error receiver.
#[derive(Clone)]
pub struct Diagnostic {
    pub code: i32,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub context: Option<Context>,
}

impl Diagnostic {
    pub fn new(code: i32, message: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            code,
            message: message.into(),
            file: file.into(),
            line,
            context: None,
        }
    }

    /// Diagnostic located at `location`, usually `Location::caller()`.
    pub fn at(code: i32, message: impl Into<String>, location: &Location<'_>) -> Self {
        Self::new(code, message, location.file(), location.line())
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }
}

impl Debug for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostic")
            .field("code", &self.code)
            .field("message", &self.message)
            .field("file", &self.file)
            .field("line", &self.line)
            .field("context", &self.context.as_ref().map(|_| ".."))
            .finish()
    }
}

/// What kind of fault a [`FaultRecord`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    Exception,
    Error(Severity),
}

impl FaultKind {
    /// Label used in rendered reports.
    pub const fn label(self) -> &'static str {
        match self {
            FaultKind::Exception => "Exception",
            FaultKind::Error(severity) => severity.label(),
        }
    }
}

/// The most recent fault of a given kind, as stored by the catcher.
#[derive(Clone)]
pub struct FaultRecord {
    pub kind: FaultKind,
    pub message: String,
    pub file: String,
    pub line: u32,
    /// Raw diagnostic code. `None` for exceptions.
    pub code: Option<i32>,
    /// Opaque diagnostic context. `None` for exceptions.
    pub context: Option<Context>,
}

impl FaultRecord {
    pub fn severity(&self) -> Option<Severity> {
        match self.kind {
            FaultKind::Exception => None,
            FaultKind::Error(severity) => Some(severity),
        }
    }

    /// Downcast the stored context to a concrete type.
    pub fn context_as<T: Any>(&self) -> Option<&T> {
        self.context.as_deref().and_then(|ctx| ctx.downcast_ref::<T>())
    }
}

impl From<&Exception> for FaultRecord {
    fn from(exc: &Exception) -> Self {
        Self {
            kind: FaultKind::Exception,
            message: exc.message.clone(),
            file: exc.file.clone(),
            line: exc.line,
            code: None,
            context: None,
        }
    }
}

impl From<Diagnostic> for FaultRecord {
    fn from(diag: Diagnostic) -> Self {
        Self {
            kind: FaultKind::Error(classify(diag.code)),
            message: diag.message,
            file: diag.file,
            line: diag.line,
            code: Some(diag.code),
            context: diag.context,
        }
    }
}

impl Debug for FaultRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultRecord")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("file", &self.file)
            .field("line", &self.line)
            .field("code", &self.code)
            .field("context", &self.context.as_ref().map(|_| ".."))
            .finish()
    }
}
