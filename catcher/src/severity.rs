//! Severity classification for raised diagnostics.
//!
//! Raw diagnostic codes are the classic integer levels (see [`code`]).
//! [`classify`] is total: any code outside the recognised set maps to
//! [`Severity::UnknownSeverity`].

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Raw diagnostic codes understood by [`classify`].
pub mod code {
    /// Engine-level fatal error. Never delivered to an in-process receiver
    /// by a conventional runtime, so it classifies as unknown.
    pub const ERROR: i32 = 0x0001;
    /// Engine-level warning.
    pub const WARNING: i32 = 0x0002;
    /// Engine-level notice.
    pub const NOTICE: i32 = 0x0008;
    /// User-raised fatal error.
    pub const USER_ERROR: i32 = 0x0100;
    /// User-raised warning.
    pub const USER_WARNING: i32 = 0x0200;
    /// User-raised notice.
    pub const USER_NOTICE: i32 = 0x0400;
    /// Strict / pedantic advisory.
    pub const STRICT: i32 = 0x0800;
    /// Error the program may continue from.
    pub const RECOVERABLE_ERROR: i32 = 0x1000;
}

/// Severity label assigned to an error-class fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// Fatal-class diagnostic.
    Error,
    /// Fatal-class diagnostic the program may opt to continue from.
    RecoverableError,
    Warning,
    Notice,
    StrictNotice,
    /// Any code outside the recognised set.
    UnknownSeverity,
}

impl Severity {
    /// Label used in rendered reports.
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::RecoverableError => "Recoverable Error",
            Severity::Warning => "Warning",
            Severity::Notice => "Notice",
            Severity::StrictNotice => "Strict Notice",
            Severity::UnknownSeverity => "Unknown Error",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a raw diagnostic code to its severity.
#[inline]
pub const fn classify(raw_code: i32) -> Severity {
    match raw_code {
        code::USER_ERROR => Severity::Error,
        code::RECOVERABLE_ERROR => Severity::RecoverableError,
        code::WARNING | code::USER_WARNING => Severity::Warning,
        code::NOTICE | code::USER_NOTICE => Severity::Notice,
        code::STRICT => Severity::StrictNotice,
        _ => Severity::UnknownSeverity,
    }
}
