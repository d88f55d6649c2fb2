//! # Catcher
//!
//! A process-wide fault interceptor. A [`Catcher`] installs itself as the
//! single receiver of unhandled exceptions (panics) and raised runtime
//! diagnostics, classifies each fault, renders a human-readable report,
//! fans it out to the configured sinks and finally decides whether the
//! process may continue.
//!
//! ## Module Structure
//!
//! - [`severity`] - raw diagnostic codes and their classification
//! - [`report`] - report rendering, including backtrace blocks
//! - [`sink`] - console, log and mail sinks and the dispatcher
//! - [`runtime`] - the host runtime abstraction and the process runtime
//! - [`catcher`](mod@catcher) - the interceptor itself
//! - [`config`] - configuration types and TOML loading
//!
//! ## Flow
//!
//! ```text
//! panic / raise()
//!      │
//!      ▼
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌────────────┐
//! │ receiver ├──►│ classify ├──►│  format  ├──►│  dispatch  │──► console / mail / log
//! └──────────┘   └──────────┘   └──────────┘   └─────┬──────┘
//!                                                    ▼
//!                                             halt policy ──► _exit
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use catcher::{Catcher, code};
//!
//! let catcher = Catcher::new();
//! catcher.set_output(true, false);
//! catcher.set_backtrace(true);
//!
//! catcher::raise!(code::USER_NOTICE, "config reloaded from {}", "/etc/app.toml");
//! ```
//!
//! Raising [`code::USER_ERROR`] with the default policy prints the report
//! and terminates the process.

pub mod catcher;
pub mod config;
pub mod error;
pub mod fault;
pub mod report;
pub mod runtime;
pub mod severity;
pub mod sink;
pub mod stack;

pub use crate::catcher::{Catcher, Disposition};
pub use crate::config::{CatcherConfig, ConfigError, ConfigLoader, HaltPolicy, MailConfig, OutputConfig};
pub use crate::error::{SinkError, SinkResult};
pub use crate::fault::{Context, Diagnostic, Exception, FaultKind, FaultRecord};
pub use crate::runtime::{
    ErrorReceiver, ExceptionReceiver, PreviousPanicHook, ProcessRuntime, Runtime, raise,
    raise_with_context,
};
pub use crate::severity::{Severity, classify, code};
pub use crate::stack::Frame;
