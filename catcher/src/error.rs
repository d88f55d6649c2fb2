//! Error types for sink operations.
//!
//! Sink errors never leave the dispatcher; they exist so each sink can
//! report what went wrong before the failure is logged and dropped.

use thiserror::Error;

/// Errors raised by a sink while delivering a report.
#[derive(Error, Debug)]
pub enum SinkError {
    /// IO error writing to the console or the log file
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },

    /// Mail transport program could not be started
    #[error("Failed to start mail transport {program}: {source}")]
    MailSpawn {
        /// Transport program path
        program: String,
        /// Source IO error
        source: std::io::Error,
    },

    /// Mail transport ran but refused the message
    #[error("Mail transport rejected message (exit status {status:?})")]
    MailRejected {
        /// Exit status, `None` if killed by a signal
        status: Option<i32>,
    },
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;
