//! The fault interceptor.
//!
//! A [`Catcher`] takes over the runtime's exception and/or error hooks for
//! as long as it lives. Every fault it receives is recorded, rendered and
//! dispatched to the configured sinks; diagnostics are then checked
//! against the [`HaltPolicy`] and may terminate the process.
//!
//! ```text
//! Uninstalled ──install──► Installed ──teardown / drop──► Uninstalled
//! ```
//!
//! Only one catcher per hook should be installed at a time. A second
//! catcher silently takes over the hook; tear them down in reverse order.

use crate::config::{CatcherConfig, HaltPolicy, MailConfig, OutputConfig};
use crate::fault::{Diagnostic, Exception, FaultRecord};
use crate::report::{format_error, format_exception};
use crate::runtime::{ErrorReceiver, ExceptionReceiver, ProcessRuntime, Runtime};
use crate::severity::{Severity, classify};
use crate::sink::{Sinks, dispatch};
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// What happens to the process after a diagnostic has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Control returns to the code that raised the diagnostic.
    Resume,
    /// The process must terminate with this exit code.
    Halt { exit_code: i32 },
}

impl HaltPolicy {
    /// Decide the disposition of a diagnostic of the given severity.
    ///
    /// Recoverable errors halt only under `halt_on_fatal`; continuation
    /// has no effect without it.
    pub fn disposition(&self, severity: Severity) -> Disposition {
        let halt = match severity {
            Severity::Error => self.halt_on_fatal,
            Severity::RecoverableError => {
                self.halt_on_fatal && !self.allow_recoverable_continuation
            }
            Severity::UnknownSeverity => self.halt_on_unknown_severity,
            Severity::Warning | Severity::Notice | Severity::StrictNotice => false,
        };
        if halt {
            Disposition::Halt {
                exit_code: self.exit_code,
            }
        } else {
            Disposition::Resume
        }
    }
}

/// State shared between the catcher handle and the runtime hooks.
struct Shared<R: Runtime> {
    runtime: Arc<R>,
    policy: RwLock<HaltPolicy>,
    output: RwLock<OutputConfig>,
    sinks: RwLock<Arc<Sinks>>,
    last_exception: Mutex<Option<FaultRecord>>,
    last_error: Mutex<Option<FaultRecord>>,
}

impl<R: Runtime> Shared<R> {
    fn handle_exception(&self, exception: &Exception) {
        debug!(file = %exception.file, line = exception.line, "exception intercepted");
        *self.last_exception.lock() = Some(FaultRecord::from(exception));

        let report = format_exception(&exception.message, &exception.file, exception.line);
        self.dispatch(&report);
    }

    fn handle_error(&self, diagnostic: Diagnostic) -> Disposition {
        let severity = classify(diagnostic.code);
        debug!(
            code = diagnostic.code,
            %severity,
            file = %diagnostic.file,
            line = diagnostic.line,
            "diagnostic intercepted"
        );

        let frames = if self.output.read().backtrace {
            Some(self.runtime.capture_call_stack())
        } else {
            None
        };
        let report = format_error(
            severity,
            &diagnostic.message,
            &diagnostic.file,
            diagnostic.line,
            frames.as_deref(),
        );
        *self.last_error.lock() = Some(FaultRecord::from(diagnostic));

        self.dispatch(&report);
        self.policy.read().disposition(severity)
    }

    fn dispatch(&self, report: &str) {
        let output = self.output.read().clone();
        let sinks = self.sinks.read().clone();
        dispatch(report, &output, &sinks);
    }
}

impl<R: Runtime> ExceptionReceiver for Shared<R> {
    fn on_exception(&self, exception: &Exception) {
        self.handle_exception(exception);
    }
}

impl<R: Runtime> ErrorReceiver for Shared<R> {
    fn on_error(&self, diagnostic: Diagnostic) {
        if let Disposition::Halt { exit_code } = self.handle_error(diagnostic) {
            debug!(exit_code, "halting");
            self.runtime.halt(exit_code);
        }
    }
}

/// Receivers that were in place before this catcher installed itself.
struct Registration<R: Runtime> {
    exceptions: Option<R::PreviousExceptionReceiver>,
    errors: Option<R::PreviousErrorReceiver>,
}

/// Process-wide fault interceptor.
///
/// # Example
///
/// ```rust,no_run
/// use catcher::{Catcher, CatcherConfig, code};
///
/// let catcher = Catcher::install(CatcherConfig::default());
/// catcher.set_output(true, false);
/// catcher.set_log_file("/var/log/app/faults.log");
///
/// catcher::raise(code::USER_WARNING, "cache miss storm");
/// assert!(catcher.last_error().is_some());
/// ```
pub struct Catcher<R: Runtime = ProcessRuntime> {
    shared: Arc<Shared<R>>,
    registration: Option<Registration<R>>,
}

impl Catcher<ProcessRuntime> {
    /// Install on the running process with default configuration.
    pub fn new() -> Self {
        Self::install(CatcherConfig::default())
    }

    /// Install on the running process.
    pub fn install(config: CatcherConfig) -> Self {
        Self::install_on(Arc::new(ProcessRuntime), config)
    }
}

impl Default for Catcher<ProcessRuntime> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Runtime> Catcher<R> {
    /// Install on `runtime`, registering only the hooks `config` asks for.
    pub fn install_on(runtime: Arc<R>, config: CatcherConfig) -> Self {
        let sinks = Sinks::from_config(&config.output);
        let shared = Arc::new(Shared {
            runtime,
            policy: RwLock::new(config.policy),
            output: RwLock::new(config.output),
            sinks: RwLock::new(Arc::new(sinks)),
            last_exception: Mutex::new(None),
            last_error: Mutex::new(None),
        });

        let exceptions = config.intercept_exceptions.then(|| {
            shared
                .runtime
                .register_exception_receiver(shared.clone() as Arc<dyn ExceptionReceiver>)
        });
        let errors = config.intercept_errors.then(|| {
            shared
                .runtime
                .register_error_receiver(shared.clone() as Arc<dyn ErrorReceiver>)
        });
        debug!(
            exceptions = exceptions.is_some(),
            errors = errors.is_some(),
            "catcher installed"
        );

        Self {
            shared,
            registration: Some(Registration { exceptions, errors }),
        }
    }

    /// Replace the sink implementations.
    pub fn with_sinks(self, sinks: Sinks) -> Self {
        *self.shared.sinks.write() = Arc::new(sinks);
        self
    }

    /// Append a backtrace block to error reports.
    pub fn set_backtrace(&self, enabled: bool) {
        self.shared.output.write().backtrace = enabled;
    }

    /// Enable the console sink; `render_as_markup` converts line breaks.
    pub fn set_output(&self, enabled: bool, render_as_markup: bool) {
        let mut output = self.shared.output.write();
        output.console = enabled;
        output.markup = render_as_markup;
    }

    pub fn set_mail(&self, to: impl Into<String>, from: impl Into<String>, subject: impl Into<String>) {
        let mut output = self.shared.output.write();
        output.mail = MailConfig {
            to: Some(to.into()),
            from: Some(from.into()),
            subject: Some(subject.into()),
            sendmail: output.mail.sendmail.take(),
        };
    }

    pub fn clear_mail(&self) {
        let mut output = self.shared.output.write();
        output.mail.to = None;
        output.mail.from = None;
        output.mail.subject = None;
    }

    pub fn set_log_file(&self, path: impl Into<PathBuf>) {
        self.shared.output.write().log_file = Some(path.into());
    }

    pub fn clear_log_file(&self) {
        self.shared.output.write().log_file = None;
    }

    pub fn set_halt_policy(&self, policy: HaltPolicy) {
        *self.shared.policy.write() = policy;
    }

    pub fn halt_policy(&self) -> HaltPolicy {
        *self.shared.policy.read()
    }

    pub fn output(&self) -> OutputConfig {
        self.shared.output.read().clone()
    }

    /// Record, report and dispatch an exception. Never halts.
    pub fn on_exception(&self, exception: &Exception) {
        self.shared.handle_exception(exception);
    }

    /// Record, report and dispatch a diagnostic, then halt if the policy
    /// says so.
    #[inline(never)]
    pub fn on_error(&self, diagnostic: Diagnostic) {
        ErrorReceiver::on_error(&*self.shared, diagnostic);
    }

    /// Like [`on_error`](Self::on_error), but return the disposition
    /// instead of acting on it.
    #[inline(never)]
    pub fn handle_error(&self, diagnostic: Diagnostic) -> Disposition {
        self.shared.handle_error(diagnostic)
    }

    /// The most recent exception, if any.
    pub fn last_exception(&self) -> Option<FaultRecord> {
        self.shared.last_exception.lock().clone()
    }

    /// The most recent diagnostic, if any.
    pub fn last_error(&self) -> Option<FaultRecord> {
        self.shared.last_error.lock().clone()
    }

    pub fn is_installed(&self) -> bool {
        self.registration.is_some()
    }

    /// Give the hooks back to whatever held them before. Runs once.
    pub fn uninstall(&mut self) {
        if let Some(registration) = self.registration.take() {
            let runtime = &self.shared.runtime;
            if let Some(previous) = registration.errors {
                runtime.restore_error_receiver(previous);
            }
            if let Some(previous) = registration.exceptions {
                runtime.restore_exception_receiver(previous);
            }
            debug!("catcher uninstalled");
        }
    }

    /// Uninstall and drop.
    pub fn teardown(mut self) {
        self.uninstall();
    }
}

impl<R: Runtime> Drop for Catcher<R> {
    fn drop(&mut self) {
        self.uninstall();
    }
}
