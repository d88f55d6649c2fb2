//! Host runtime abstraction.
//!
//! The catcher never touches process-global hooks directly. It talks to a
//! [`Runtime`], which owns the hook slots, hands back whatever was
//! registered before, captures call stacks and performs the final halt.
//!
//! [`ProcessRuntime`] is the real thing:
//!
//! - unhandled exceptions are panics; the exception receiver replaces the
//!   process panic hook.
//! - raised diagnostics come from [`raise`], [`raise_with_context`] and the
//!   [`raise!`](crate::raise!) macro; the error receiver occupies a single
//!   process-wide slot.
//! - halting flushes the standard streams and calls `_exit(2)`.
//!
//! Only one receiver per hook is live at a time. Registering a second one
//! replaces the first; restoring must happen in reverse order of
//! registration.

use crate::fault::{Context, Diagnostic, Exception};
use crate::stack::{self, Frame};
use parking_lot::RwLock;
use std::io::Write;
use std::panic::{self, Location, PanicHookInfo};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Receives unhandled exceptions from the runtime.
pub trait ExceptionReceiver: Send + Sync {
    fn on_exception(&self, exception: &Exception);
}

/// Receives raised diagnostics from the runtime.
pub trait ErrorReceiver: Send + Sync {
    fn on_error(&self, diagnostic: Diagnostic);
}

/// Registration, stack inspection and termination services of the host.
pub trait Runtime: Send + Sync + 'static {
    /// Whatever occupied the exception hook before a registration.
    type PreviousExceptionReceiver: Send;
    /// Whatever occupied the error hook before a registration.
    type PreviousErrorReceiver: Send;

    fn register_exception_receiver(
        &self,
        receiver: Arc<dyn ExceptionReceiver>,
    ) -> Self::PreviousExceptionReceiver;

    fn restore_exception_receiver(&self, previous: Self::PreviousExceptionReceiver);

    fn register_error_receiver(
        &self,
        receiver: Arc<dyn ErrorReceiver>,
    ) -> Self::PreviousErrorReceiver;

    fn restore_error_receiver(&self, previous: Self::PreviousErrorReceiver);

    /// Capture the call stack, innermost frame first.
    ///
    /// Frame 0 is the receiver entry point that delivered the fault; the
    /// runtime's own capture machinery is not included.
    fn capture_call_stack(&self) -> Vec<Frame>;

    /// Terminate the process immediately, without unwinding.
    fn halt(&self, exit_code: i32) -> !;
}

// ─── Process runtime ────────────────────────────────────────────────

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Panic hook displaced by an exception receiver.
///
/// When restored from a panicking thread the hook cannot be swapped back;
/// it is parked in `retired` instead and the receiver's hook forwards to it
/// from then on.
pub struct PreviousPanicHook {
    hook: PanicHook,
    retired: Arc<OnceLock<PanicHook>>,
}

impl std::fmt::Debug for PreviousPanicHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviousPanicHook")
            .field("retired", &self.retired.get().is_some())
            .finish_non_exhaustive()
    }
}

static ERROR_RECEIVER: RwLock<Option<Arc<dyn ErrorReceiver>>> = parking_lot::const_rwlock(None);

/// Symbol path prefix of the diagnostic entry points below.
const RAISE_ENTRY: &str = "catcher::runtime::raise";

/// Symbol path prefix of the interceptor's own methods.
const CATCHER_ENTRY: &str = "catcher::catcher::";

/// The running process as host runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRuntime;

impl Runtime for ProcessRuntime {
    type PreviousExceptionReceiver = PreviousPanicHook;
    type PreviousErrorReceiver = Option<Arc<dyn ErrorReceiver>>;

    fn register_exception_receiver(
        &self,
        receiver: Arc<dyn ExceptionReceiver>,
    ) -> PreviousPanicHook {
        let hook = panic::take_hook();
        let retired: Arc<OnceLock<PanicHook>> = Arc::default();
        let forward = retired.clone();
        panic::set_hook(Box::new(move |info| match forward.get() {
            Some(previous) => previous(info),
            None => receiver.on_exception(&Exception::from_panic(info)),
        }));
        debug!("panic hook replaced");
        PreviousPanicHook { hook, retired }
    }

    fn restore_exception_receiver(&self, previous: PreviousPanicHook) {
        // set_hook panics on a panicking thread, and this runs from Drop.
        if std::thread::panicking() {
            let _ = previous.retired.set(previous.hook);
            debug!("thread is panicking, panic hook left forwarding to its predecessor");
            return;
        }
        panic::set_hook(previous.hook);
        debug!("panic hook restored");
    }

    fn register_error_receiver(
        &self,
        receiver: Arc<dyn ErrorReceiver>,
    ) -> Option<Arc<dyn ErrorReceiver>> {
        let previous = ERROR_RECEIVER.write().replace(receiver);
        debug!(replaced = previous.is_some(), "error receiver registered");
        previous
    }

    fn restore_error_receiver(&self, previous: Option<Arc<dyn ErrorReceiver>>) {
        *ERROR_RECEIVER.write() = previous;
        debug!("error receiver restored");
    }

    #[inline(never)]
    fn capture_call_stack(&self) -> Vec<Frame> {
        let mut frames = stack::capture();
        // Drop everything inside the catcher: start at the raise entry point
        // when the fault came through it, then at the outermost catcher
        // method, otherwise just past this function.
        let outermost = |prefix: &str| frames.iter().rposition(|frame| frame.path_starts_with(prefix));
        let start = outermost(RAISE_ENTRY)
            .or_else(|| outermost(CATCHER_ENTRY))
            .or_else(|| {
                frames
                    .iter()
                    .position(|frame| frame.function == "capture_call_stack")
                    .map(|i| i + 1)
            })
            .unwrap_or(0);
        frames.drain(..start.min(frames.len()));
        frames
    }

    fn halt(&self, exit_code: i32) -> ! {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
        // SAFETY: _exit has no preconditions and never returns. Skipping
        // atexit handlers and destructors is the point of a halt.
        unsafe { libc::_exit(exit_code) }
    }
}

/// Raise a diagnostic at the caller's location.
///
/// Delivered synchronously to the registered error receiver. Without one
/// the diagnostic is logged and execution continues.
#[track_caller]
#[inline(never)]
pub fn raise(code: i32, message: impl Into<String>) {
    deliver(Diagnostic::at(code, message, Location::caller()));
}

/// [`raise`] with an opaque context kept alongside the error record.
#[track_caller]
#[inline(never)]
pub fn raise_with_context(code: i32, message: impl Into<String>, context: Context) {
    deliver(Diagnostic::at(code, message, Location::caller()).with_context(context));
}

fn deliver(diagnostic: Diagnostic) {
    // Clone out of the slot so the receiver may re-register or raise again.
    let receiver = ERROR_RECEIVER.read().clone();
    match receiver {
        Some(receiver) => receiver.on_error(diagnostic),
        None => warn!(
            code = diagnostic.code,
            file = %diagnostic.file,
            line = diagnostic.line,
            "unhandled diagnostic: {}",
            diagnostic.message
        ),
    }
}

/// Raise a diagnostic with a formatted message.
///
/// ```rust,no_run
/// use catcher::code;
///
/// catcher::raise!(code::USER_WARNING, "disk at {}%", 93);
/// ```
#[macro_export]
macro_rules! raise {
    ($code:expr, $($arg:tt)+) => {
        $crate::runtime::raise($code, ::std::format!($($arg)+))
    };
}
