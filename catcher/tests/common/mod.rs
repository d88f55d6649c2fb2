//! Shared test doubles: an in-memory runtime and recording sinks.

#![allow(dead_code)]

use catcher::error::{SinkError, SinkResult};
use catcher::runtime::{ErrorReceiver, ExceptionReceiver, Runtime};
use catcher::sink::{ConsoleSink, LogSink, MailSink, Sinks};
use catcher::{Diagnostic, Exception, Frame};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// ─── Runtime ────────────────────────────────────────────────────────

/// Placeholder occupying a hook before the catcher is installed.
pub struct Previous(pub &'static str);

impl ExceptionReceiver for Previous {
    fn on_exception(&self, _exception: &Exception) {}
}

impl ErrorReceiver for Previous {
    fn on_error(&self, _diagnostic: Diagnostic) {}
}

/// Runtime whose hooks are plain slots and whose halt panics.
#[derive(Default)]
pub struct FakeRuntime {
    exception_slot: Mutex<Option<Arc<dyn ExceptionReceiver>>>,
    error_slot: Mutex<Option<Arc<dyn ErrorReceiver>>>,
    pub frames: Mutex<Vec<Frame>>,
    pub exception_restores: AtomicUsize,
    pub error_restores: AtomicUsize,
}

impl FakeRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Runtime whose hooks are already taken by [`Previous`] receivers.
    pub fn with_previous() -> Arc<Self> {
        let runtime = Self::default();
        *runtime.exception_slot.lock() = Some(Arc::new(Previous("exceptions")));
        *runtime.error_slot.lock() = Some(Arc::new(Previous("errors")));
        Arc::new(runtime)
    }

    pub fn with_frames(frames: Vec<Frame>) -> Arc<Self> {
        let runtime = Self::default();
        *runtime.frames.lock() = frames;
        Arc::new(runtime)
    }

    pub fn exception_receiver(&self) -> Option<Arc<dyn ExceptionReceiver>> {
        self.exception_slot.lock().clone()
    }

    pub fn error_receiver(&self) -> Option<Arc<dyn ErrorReceiver>> {
        self.error_slot.lock().clone()
    }

    /// Deliver an exception the way the host would. Returns false when
    /// nothing is registered.
    pub fn throw(&self, exception: Exception) -> bool {
        match self.exception_receiver() {
            Some(receiver) => {
                receiver.on_exception(&exception);
                true
            }
            None => false,
        }
    }

    /// Deliver a diagnostic the way the host would.
    pub fn raise(&self, diagnostic: Diagnostic) -> bool {
        match self.error_receiver() {
            Some(receiver) => {
                receiver.on_error(diagnostic);
                true
            }
            None => false,
        }
    }
}

impl Runtime for FakeRuntime {
    type PreviousExceptionReceiver = Option<Arc<dyn ExceptionReceiver>>;
    type PreviousErrorReceiver = Option<Arc<dyn ErrorReceiver>>;

    fn register_exception_receiver(
        &self,
        receiver: Arc<dyn ExceptionReceiver>,
    ) -> Self::PreviousExceptionReceiver {
        self.exception_slot.lock().replace(receiver)
    }

    fn restore_exception_receiver(&self, previous: Self::PreviousExceptionReceiver) {
        self.exception_restores.fetch_add(1, Ordering::SeqCst);
        *self.exception_slot.lock() = previous;
    }

    fn register_error_receiver(
        &self,
        receiver: Arc<dyn ErrorReceiver>,
    ) -> Self::PreviousErrorReceiver {
        self.error_slot.lock().replace(receiver)
    }

    fn restore_error_receiver(&self, previous: Self::PreviousErrorReceiver) {
        self.error_restores.fetch_add(1, Ordering::SeqCst);
        *self.error_slot.lock() = previous;
    }

    fn capture_call_stack(&self) -> Vec<Frame> {
        self.frames.lock().clone()
    }

    fn halt(&self, exit_code: i32) -> ! {
        panic!("halt({exit_code})")
    }
}

// ─── Sinks ──────────────────────────────────────────────────────────

/// Everything the recording sinks saw.
#[derive(Clone, Default)]
pub struct Recorded {
    pub console: Arc<Mutex<Vec<String>>>,
    pub log: Arc<Mutex<Vec<(PathBuf, String)>>>,
    pub mail: Arc<Mutex<Vec<Mail>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

impl Recorded {
    pub fn sinks(&self) -> Sinks {
        Sinks::new(
            RecordingConsole(self.console.clone()),
            RecordingLog(self.log.clone()),
            RecordingMail(self.mail.clone()),
        )
    }

    pub fn console(&self) -> Vec<String> {
        self.console.lock().clone()
    }

    pub fn log(&self) -> Vec<(PathBuf, String)> {
        self.log.lock().clone()
    }

    pub fn mail(&self) -> Vec<Mail> {
        self.mail.lock().clone()
    }
}

pub struct RecordingConsole(pub Arc<Mutex<Vec<String>>>);

impl ConsoleSink for RecordingConsole {
    fn write(&self, text: &str) -> SinkResult<()> {
        self.0.lock().push(text.to_string());
        Ok(())
    }
}

pub struct RecordingLog(pub Arc<Mutex<Vec<(PathBuf, String)>>>);

impl LogSink for RecordingLog {
    fn append_line(&self, path: &Path, text: &str) -> SinkResult<()> {
        self.0.lock().push((path.to_path_buf(), text.to_string()));
        Ok(())
    }
}

pub struct RecordingMail(pub Arc<Mutex<Vec<Mail>>>);

impl MailSink for RecordingMail {
    fn send(&self, to: &str, from: &str, subject: &str, body: &str) -> SinkResult<()> {
        self.0.lock().push(Mail {
            to: to.to_string(),
            from: from.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Sinks that fail every call, counting attempts.
#[derive(Clone, Default)]
pub struct Failing {
    pub attempts: Arc<AtomicUsize>,
}

impl Failing {
    pub fn sinks(&self) -> Sinks {
        Sinks::new(self.clone(), self.clone(), self.clone())
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail(&self) -> SinkResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Io {
            source: std::io::Error::other("sink unavailable"),
        })
    }
}

impl ConsoleSink for Failing {
    fn write(&self, _text: &str) -> SinkResult<()> {
        self.fail()
    }
}

impl LogSink for Failing {
    fn append_line(&self, _path: &Path, _text: &str) -> SinkResult<()> {
        self.fail()
    }
}

impl MailSink for Failing {
    fn send(&self, _to: &str, _from: &str, _subject: &str, _body: &str) -> SinkResult<()> {
        self.fail()
    }
}
