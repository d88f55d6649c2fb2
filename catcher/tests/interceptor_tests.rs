//! # Interceptor Tests
//!
//! Drives a [`Catcher`] through an in-memory runtime:
//!
//! - hook registration per configuration and single-fire teardown
//! - last exception / last error slots
//! - halt policy as observed through the runtime
//! - backtrace rendering from runtime-supplied frames

mod common;

use catcher::{
    Catcher, CatcherConfig, Diagnostic, Disposition, Exception, FaultKind, Frame, HaltPolicy,
    Severity, code,
};
use common::{FakeRuntime, Recorded};
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn plain_console() -> CatcherConfig {
    let mut config = CatcherConfig::default();
    config.output.markup = false;
    config
}

fn install(runtime: &Arc<FakeRuntime>, config: CatcherConfig) -> (Catcher<FakeRuntime>, Recorded) {
    let recorded = Recorded::default();
    let catcher = Catcher::install_on(runtime.clone(), config).with_sinks(recorded.sinks());
    (catcher, recorded)
}

// ─── Registration ───────────────────────────────────────────────────

#[test]
fn test_install_registers_both_hooks_by_default() {
    let runtime = FakeRuntime::new();
    let (catcher, _) = install(&runtime, CatcherConfig::default());

    assert!(catcher.is_installed());
    assert!(runtime.exception_receiver().is_some());
    assert!(runtime.error_receiver().is_some());
}

#[test]
fn test_install_skips_hooks_not_requested() {
    let runtime = FakeRuntime::new();
    let config = CatcherConfig {
        intercept_exceptions: false,
        ..CatcherConfig::default()
    };
    let (catcher, _) = install(&runtime, config);

    assert!(runtime.exception_receiver().is_none());
    assert!(runtime.error_receiver().is_some());

    drop(catcher);
    assert_eq!(runtime.exception_restores.load(Ordering::SeqCst), 0);
    assert_eq!(runtime.error_restores.load(Ordering::SeqCst), 1);
}

#[test]
fn test_teardown_restores_previous_receivers_once() {
    let runtime = FakeRuntime::with_previous();
    let previous_exc = runtime.exception_receiver().unwrap();
    let previous_err = runtime.error_receiver().unwrap();

    let (mut catcher, _) = install(&runtime, CatcherConfig::default());
    assert!(!Arc::ptr_eq(&runtime.error_receiver().unwrap(), &previous_err));

    catcher.uninstall();
    catcher.uninstall();
    assert!(!catcher.is_installed());
    drop(catcher);

    assert_eq!(runtime.exception_restores.load(Ordering::SeqCst), 1);
    assert_eq!(runtime.error_restores.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&runtime.exception_receiver().unwrap(), &previous_exc));
    assert!(Arc::ptr_eq(&runtime.error_receiver().unwrap(), &previous_err));
}

#[test]
fn test_explicit_teardown_then_no_more_delivery() {
    let runtime = FakeRuntime::new();
    let (catcher, recorded) = install(&runtime, plain_console());

    catcher.teardown();
    assert!(!runtime.raise(Diagnostic::new(code::USER_WARNING, "late", "a.rs", 1)));
    assert!(recorded.console().is_empty());
    assert_eq!(runtime.error_restores.load(Ordering::SeqCst), 1);
}

#[test]
fn test_second_catcher_takes_over_and_hands_back() {
    let runtime = FakeRuntime::new();
    let (first, first_out) = install(&runtime, plain_console());
    let (second, second_out) = install(&runtime, plain_console());

    runtime.raise(Diagnostic::new(code::USER_NOTICE, "to second", "a.rs", 1));
    second.teardown();
    runtime.raise(Diagnostic::new(code::USER_NOTICE, "to first", "a.rs", 2));

    assert_eq!(second_out.console().len(), 1);
    assert_eq!(first_out.console().len(), 1);
    assert!(first_out.console()[0].contains("to first"));
    assert_eq!(first.last_error().unwrap().line, 2);
}

// ─── Last fault slots ───────────────────────────────────────────────

#[test]
fn test_last_slots_empty_before_any_fault() {
    let runtime = FakeRuntime::new();
    let (catcher, _) = install(&runtime, CatcherConfig::default());
    assert!(catcher.last_exception().is_none());
    assert!(catcher.last_error().is_none());
}

#[test]
fn test_exception_scenario_no_halt_and_recorded() {
    let runtime = FakeRuntime::new();
    let config = CatcherConfig {
        policy: HaltPolicy {
            halt_on_fatal: false,
            ..HaltPolicy::default()
        },
        ..plain_console()
    };
    let (catcher, recorded) = install(&runtime, config);

    assert!(runtime.throw(Exception::new("oops", "a.y", 5)));

    let last = catcher.last_exception().unwrap();
    assert_eq!(last.kind, FaultKind::Exception);
    assert_eq!(last.message, "oops");
    assert_eq!(last.file, "a.y");
    assert_eq!(last.line, 5);
    assert!(catcher.last_error().is_none());
    assert_eq!(
        recorded.console(),
        vec!["Catcher (Exception): oops (File: a.y - Line: 5)\n".to_string()]
    );
}

#[test]
fn test_last_slots_keep_only_most_recent() {
    let runtime = FakeRuntime::new();
    let (catcher, _) = install(&runtime, plain_console());

    runtime.throw(Exception::new("one", "a.rs", 1));
    runtime.throw(Exception::new("two", "b.rs", 2));
    runtime.raise(Diagnostic::new(code::WARNING, "w1", "c.rs", 3));
    runtime.raise(
        Diagnostic::new(code::USER_NOTICE, "n2", "d.rs", 4).with_context(Arc::new("ctx".to_string())),
    );

    let exc = catcher.last_exception().unwrap();
    assert_eq!((exc.message.as_str(), exc.line), ("two", 2));

    let err = catcher.last_error().unwrap();
    assert_eq!(err.kind, FaultKind::Error(Severity::Notice));
    assert_eq!(err.code, Some(code::USER_NOTICE));
    assert_eq!(err.message, "n2");
    assert_eq!(err.context_as::<String>().map(String::as_str), Some("ctx"));
}

// ─── Halt policy ────────────────────────────────────────────────────

#[test]
#[should_panic(expected = "halt(255)")]
fn test_fatal_error_halts_by_default() {
    let runtime = FakeRuntime::new();
    let (_catcher, _) = install(&runtime, plain_console());
    runtime.raise(Diagnostic::new(code::USER_ERROR, "boom", "f.x", 10));
}

#[test]
fn test_fatal_report_dispatched_before_halt() {
    let runtime = FakeRuntime::new();
    let (catcher, recorded) = install(&runtime, plain_console());

    let diagnostic = Diagnostic::new(code::USER_ERROR, "boom", "f.x", 10);
    assert_eq!(
        catcher.handle_error(diagnostic),
        Disposition::Halt { exit_code: 255 }
    );
    assert_eq!(
        recorded.console(),
        vec!["Catcher (Error): boom (File: f.x - Line: 10)\n".to_string()]
    );
    assert_eq!(catcher.last_error().unwrap().severity(), Some(Severity::Error));
}

#[test]
fn test_fatal_error_resumes_without_halt_on_fatal() {
    let runtime = FakeRuntime::new();
    let (catcher, recorded) = install(&runtime, plain_console());
    catcher.set_halt_policy(HaltPolicy {
        halt_on_fatal: false,
        ..HaltPolicy::default()
    });

    assert!(runtime.raise(Diagnostic::new(code::USER_ERROR, "boom", "f.x", 10)));
    assert_eq!(recorded.console().len(), 1);
}

#[test]
fn test_recoverable_error_continues_when_allowed() {
    let runtime = FakeRuntime::new();
    let (catcher, _) = install(&runtime, plain_console());
    catcher.set_halt_policy(HaltPolicy {
        allow_recoverable_continuation: true,
        ..HaltPolicy::default()
    });

    runtime.raise(Diagnostic::new(code::RECOVERABLE_ERROR, "bent", "r.rs", 7));
    assert_eq!(
        catcher.last_error().unwrap().kind,
        FaultKind::Error(Severity::RecoverableError)
    );
}

#[test]
#[should_panic(expected = "halt(255)")]
fn test_recoverable_error_halts_without_continuation() {
    let runtime = FakeRuntime::new();
    let (_catcher, _) = install(&runtime, plain_console());
    runtime.raise(Diagnostic::new(code::RECOVERABLE_ERROR, "bent", "r.rs", 7));
}

#[test]
#[should_panic(expected = "halt(9)")]
fn test_unknown_code_halts_with_configured_exit_code() {
    let runtime = FakeRuntime::new();
    let (catcher, _) = install(&runtime, plain_console());
    catcher.set_halt_policy(HaltPolicy {
        exit_code: 9,
        ..HaltPolicy::default()
    });
    catcher.on_error(Diagnostic::new(0x7777, "what", "u.rs", 1));
}

#[test]
fn test_unknown_code_resumes_when_configured() {
    let runtime = FakeRuntime::new();
    let (catcher, recorded) = install(&runtime, plain_console());
    catcher.set_halt_policy(HaltPolicy {
        halt_on_unknown_severity: false,
        ..HaltPolicy::default()
    });

    catcher.on_error(Diagnostic::new(0x7777, "what", "u.rs", 1));
    assert_eq!(
        recorded.console(),
        vec!["Catcher (Unknown Error): what (File: u.rs - Line: 1)\n".to_string()]
    );
}

#[test]
fn test_warnings_and_notices_never_halt() {
    let runtime = FakeRuntime::new();
    let (catcher, recorded) = install(&runtime, plain_console());
    for raw in [code::WARNING, code::USER_WARNING, code::NOTICE, code::USER_NOTICE, code::STRICT] {
        assert_eq!(
            catcher.handle_error(Diagnostic::new(raw, "fine", "ok.rs", 1)),
            Disposition::Resume
        );
    }
    assert_eq!(recorded.console().len(), 5);
}

// ─── Backtrace ──────────────────────────────────────────────────────

fn three_frames() -> Vec<Frame> {
    vec![
        Frame::new("on_error").owned_by("catcher::Catcher"),
        Frame::new("load").owned_by("app::Config").at("src/config.rs", 40),
        Frame::new("main").owned_by("app").at("src/main.rs", 3),
    ]
}

#[test]
fn test_backtrace_block_when_enabled() {
    let runtime = FakeRuntime::with_frames(three_frames());
    let (catcher, recorded) = install(&runtime, plain_console());
    catcher.set_backtrace(true);

    runtime.raise(Diagnostic::new(code::USER_WARNING, "slow", "src/config.rs", 40));

    assert_eq!(
        recorded.console(),
        vec![
            "Catcher (Warning): slow (File: src/config.rs - Line: 40)\n\
             Backtrace:\n\
             app->main() (File: src/main.rs - Line: 3)\n\
             app::Config->load() (File: src/config.rs - Line: 40)\n\
             \n"
            .to_string()
        ]
    );
}

#[test]
fn test_no_backtrace_block_when_disabled() {
    let runtime = FakeRuntime::with_frames(three_frames());
    let (_catcher, recorded) = install(&runtime, plain_console());

    runtime.raise(Diagnostic::new(code::USER_WARNING, "slow", "src/config.rs", 40));
    assert!(!recorded.console()[0].contains("Backtrace:"));
}

#[test]
fn test_exceptions_never_carry_backtrace() {
    let runtime = FakeRuntime::with_frames(three_frames());
    let (catcher, recorded) = install(&runtime, plain_console());
    catcher.set_backtrace(true);

    runtime.throw(Exception::new("oops", "a.y", 5));
    assert!(!recorded.console()[0].contains("Backtrace:"));
}

// ─── Setters ────────────────────────────────────────────────────────

#[test]
fn test_markup_output_by_default() {
    let runtime = FakeRuntime::new();
    let (_catcher, recorded) = install(&runtime, CatcherConfig::default());

    runtime.raise(Diagnostic::new(code::USER_NOTICE, "n", "a.rs", 1));
    assert_eq!(
        recorded.console(),
        vec!["Catcher (Notice): n (File: a.rs - Line: 1)<br />\n".to_string()]
    );
}

#[test]
fn test_setters_route_to_mail_and_log() {
    let runtime = FakeRuntime::new();
    let (catcher, recorded) = install(&runtime, CatcherConfig::default());
    catcher.set_output(false, true);
    catcher.set_mail("ops@example.org", "app@example.org", "Fault");
    catcher.set_log_file("/tmp/catcher-setters.log");

    runtime.raise(Diagnostic::new(code::USER_NOTICE, "n", "a.rs", 1));

    assert!(recorded.console().is_empty());
    let mail = recorded.mail();
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].to, "ops@example.org");
    assert_eq!(mail[0].from, "app@example.org");
    assert_eq!(mail[0].subject, "Fault");
    assert_eq!(mail[0].body, "Catcher (Notice): n (File: a.rs - Line: 1)\n");
    let log = recorded.log();
    assert_eq!(log.len(), 1);
    assert!(log[0].1.ends_with("] Catcher (Notice): n (File: a.rs - Line: 1)\n"));

    catcher.clear_mail();
    catcher.clear_log_file();
    runtime.raise(Diagnostic::new(code::USER_NOTICE, "n", "a.rs", 1));
    assert_eq!(recorded.mail().len(), 1);
    assert_eq!(recorded.log().len(), 1);
}
