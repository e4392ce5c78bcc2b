//! Handler chain ordering, short-circuiting and fault isolation.

mod common;

use common::{ACCOUNT, RecordingOutbound, TestSession};
use parking_lot::Mutex;
use slirc_stats::error::{FaultCause, HandlerError};
use slirc_stats::handlers::{
    ConnectionView, Context, Dispatcher, Enabled, HandlerDescriptor, Outcome, Priority,
};
use slirc_stats::message::InboundMessage;
use slirc_stats::timer::ManualScheduler;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn recorder(name: &'static str, priority: i32, outcome: Outcome, log: &Log) -> HandlerDescriptor {
    let log = Arc::clone(log);
    HandlerDescriptor::new(name, Priority(priority)).on_fn("PRIVMSG", move |_, _| {
        log.lock().push(name);
        Ok(outcome)
    })
}

fn dispatch(dispatcher: &Dispatcher, line: &str) -> slirc_stats::handlers::DispatchOutcome {
    let outbound = RecordingOutbound::default();
    let scheduler = ManualScheduler::new();
    let mut ctx = Context::new(ACCOUNT, "me", None, &outbound, &scheduler);
    let msg: InboundMessage = line.parse().unwrap();
    dispatcher.dispatch(&mut ctx, &msg)
}

#[test]
fn chain_runs_by_priority_and_stops_on_handled() {
    let log = Log::default();
    let dispatcher = Dispatcher::new();
    // Registered out of order on purpose.
    dispatcher.irc().register(recorder("five", 5, Outcome::Fallthrough, &log)).unwrap();
    dispatcher.irc().register(recorder("one", 1, Outcome::Fallthrough, &log)).unwrap();
    dispatcher.irc().register(recorder("ten", 10, Outcome::Fallthrough, &log)).unwrap();

    let outcome = dispatch(&dispatcher, ":a!u@h PRIVMSG #c :hi");
    assert_eq!(*log.lock(), vec!["ten", "five", "one"]);
    assert!(outcome.runs_default());

    log.lock().clear();
    dispatcher.irc().unregister("ten");
    dispatcher.irc().register(recorder("ten", 10, Outcome::Handled, &log)).unwrap();

    let outcome = dispatch(&dispatcher, ":a!u@h PRIVMSG #c :hi");
    assert_eq!(*log.lock(), vec!["ten"]);
    assert_eq!(outcome.handled_by.as_deref(), Some("ten"));
    assert!(!outcome.runs_default());
}

#[test]
fn failing_and_panicking_handlers_are_isolated() {
    let log = Log::default();
    let dispatcher = Dispatcher::new();
    dispatcher
        .irc()
        .register(HandlerDescriptor::new("errs", Priority(30)).on_fn("PRIVMSG", |_, _| {
            Err(HandlerError::Internal("boom".into()))
        }))
        .unwrap();
    dispatcher
        .irc()
        .register(HandlerDescriptor::new("panics", Priority(20)).on_fn("PRIVMSG", |_, _| {
            panic!("handler bug")
        }))
        .unwrap();
    dispatcher.irc().register(recorder("survivor", 10, Outcome::Fallthrough, &log)).unwrap();

    let outcome = dispatch(&dispatcher, ":a!u@h PRIVMSG #c :hi");
    assert_eq!(*log.lock(), vec!["survivor"]);
    assert_eq!(outcome.invoked, 3);
    assert_eq!(outcome.faults.len(), 2);
    assert_eq!(outcome.faults[0].handler, "errs");
    assert!(matches!(outcome.faults[0].cause, FaultCause::Error(_)));
    assert!(matches!(&outcome.faults[1].cause, FaultCause::Panic(m) if m.contains("handler bug")));
}

#[test]
fn unregister_round_trip_restores_resolution() {
    let log = Log::default();
    let dispatcher = Dispatcher::new();
    dispatcher.irc().register(recorder("base", 0, Outcome::Fallthrough, &log)).unwrap();

    let view = ConnectionView {
        account: ACCOUNT,
        stats_active: true,
    };
    let names = |d: &Dispatcher, cmd: &str| {
        d.irc()
            .resolve(cmd, &view)
            .iter()
            .map(|r| r.name().to_owned())
            .collect::<Vec<_>>()
    };
    let before: Vec<_> = ["PRIVMSG", "JOIN", "333"].map(|c| names(&dispatcher, c)).into();

    assert!(!dispatcher.irc().unregister("never-registered"));
    assert_eq!(dispatcher.irc().len(), 1);

    dispatcher.irc().register(recorder("extra", 50, Outcome::Handled, &log)).unwrap();
    assert!(dispatcher.irc().unregister("extra"));

    let after: Vec<_> = ["PRIVMSG", "JOIN", "333"].map(|c| names(&dispatcher, c)).into();
    assert_eq!(before, after);
}

#[test]
fn enablement_is_evaluated_per_message() {
    let log = Log::default();
    let switch = Arc::new(AtomicBool::new(false));
    let dispatcher = Dispatcher::new();
    let flag = Arc::clone(&switch);
    dispatcher
        .irc()
        .register(
            recorder("toggled", 0, Outcome::Handled, &log)
                .enabled(Enabled::When(Arc::new(move |_: &ConnectionView<'_>| {
                    flag.load(Ordering::SeqCst)
                }))),
        )
        .unwrap();

    assert!(dispatch(&dispatcher, ":a!u@h PRIVMSG #c :1").runs_default());
    switch.store(true, Ordering::SeqCst);
    assert!(dispatch(&dispatcher, ":a!u@h PRIVMSG #c :2").handled());
    assert_eq!(*log.lock(), vec!["toggled"]);
}

#[test]
fn extras_consume_topic_setter_but_faults_fall_back() {
    let mut t = TestSession::new("");

    let outcome = t.feed(":irc.example 333 me #rust alice 1700000000");
    assert_eq!(outcome.handled_by.as_deref(), Some("IRC Extras"));
    assert_eq!(t.outbound.take().len(), 1);

    let outcome = t.feed(":irc.example 333 me #rust alice soon");
    assert!(outcome.runs_default());
    assert_eq!(outcome.faults.len(), 1);
    assert_eq!(outcome.faults[0].cause.error_code(), "malformed");
}

#[test]
fn auto_identify_only_for_configured_account() {
    let block = "[[auto_identify]]\naccount = \"me@irc.example\"\npassword = \"pw\"\n";
    let mut t = TestSession::new(block);
    assert!(t.feed(":irc.example 001 me :Welcome").runs_default());
    assert_eq!(
        t.outbound.take(),
        vec![slirc_stats::outbound::Outgoing::Line(
            "PRIVMSG NickServ :IDENTIFY pw".into()
        )]
    );

    let other = "[[auto_identify]]\naccount = \"elsewhere@irc.example\"\npassword = \"pw\"\n";
    let mut t = TestSession::new(other);
    t.feed(":irc.example 001 me :Welcome");
    assert!(t.outbound.take().is_empty());
}
