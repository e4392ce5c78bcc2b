//! VERSION polling through a full session: triggers, replies, timeouts.

mod common;

use common::TestSession;
use slirc_stats::commands::StatsCommand;
use slirc_stats::outbound::Outgoing;
use slirc_stats::stats::{ProbeStatus, UnknownCause};

#[test]
fn answered_probe_advances_immediately_and_silence_times_out() {
    let mut t = TestSession::active();

    t.feed(":A!u@h JOIN #rust");
    t.feed(":B!u@h JOIN #rust");
    t.feed(":C!u@h JOIN #rust");
    assert_eq!(t.outbound.take_probes(), vec!["A"]);

    let stats = t.session.stats().unwrap();
    assert_eq!(stats.queue().backlog().collect::<Vec<_>>(), vec!["B", "C"]);
    let timer_a = stats.queue().armed_token().unwrap();

    // A answers: B goes out now, not after A's timeout.
    let outcome = t.version_reply("A", "HexChat 2.16.1");
    assert!(outcome.handled());
    assert_eq!(t.outbound.take_probes(), vec!["B"]);
    assert!(!t.scheduler.armed().contains(&timer_a));
    assert_eq!(t.scheduler.cancelled_count(), 1);

    // B stays silent: the backstop settles it and C goes out.
    assert!(t.fire_timer());
    assert_eq!(t.outbound.take_probes(), vec!["C"]);

    let stats = t.session.stats().unwrap();
    assert_eq!(
        stats.table().get("A").unwrap().state.status,
        ProbeStatus::Resolved("HexChat 2.16.1".into())
    );
    assert_eq!(
        stats.table().get("B").unwrap().state.status,
        ProbeStatus::Unknown(UnknownCause::TimedOut)
    );
    assert!(stats.table().get("C").unwrap().state.is_pending());

    let snapshot = t.session.snapshot().unwrap();
    assert_eq!(snapshot.total, 2);
    assert_eq!(snapshot.pending, 1);
    assert_eq!(snapshot.by_version["unknown"], 1);
    assert_eq!(snapshot.by_family["HexChat"], 1);
}

#[test]
fn duplicate_identities_are_probed_once() {
    let mut t = TestSession::active();

    t.feed(":Alice!u@h JOIN #a");
    t.feed(":alice!u@h JOIN #b");
    t.feed(":irc.example 353 me = #a :@ALICE +[a] {a} bob");
    t.feed(":bob!u@h JOIN #c");

    let mut probes = t.outbound.take_probes();
    while t.fire_timer() {
        probes.extend(t.outbound.take_probes());
    }
    assert_eq!(probes, vec!["Alice", "[a]", "bob"]);
    assert_eq!(t.session.snapshot().unwrap().size(), 3);
}

#[test]
fn at_most_one_probe_pending() {
    let mut t = TestSession::active();
    t.feed(":irc.example 353 me @ #big :n1 n2 n3 n4 n5 n6");

    let pending = |t: &TestSession| t.session.stats().unwrap().table().pending_count();
    assert_eq!(pending(&t), 1);

    for n in ["n1", "n2", "n3"] {
        t.version_reply(n, "irssi v1.4.5");
        assert!(pending(&t) <= 1);
    }
    while t.fire_timer() {
        assert!(pending(&t) <= 1);
    }
    assert_eq!(pending(&t), 0);
    assert!(t.session.stats().unwrap().queue().is_idle());
}

#[test]
fn late_and_unsolicited_replies_fall_through() {
    let mut t = TestSession::active();
    t.feed(":slow!u@h JOIN #rust");
    assert!(t.fire_timer());

    // Arrives after the timeout already settled it.
    assert!(!t.version_reply("slow", "mIRC v7.75").handled());
    // Nobody asked this one.
    assert!(!t.version_reply("stranger", "mIRC v7.75").handled());

    let snapshot = t.session.snapshot().unwrap();
    assert_eq!(snapshot.by_version.get("mIRC v7.75"), None);
    assert_eq!(snapshot.by_version["unknown"], 1);
}

#[test]
fn privmsg_carried_version_is_not_absorbed() {
    let mut t = TestSession::active();
    t.feed(":alice!u@h JOIN #rust");
    t.outbound.take();

    // alice querying us, not answering us.
    let outcome = t.feed(":alice!u@h PRIVMSG me :\x01VERSION\x01");
    assert!(outcome.runs_default());
    assert!(
        t.session
            .stats()
            .unwrap()
            .table()
            .get("alice")
            .unwrap()
            .state
            .is_pending()
    );
}

#[test]
fn errmsg_and_malformed_replies_count_as_unknown() {
    let mut t = TestSession::active();
    t.feed(":irc.example 353 me = #rust :quiet weird other");

    assert!(
        t.feed(":quiet!u@h NOTICE me :\x01ERRMSG VERSION :unknown query\x01")
            .handled()
    );
    assert!(t.version_reply("weird", "bell\x07client").handled());
    // ERRMSG about some other query does not settle the probe.
    assert!(
        !t.feed(":other!u@h NOTICE me :\x01ERRMSG PING :nope\x01")
            .handled()
    );

    let stats = t.session.stats().unwrap();
    assert_eq!(
        stats.table().get("quiet").unwrap().state.status,
        ProbeStatus::Unknown(UnknownCause::ErrorReply)
    );
    assert_eq!(
        stats.table().get("weird").unwrap().state.status,
        ProbeStatus::Unknown(UnknownCause::Malformed)
    );
    assert!(stats.table().get("other").unwrap().state.is_pending());
}

#[test]
fn stale_timer_from_previous_activation_is_ignored() {
    let mut t = TestSession::active();
    t.feed(":alice!u@h JOIN #rust");
    let old = t.session.stats().unwrap().queue().armed_token().unwrap();

    assert!(t.session.run_command(StatsCommand::Stop, "#rust"));
    assert!(t.scheduler.armed().is_empty());
    assert!(t.session.run_command(StatsCommand::Start, "#rust"));

    assert!(!t.session.on_timer(old));
    assert_eq!(t.session.snapshot().unwrap().size(), 0);
}

#[test]
fn triggers_are_inert_while_stats_inactive() {
    let mut t = TestSession::new("");
    let outcome = t.feed(":alice!u@h JOIN #rust");
    assert_eq!(outcome.invoked, 0);
    assert!(t.outbound.take().is_empty());
    assert!(t.session.snapshot().is_none());
}

#[test]
fn report_is_written_into_conversation() {
    let mut t = TestSession::active();
    t.feed(":irc.example 353 me = #rust :a b c d");
    t.version_reply("a", "WeeChat 4.1.2");
    t.version_reply("b", "WeeChat 4.1.2");
    t.version_reply("c", "irssi v1.4.5");
    t.outbound.take();

    assert!(t.session.run_command(StatsCommand::Report, "#rust"));
    assert_eq!(
        t.outbound.take(),
        vec![Outgoing::system(
            "#rust",
            "Total hits: 3\nWaiting for: 1\n'WeeChat 4.1.2': 66.7% (2)\n'irssi v1.4.5': 33.3% (1)\n"
        )]
    );
}

#[test]
fn nick_change_probes_new_identity_but_never_ourselves() {
    let mut t = TestSession::active();
    t.feed(":alice!u@h JOIN #rust");
    assert!(t.fire_timer());
    t.outbound.take();

    let outcome = t.feed(":alice!u@h NICK :alicia");
    assert!(outcome.runs_default());
    assert_eq!(t.outbound.take_probes(), vec!["alicia"]);

    let stats = t.session.stats().unwrap();
    assert_eq!(
        stats.table().get("alice").unwrap().state.status,
        ProbeStatus::Unknown(UnknownCause::TimedOut)
    );
    assert!(stats.table().get("alicia").unwrap().state.is_pending());

    // Our own rename is processed before the session learns the new nick.
    let outcome = t.feed(":me!u@h NICK :me_away");
    assert!(outcome.runs_default());
    assert_eq!(t.session.nick(), "me_away");
    assert!(t.outbound.take_probes().is_empty());

    let stats = t.session.stats().unwrap();
    assert!(stats.table().get("me_away").is_none());
    assert_eq!(stats.queue().backlog_len(), 0);
    assert_eq!(t.session.snapshot().unwrap().size(), 2);
}
