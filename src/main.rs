//! slirc-stats - replay an IRC transcript through the client extensions.
//!
//! Usage: `slirc-stats [config.toml] [transcript]`
//!
//! Each transcript line is either a raw server line or a `/command` typed
//! by the user. Without a transcript path, lines are read from stdin.

use std::sync::Arc;

use anyhow::Context as _;
use slirc_stats::commands::StatsCommand;
use slirc_stats::config::{self, Config};
use slirc_stats::handlers::{self, Dispatcher};
use slirc_stats::message::InboundMessage;
use slirc_stats::outbound::{ChannelOutbound, Outgoing};
use slirc_stats::session::Session;
use slirc_stats::timer::TokioScheduler;
use slirc_stats::{metrics, telemetry};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only replay output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .unwrap_or_else(|| "slirc-stats.toml".to_string());
    let transcript = args.next();

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;
    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    info!(
        account = %config.connection.account,
        nick = %config.connection.nick,
        casemapping = %config.connection.casemapping,
        "Starting slirc-stats replay"
    );

    metrics::init();

    let dispatcher = Arc::new(Dispatcher::new());
    handlers::register_defaults(&dispatcher, &config)?;

    let input: Box<dyn AsyncRead + Unpin + Send> = match &transcript {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening transcript {path}"))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };

    let span = telemetry::spans::connection(&config.connection.account);
    let result = replay(&config, Arc::clone(&dispatcher), input)
        .instrument(span)
        .await;

    handlers::unregister_defaults(&dispatcher);
    debug!(metrics = %metrics::gather_metrics(), "Final metrics");
    result
}

/// The connection event loop: inbound lines, probe timers and outbound
/// items are all serviced from this one task.
async fn replay(
    config: &Config,
    dispatcher: Arc<Dispatcher>,
    input: Box<dyn AsyncRead + Unpin + Send>,
) -> anyhow::Result<()> {
    let (outbound, mut out_rx) = ChannelOutbound::new();
    let (scheduler, mut timer_rx) = TokioScheduler::new();
    let mut session = Session::new(config, dispatcher, Arc::new(outbound), Arc::new(scheduler));

    let mut lines = BufReader::new(input).lines();
    let mut reading = true;

    while reading {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("reading transcript")? {
                    Some(line) => process_line(&mut session, &line),
                    None => reading = false,
                }
            }
            Some(token) = timer_rx.recv() => {
                session.on_timer(token);
            }
            Some(item) = out_rx.recv() => print_outgoing(&item),
        }
    }

    let conversation = session.account().to_owned();
    if !session.run_command(StatsCommand::Report, &conversation) {
        info!("Stats collection was not active; no report");
    }
    session.close();

    drain(&mut out_rx);
    Ok(())
}

fn process_line(session: &mut Session, line: &str) {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return;
    }

    if line.starts_with('/') {
        match line.parse::<StatsCommand>() {
            Ok(command) => {
                let conversation = session.account().to_owned();
                if !session.run_command(command, &conversation) {
                    warn!(%command, "Command had no effect");
                }
            }
            Err(e) => warn!(error = %e, "Ignoring user command"),
        }
        return;
    }

    match line.parse::<InboundMessage>() {
        Ok(msg) => {
            let outcome = session.handle_message(&msg);
            if outcome.runs_default() {
                debug!(command = %msg.command, "Default processing");
            }
        }
        Err(e) => warn!(error = %e, "Skipping unparseable line"),
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Outgoing>) {
    while let Ok(item) = rx.try_recv() {
        print_outgoing(&item);
    }
}

fn print_outgoing(item: &Outgoing) {
    match item {
        Outgoing::Line(line) => println!(">> {line}"),
        Outgoing::System { target, text } => {
            for line in text.lines() {
                println!("[{target}] {line}");
            }
        }
    }
}
