use anyhow::{Context, Result};
use common::filters::{parse_number, FilterKey};
use common::monitor_api::MonitorApi;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::filter_state::FilterState;
use crate::orchestrator::DataOrchestrator;
use crate::panel::render_dashboard;
use crate::session::Session;
use crate::sources::DashboardSnapshot;

pub const USAGE: &str = "usage: dashboard [--config PATH] [run|once|url] [ADDRESS]";

const CONSOLE_HELP: &str = "commands: set <key> <value> | quit
keys: account_age_days large_stake profit_threshold reinvest_min_days reinvest_max_days";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Keep refreshing until quit.
    Run { address: Option<String> },
    /// One refresh cycle, printed.
    Once { address: Option<String> },
    /// Print the shareable URL for an address.
    Url { address: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub config_path: Option<String>,
    pub command: Command,
}

pub fn parse_args<I>(mut args: I) -> std::result::Result<Invocation, String>
where
    I: Iterator<Item = String>,
{
    // Drop argv[0].
    let _ = args.next();

    let mut config_path = None;
    let mut positional = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args
                .next()
                .ok_or_else(|| "--config needs a path".to_string())?;
            config_path = Some(path);
        } else if let Some(path) = arg.strip_prefix("--config=") {
            config_path = Some(path.to_string());
        } else if arg == "--help" || arg == "-h" {
            return Err(USAGE.to_string());
        } else {
            positional.push(arg);
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next() {
        None => Command::Run { address: None },
        Some(cmd) => match cmd.as_str() {
            "run" => Command::Run {
                address: positional.next(),
            },
            "once" => Command::Once {
                address: positional.next(),
            },
            "url" => Command::Url {
                address: positional.next(),
            },
            addr if looks_like_address(addr) => Command::Run {
                address: Some(cmd.clone()),
            },
            other => return Err(format!("unknown command: {other}\n{USAGE}")),
        },
    };
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument: {extra}\n{USAGE}"));
    }

    Ok(Invocation {
        config_path,
        command,
    })
}

fn looks_like_address(arg: &str) -> bool {
    arg.contains("://") || arg.starts_with('/') || arg.starts_with('?')
}

/// A line typed into the running dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Set { key: FilterKey, value: f64 },
    Quit,
    Help,
    Blank,
}

pub fn parse_console_line(line: &str) -> std::result::Result<ConsoleCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(ConsoleCommand::Blank);
    };
    match verb {
        "quit" | "exit" | "q" => Ok(ConsoleCommand::Quit),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "set" => {
            let (Some(key), Some(raw), None) = (words.next(), words.next(), words.next()) else {
                return Err("usage: set <key> <value>".to_string());
            };
            let key: FilterKey = key.parse()?;
            let value = parse_number(raw).ok_or_else(|| format!("not a number: {raw}"))?;
            Ok(ConsoleCommand::Set { key, value })
        }
        other => Err(format!("unknown command: {other} (try help)")),
    }
}

pub fn print_url(filters: &FilterState) {
    println!("{}", filters.shareable_url());
}

/// Run a single cycle and print the panels. Fails if the cycle failed.
pub async fn run_once<A: MonitorApi + 'static>(
    orchestrator: &DataOrchestrator<A>,
    filters: &FilterState,
) -> Result<()> {
    let mut snapshot = DashboardSnapshot::new(*filters.params(), filters.shareable_url());
    let outcome = orchestrator.refresh(filters.params()).await;
    let failure = match outcome {
        Ok(data) => {
            data.apply_to(&mut snapshot);
            None
        }
        Err(failure) => {
            snapshot.mark_all_failed(&failure.message);
            Some(failure)
        }
    };
    print!("{}", render_dashboard(&snapshot));

    match failure {
        Some(failure) => Err(failure).context("refresh cycle failed"),
        None => Ok(()),
    }
}

/// Drive a live session from the terminal until `quit`, end of input or
/// Ctrl-C, re-rendering on every published change.
pub async fn run_interactive(session: Session) -> Result<()> {
    let handle = session.handle();
    let mut updates = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{CONSOLE_HELP}\n");
    let text = render_dashboard(&updates.borrow_and_update());
    print!("{text}");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let text = render_dashboard(&updates.borrow_and_update());
                print!("{text}");
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    info!("end of input");
                    break;
                };
                match parse_console_line(&line) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(ConsoleCommand::Blank) => {}
                    Ok(ConsoleCommand::Help) => println!("{CONSOLE_HELP}"),
                    Ok(ConsoleCommand::Set { key, value }) => {
                        let update = handle.set_filter(key, value).await?;
                        if update.applied {
                            println!("share: {}", update.url);
                        } else {
                            println!("{key} unchanged");
                        }
                    }
                    Err(message) => eprintln!("{message}"),
                }
            }
        }
    }

    session.teardown().await;
    Ok(())
}
