use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{self, MissedTickBehavior};

use crate::dashboard::client::TrackerApi;
use crate::dashboard::console::ConsoleLine;
use crate::dashboard::map::{HeadlessMap, MarkerId};
use crate::dashboard::session::Session;

/// A line typed on stdin.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Refresh,
    Location {
        latitude: f64,
        longitude: f64,
        altitude_m: f64,
    },
    Search(String),
    Track(String),
    Untrack(String),
    /// 1-based index into the last search results.
    Pick(usize),
    Info(MarkerId),
    Status,
    Console,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word {
            "" => Err(CommandError::Empty),
            "refresh" => Ok(Command::Refresh),
            "status" => Ok(Command::Status),
            "console" => Ok(Command::Console),
            "quit" | "exit" => Ok(Command::Quit),
            "loc" => {
                const USAGE: &str = "loc <latitude> <longitude> [altitude m]";
                let numbers = rest
                    .split_whitespace()
                    .map(|p| p.parse::<f64>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| CommandError::Usage(USAGE))?;
                match numbers[..] {
                    [latitude, longitude] => Ok(Command::Location {
                        latitude,
                        longitude,
                        altitude_m: 0.0,
                    }),
                    [latitude, longitude, altitude_m] => Ok(Command::Location {
                        latitude,
                        longitude,
                        altitude_m,
                    }),
                    _ => Err(CommandError::Usage(USAGE)),
                }
            }
            // An empty search is allowed: it clears the results.
            "search" => Ok(Command::Search(rest.to_string())),
            "track" | "untrack" if rest.is_empty() => {
                Err(CommandError::Usage("track|untrack <id>"))
            }
            "track" => Ok(Command::Track(rest.to_string())),
            "untrack" => Ok(Command::Untrack(rest.to_string())),
            "pick" => match rest.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(Command::Pick(n)),
                _ => Err(CommandError::Usage("pick <result number>")),
            },
            "info" => rest
                .trim_start_matches('#')
                .parse::<u64>()
                .map(|id| Command::Info(MarkerId(id)))
                .map_err(|_| CommandError::Usage("info <marker>")),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Drive `session` until `quit` or ctrl-c. Everything runs on this task, so
/// a refresh always finishes before the next command or tick is looked at.
pub async fn run<A: TrackerApi>(mut session: Session<A, HeadlessMap>) -> std::io::Result<()> {
    let mut ticker = time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    log::info!(
        "Dashboard running, commands: refresh, loc, search, track, untrack, pick, info, status, \
         console, quit"
    );

    loop {
        let search_due = session.search_deadline();

        tokio::select! {
            _ = ticker.tick() => {
                session.tick().await;
            }
            _ = sleep_until(search_due) => {
                session.poll_search(std::time::Instant::now()).await;
                print_results(&session);
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        if !handle_line(&mut session, &line).await {
                            break;
                        }
                    }
                    None => {
                        log::info!("stdin closed, still refreshing until interrupted");
                        stdin_open = false;
                    }
                }
            }
            result = &mut shutdown => {
                result?;
                log::info!("Interrupted");
                break;
            }
        }
    }

    Ok(())
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(at) => time::sleep_until(time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

/// Returns false when the runner should stop.
async fn handle_line<A: TrackerApi>(session: &mut Session<A, HeadlessMap>, line: &str) -> bool {
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(CommandError::Empty) => return true,
        Err(e) => {
            println!("{}", e);
            return true;
        }
    };

    match command {
        Command::Refresh => session.manual_refresh(),
        Command::Location {
            latitude,
            longitude,
            altitude_m,
        } => {
            // Rejections already land in the console.
            let _ = session.set_location(latitude, longitude, altitude_m);
        }
        Command::Search(query) => session.search_input(&query, std::time::Instant::now()),
        Command::Track(id) => session.track(&id).await,
        Command::Untrack(id) => {
            if !session.untrack(&id) {
                println!("{} is not tracked", id);
            }
        }
        Command::Pick(n) => session.pick(n - 1).await,
        Command::Info(marker) => {
            if session.marker_clicked(&marker).is_some() {
                println!("{}", session.info_panel());
            } else {
                println!("no satellite behind marker {}", marker);
            }
        }
        Command::Status => print_status(session),
        Command::Console => {
            for line in session.console().lines() {
                println!("{}", console_line(line));
            }
        }
        Command::Quit => return false,
    }

    true
}

fn print_results<A: TrackerApi>(session: &Session<A, HeadlessMap>) {
    for (i, hit) in session.results().iter().enumerate() {
        println!("  {:>2}. {} ({})", i + 1, hit.name, hit.id);
    }
}

fn print_status<A: TrackerApi>(session: &Session<A, HeadlessMap>) {
    let state = session.refresh_state();
    match session.location() {
        Some(observer) => println!(
            "location {:.4}, {:.4} at {:.0} m",
            observer.latitude_deg, observer.longitude_deg, observer.altitude_m
        ),
        None => println!("location unknown"),
    }
    println!(
        "next refresh in {}s of {}s, {} refreshes so far",
        state.countdown_seconds_remaining,
        session.refresh_period(),
        session.refreshes()
    );

    let map = session.markers().map();
    if let Some((lat, lon)) = map.center() {
        println!("map centred on {:.3}, {:.3}", lat, lon);
    }
    for (id, spec) in map.markers() {
        println!(
            "  {} {} {} {:.3}, {:.3}",
            id, spec.kind, spec.label, spec.latitude, spec.longitude
        );
    }

    println!("{}", session.info_panel());
    if let Some(line) = session.console().last() {
        println!("last: {}", console_line(line));
    }
}

fn console_line(line: &ConsoleLine) -> String {
    format!(
        "{} [{}] {}",
        line.at.format("%H:%M:%S"),
        line.level,
        line.message
    )
}
