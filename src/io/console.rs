//! Line-oriented control of a running tour from stdin

use crate::services::tour::{TourCommand, TourHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Command(TourCommand),
    Quit,
}

/// Parse one console line. Returns `None` for blank or unknown input.
pub fn parse_command(line: &str) -> Option<ConsoleInput> {
    let mut words = line.split_whitespace();
    let verb = words.next()?.to_ascii_lowercase();

    let command = match verb.as_str() {
        "start" | "s" => TourCommand::Start,
        "next" | "n" => TourCommand::Next,
        "prev" | "p" => TourCommand::Prev,
        "exit" | "x" => TourCommand::Exit,
        "pause" => TourCommand::Pause,
        "continue" | "resume" | "c" => TourCommand::Continue,
        "advance" | "skip" | "a" => TourCommand::Advance,
        "touch" | "interact" => TourCommand::Interaction,
        "confirm" => TourCommand::ExitConfirmed,
        "cancel" => TourCommand::ExitCancelled,
        "activity" => TourCommand::Activity,
        "block" => {
            let action = words.next()?;
            let name = words.next()?.to_string();
            match action {
                "add" => TourCommand::BlockAdd(name),
                "remove" | "rm" => TourCommand::BlockRemove(name),
                "toggle" => {
                    let condition = match words.next() {
                        None => None,
                        Some("on") => Some(true),
                        Some("off") => Some(false),
                        Some(_) => return None,
                    };
                    TourCommand::BlockToggle(name, condition)
                }
                _ => return None,
            }
        }
        "unblock" => TourCommand::BlockRemove(words.next()?.to_string()),
        "quit" | "q" => return Some(ConsoleInput::Quit),
        _ => return None,
    };
    Some(ConsoleInput::Command(command))
}

/// Forward stdin commands to the tour until quit, EOF or shutdown
pub async fn run_console(handle: TourHandle, shutdown_tx: watch::Sender<bool>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shutdown_rx = shutdown_tx.subscribe();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "console_read_failed");
                        break;
                    }
                };
                match parse_command(&line) {
                    Some(ConsoleInput::Command(command)) => {
                        if !handle.send(command) {
                            break;
                        }
                    }
                    Some(ConsoleInput::Quit) => {
                        info!("console_quit");
                        let _ = shutdown_tx.send(true);
                        break;
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!(input = %line.trim(), "console_unknown_command"),
                }
            }
            _ = shutdown_rx.changed() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> TourCommand {
        match parse_command(line) {
            Some(ConsoleInput::Command(command)) => command,
            other => panic!("expected a command for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_navigation_commands() {
        assert_eq!(command("start"), TourCommand::Start);
        assert_eq!(command("  N "), TourCommand::Next);
        assert_eq!(command("prev"), TourCommand::Prev);
        assert_eq!(command("resume"), TourCommand::Continue);
        assert_eq!(command("touch"), TourCommand::Interaction);
        assert_eq!(command("skip"), TourCommand::Advance);
    }

    #[test]
    fn test_block_commands() {
        assert_eq!(command("block add video"), TourCommand::BlockAdd("video".into()));
        assert_eq!(command("block rm video"), TourCommand::BlockRemove("video".into()));
        assert_eq!(
            command("block toggle video"),
            TourCommand::BlockToggle("video".into(), None)
        );
        assert_eq!(
            command("block toggle video off"),
            TourCommand::BlockToggle("video".into(), Some(false))
        );
        assert_eq!(parse_command("block toggle video maybe"), None);
        assert_eq!(parse_command("block add"), None);
        assert_eq!(command("unblock video"), TourCommand::BlockRemove("video".into()));
    }

    #[test]
    fn test_quit_and_unknown() {
        assert_eq!(parse_command("q"), Some(ConsoleInput::Quit));
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("fly away"), None);
    }
}
