use crate::config_sync::{ConfigMode, ConfigScreenEvent, ConfigScreenHandle, ConfigSnapshot, DraftEdit};
use crate::domain::FilterMode;
use crate::emergency::{CallPrompt, Dialer, ReadingAction, reading_action};
use crate::readings_sync::{ReadingsScreenEvent, ReadingsScreenHandle, ReadingsSnapshot, ReadingsView};
use crate::screen::ScreenClosed;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch::Receiver;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{info, instrument, warn};

/// One line typed on the console.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Config(ConfigScreenEvent),
    Readings(ReadingsScreenEvent),
    Call(i64),
    Status,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help' for the list of commands")]
    Unknown(String),
    #[error("'{command}' expects {expected}")]
    InvalidArgument { command: &'static str, expected: &'static str },
}

const HELP: &str = "\
config <id>          look up the configuration of a device
temp <value>         edit the temperature limit
interval <seconds>   edit the reading interval
tolerance on|off     toggle high tolerance
reason <text>        edit the high tolerance reason
submit | reset | delete
readings <id>        list the readings of a device
filter all|critical|toggle
refresh
call <reading id>    call emergency services for an over-limit reading
status               show both screens
quit";

impl Command {
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let line = line.trim();
        let (verb, argument) = line.split_once(' ').unwrap_or((line, ""));
        let argument = argument.trim();

        let command = match verb {
            // The identifier is passed on untouched, blank clears the field
            "config" => Command::Config(ConfigScreenEvent::IdentifierTyped(argument.to_string())),
            "temp" => Command::Config(ConfigScreenEvent::Edit(DraftEdit::TemperatureLimit(argument.to_string()))),
            "interval" => Command::Config(ConfigScreenEvent::Edit(DraftEdit::ReadingInterval(argument.to_string()))),
            "tolerance" => {
                let enabled = match argument {
                    "on" => true,
                    "off" => false,
                    _ => {
                        return Err(CommandError::InvalidArgument {
                            command: "tolerance",
                            expected: "on or off",
                        });
                    }
                };
                Command::Config(ConfigScreenEvent::Edit(DraftEdit::HighTolerance(enabled)))
            }
            "reason" => Command::Config(ConfigScreenEvent::Edit(DraftEdit::HighToleranceReason(argument.to_string()))),
            "submit" => Command::Config(ConfigScreenEvent::Submit),
            "reset" => Command::Config(ConfigScreenEvent::Reset),
            "delete" => Command::Config(ConfigScreenEvent::Delete),
            "readings" => Command::Readings(ReadingsScreenEvent::IdentifierTyped(argument.to_string())),
            "filter" => match argument {
                "all" => Command::Readings(ReadingsScreenEvent::Filter(FilterMode::All)),
                "critical" => Command::Readings(ReadingsScreenEvent::Filter(FilterMode::CriticalOnly)),
                "toggle" => Command::Readings(ReadingsScreenEvent::ToggleFilter),
                _ => {
                    return Err(CommandError::InvalidArgument {
                        command: "filter",
                        expected: "all, critical or toggle",
                    });
                }
            },
            "refresh" => Command::Readings(ReadingsScreenEvent::Refresh),
            "call" => match argument.parse() {
                Ok(reading_id) => Command::Call(reading_id),
                Err(_) => {
                    return Err(CommandError::InvalidArgument {
                        command: "call",
                        expected: "a reading id",
                    });
                }
            },
            "status" => Command::Status,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(verb.to_string())),
        };

        Ok(command)
    }
}

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    ScreenClosed(#[from] ScreenClosed),
}

/// Reads commands from stdin and forwards them to the screens until `quit` or end of input.
pub async fn run(
    config_screen: &ConfigScreenHandle,
    readings_screen: &ReadingsScreenHandle,
    dialer: &dyn Dialer,
    emergency_number: &str,
) -> Result<(), ConsoleError> {
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let mut prompt: Option<CallPrompt> = None;

    println!("{}", HELP);
    while let Some(line) = lines.next().await {
        let line = line?;

        // A pending call prompt swallows the next line
        if let Some(pending) = prompt.take() {
            if line.trim().eq_ignore_ascii_case("yes") {
                if let Err(e) = pending.confirm(dialer).await {
                    warn!("⚠️ Emergency call failed: {}", e);
                }
            } else {
                pending.dismiss();
            }
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Ok(Command::Config(event)) => config_screen.send(event).await?,
            Ok(Command::Readings(event)) => readings_screen.send(event).await?,
            Ok(Command::Call(reading_id)) => {
                prompt = call_prompt(&readings_screen.snapshot(), reading_id, emergency_number);
                if let Some(pending) = &prompt {
                    println!("{} [yes/no]", pending.message());
                }
            }
            Ok(Command::Status) => {
                println!("{}", config_status(&config_screen.snapshot()));
                println!("{}", readings_status(&readings_screen.snapshot()));
            }
            Ok(Command::Help) => println!("{}", HELP),
            Ok(Command::Quit) => break,
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

fn config_status(snapshot: &ConfigSnapshot) -> String {
    let device_id = snapshot.device_id.as_ref().map_or("-", |id| id.as_str());
    let draft = &snapshot.draft;
    let mode = match snapshot.mode {
        ConfigMode::NoDevice => "no device",
        ConfigMode::Checking => "checking",
        ConfigMode::EditingExisting => "editing",
        ConfigMode::CreatingNew => "new",
    };
    format!(
        "config {} {}{}: limit={} interval={}s tolerance={} reason={}",
        device_id,
        mode,
        if snapshot.saving { " (saving)" } else { "" },
        draft.temperature_limit,
        draft.reading_interval,
        draft.high_tolerance_enabled,
        draft.high_tolerance_reason
    )
}

fn readings_status(snapshot: &ReadingsSnapshot) -> String {
    let device_id = snapshot.device_id.as_ref().map_or("-", |id| id.as_str());
    let view = match &snapshot.view {
        ReadingsView::NoDevice => "no device".to_string(),
        ReadingsView::Loading => "loading".to_string(),
        ReadingsView::NotFound => "not found".to_string(),
        ReadingsView::Readings(readings) => format!("{} reading(s)", readings.len()),
    };
    format!("readings {} {:?}: {}", device_id, snapshot.filter, view)
}

fn call_prompt(snapshot: &ReadingsSnapshot, reading_id: i64, emergency_number: &str) -> Option<CallPrompt> {
    let Some(reading) = snapshot.readings().iter().find(|r| r.id == reading_id) else {
        println!("Reading #{} is not on screen", reading_id);
        return None;
    };

    match reading_action(reading, emergency_number) {
        ReadingAction::EmergencyCall(prompt) => Some(prompt),
        ReadingAction::Ok => {
            println!("Reading #{} is within its limit", reading_id);
            None
        }
    }
}

#[instrument(skip_all)]
pub async fn config_listener(mut rx: Receiver<ConfigSnapshot>) {
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        let draft = &snapshot.draft;
        info!(
            device_id = snapshot.device_id.as_ref().map(|id| id.as_str()).unwrap_or("-"),
            mode = ?snapshot.mode,
            saving = snapshot.saving,
            effective_limit = ?snapshot.record.as_ref().and_then(|r| r.effective_temperature_limit),
            "🛠️ limit={} interval={}s tolerance={} reason={}",
            draft.temperature_limit,
            draft.reading_interval,
            draft.high_tolerance_enabled,
            draft.high_tolerance_reason
        );
    }
}

#[instrument(skip_all)]
pub async fn readings_listener(mut rx: Receiver<ReadingsSnapshot>, emergency_number: String) {
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        let device_id = snapshot.device_id.as_ref().map(|id| id.as_str()).unwrap_or("-");
        match &snapshot.view {
            ReadingsView::NoDevice => info!("📋 No device selected"),
            ReadingsView::Loading => info!(device_id, filter = ?snapshot.filter, "📋 Loading readings..."),
            ReadingsView::NotFound => info!(device_id, filter = ?snapshot.filter, "📋 Device not found or no readings"),
            ReadingsView::Readings(readings) => {
                info!(device_id, filter = ?snapshot.filter, "📋 {} reading(s)", readings.len());
                for reading in readings {
                    let marker = match reading_action(reading, &emergency_number) {
                        ReadingAction::Ok => "ok".to_string(),
                        ReadingAction::EmergencyCall(prompt) => format!("🚨 call {}", prompt.number()),
                    };
                    info!(
                        "  #{} {} {:.1} °C (limit {:.1}) {}",
                        reading.id, reading.timestamp, reading.temperature, reading.temperature_limit, marker
                    );
                }
            }
        }
    }
}
