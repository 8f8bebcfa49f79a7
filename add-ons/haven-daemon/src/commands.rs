//! Line commands read from stdin.

use haven_core::{HaltScoreSet, HavenError, MoodLevel, NudgeAction, Route, Settings};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  mood <great|good|neutral|struggling|crisis> [note...]
  hr <bpm> [unsynced]
  go <route>            back            finish
  say <transcript...>
  nudge <call|accept|decline>
  halt <hunger> <anger> <lonely> <tired> [follow]
  crisis [dismiss]
  set <nudges|biometric|hands_free|quiet> <on|off>
  set sponsor [number...]
  login  logout  status  help  quit";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Invalid(#[from] HavenError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    Nudges(bool),
    Biometric(bool),
    HandsFree(bool),
    Quiet(bool),
    Sponsor(Option<String>),
}

impl SettingChange {
    pub fn apply(&self, settings: &mut Settings) {
        match self {
            SettingChange::Nudges(on) => settings.vulnerability_nudges_enabled = *on,
            SettingChange::Biometric(on) => settings.biometric_alerts_enabled = *on,
            SettingChange::HandsFree(on) => settings.hands_free_enabled = *on,
            SettingChange::Quiet(on) => settings.quiet_mode = *on,
            SettingChange::Sponsor(number) => settings.sponsor_phone = number.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Mood { level: MoodLevel, note: String },
    HeartRate { bpm: u32, synced: bool },
    Go(Route),
    Back,
    Finish,
    Say(String),
    Nudge(NudgeAction),
    Halt { scores: HaltScoreSet, follow: bool },
    Crisis { dismiss: bool },
    Set(SettingChange),
    Login,
    Logout,
    Status,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let command = match head.to_lowercase().as_str() {
        "mood" => {
            let level = rest
                .first()
                .ok_or(CommandError::Usage("mood <level> [note...]"))?
                .parse::<MoodLevel>()?;
            Command::Mood {
                level,
                note: rest[1..].join(" "),
            }
        }
        "hr" => {
            let bpm = rest
                .first()
                .and_then(|s| s.parse::<u32>().ok())
                .ok_or(CommandError::Usage("hr <bpm> [unsynced]"))?;
            Command::HeartRate {
                bpm,
                synced: rest.get(1) != Some(&"unsynced"),
            }
        }
        "go" => Command::Go(
            rest.first()
                .ok_or(CommandError::Usage("go <route>"))?
                .parse::<Route>()?,
        ),
        "back" => Command::Back,
        "finish" => Command::Finish,
        "say" if !rest.is_empty() => Command::Say(rest.join(" ")),
        "say" => return Err(CommandError::Usage("say <transcript...>")),
        "nudge" => Command::Nudge(match rest.first().copied() {
            Some("call") => NudgeAction::CallSponsor,
            Some("accept") => NudgeAction::AcceptTool,
            Some("decline") => NudgeAction::Decline,
            _ => return Err(CommandError::Usage("nudge <call|accept|decline>")),
        }),
        "halt" => {
            const USAGE: &str = "halt <hunger> <anger> <lonely> <tired> [follow]";
            let values: Vec<u8> = rest
                .iter()
                .take(4)
                .map(|s| s.parse::<u8>().map_err(|_| CommandError::Usage(USAGE)))
                .collect::<Result<_, _>>()?;
            if values.len() != 4 {
                return Err(CommandError::Usage(USAGE));
            }
            Command::Halt {
                scores: HaltScoreSet::new(values[0], values[1], values[2], values[3])?,
                follow: rest.get(4) == Some(&"follow"),
            }
        }
        "crisis" => Command::Crisis {
            dismiss: rest.first() == Some(&"dismiss"),
        },
        "set" => Command::Set(parse_setting(&rest)?),
        "login" => Command::Login,
        "logout" => Command::Logout,
        "status" => Command::Status,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_setting(args: &[&str]) -> Result<SettingChange, CommandError> {
    const USAGE: &str = "set <nudges|biometric|hands_free|quiet> <on|off> | set sponsor [number...]";
    let key = args.first().ok_or(CommandError::Usage(USAGE))?;
    if *key == "sponsor" {
        let number = args[1..].join(" ");
        return Ok(SettingChange::Sponsor(
            (!number.trim().is_empty()).then_some(number),
        ));
    }
    let on = match args.get(1).copied() {
        Some("on") | Some("true") => true,
        Some("off") | Some("false") => false,
        _ => return Err(CommandError::Usage(USAGE)),
    };
    match *key {
        "nudges" => Ok(SettingChange::Nudges(on)),
        "biometric" => Ok(SettingChange::Biometric(on)),
        "hands_free" => Ok(SettingChange::HandsFree(on)),
        "quiet" => Ok(SettingChange::Quiet(on)),
        _ => Err(CommandError::Usage(USAGE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(
            parse("mood Struggling long day at work").unwrap(),
            Some(Command::Mood {
                level: MoodLevel::Struggling,
                note: "long day at work".to_string()
            })
        );
        assert_eq!(
            parse("hr 130 unsynced").unwrap(),
            Some(Command::HeartRate {
                bpm: 130,
                synced: false
            })
        );
        assert_eq!(parse("go urge-surfing").unwrap(), Some(Command::Go(Route::UrgeSurfing)));
        assert_eq!(
            parse("nudge accept").unwrap(),
            Some(Command::Nudge(NudgeAction::AcceptTool))
        );
        assert_eq!(parse("quit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_halt() {
        match parse("halt 9 8 9 9 follow").unwrap() {
            Some(Command::Halt { scores, follow }) => {
                assert_eq!(scores.anger, 8);
                assert!(follow);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(parse("halt 9 8"), Err(CommandError::Usage(_))));
        assert!(matches!(parse("halt 11 1 1 1"), Err(CommandError::Invalid(_))));
    }

    #[test]
    fn test_parse_settings() {
        assert_eq!(
            parse("set hands_free on").unwrap(),
            Some(Command::Set(SettingChange::HandsFree(true)))
        );
        assert_eq!(
            parse("set sponsor 555 0100").unwrap(),
            Some(Command::Set(SettingChange::Sponsor(Some("555 0100".to_string()))))
        );
        assert_eq!(
            parse("set sponsor").unwrap(),
            Some(Command::Set(SettingChange::Sponsor(None)))
        );
        assert!(parse("set quiet maybe").is_err());

        let mut settings = Settings::default();
        SettingChange::Quiet(true).apply(&mut settings);
        assert!(settings.quiet_mode);
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(parse("dance"), Err(CommandError::Unknown(_))));
        assert!(matches!(parse("go nowhere"), Err(CommandError::Invalid(_))));
    }
}
