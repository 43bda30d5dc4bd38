use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, instrument};

use crate::clock::Clock;
use crate::config::CalendarConfig;
use crate::dialog::{CalendarDialog, ScheduleSeed};
use crate::grid::MonthGrid;
use crate::month::MonthStep;
use crate::navigator::{CommittedSelection, DayPick};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "open", "prev", "previous", "next", "today", "pick", "select", "time", "commit",
        "confirm", "cancel", "close", "reset", "show", "help",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open {
        date: Option<NaiveDate>,
        time: Option<String>,
    },
    Navigate(MonthStep),
    Today,
    Pick(u32),
    Time(String),
    Commit,
    Cancel,
    Reset,
    Show,
    Help,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let head = parts
            .next()
            .ok_or_else(|| anyhow!("empty command"))?
            .to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        let known = known_command_names();
        let name = expand_command_abbrev(&head, &known)
            .ok_or_else(|| anyhow!("unknown or ambiguous command: {head}"))?;

        let command = match name {
            "open" => parse_open(&args)?,
            "prev" | "previous" => Command::Navigate(MonthStep::Previous),
            "next" => Command::Navigate(MonthStep::Next),
            "today" => Command::Today,
            "pick" | "select" => {
                let raw = args
                    .first()
                    .ok_or_else(|| anyhow!("{name} needs a day number"))?;
                let day = raw
                    .parse::<u32>()
                    .with_context(|| format!("invalid day number: {raw}"))?;
                Command::Pick(day)
            }
            "time" => match args.first() {
                None => Command::Time(String::new()),
                Some(_) => {
                    let raw = args.join(" ");
                    let time = parse_clock_time(&raw)
                        .ok_or_else(|| anyhow!("invalid time: {raw} (expected HH:MM or h:mmam/pm)"))?;
                    Command::Time(time)
                }
            },
            "commit" | "confirm" => Command::Commit,
            "cancel" | "close" => Command::Cancel,
            "reset" => Command::Reset,
            "show" => Command::Show,
            "help" => Command::Help,
            other => return Err(anyhow!("command {other} has no handler")),
        };

        debug!(line, ?command, "parsed command");
        Ok(command)
    }
}

/// `open`, `open DATE`, `open TIME` or `open DATE TIME`.
fn parse_open(args: &[&str]) -> anyhow::Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Open {
            date: None,
            time: None,
        });
    };

    if let Ok(date) = NaiveDate::parse_from_str(first, "%Y-%m-%d") {
        let time = if args.len() > 1 {
            let raw = args[1..].join(" ");
            Some(parse_clock_time(&raw).ok_or_else(|| anyhow!("invalid time: {raw}"))?)
        } else {
            None
        };
        return Ok(Command::Open {
            date: Some(date),
            time,
        });
    }

    let raw = args.join(" ");
    let time = parse_clock_time(&raw)
        .ok_or_else(|| anyhow!("invalid open arguments: {raw} (expected [YYYY-MM-DD] [HH:MM])"))?;
    Ok(Command::Open {
        date: None,
        time: Some(time),
    })
}

/// Normalizes `15:23`, `3:23pm` or `3:23 PM` to `HH:MM`.
pub fn parse_clock_time(token: &str) -> Option<String> {
    let clock_re = Regex::new(r"(?i)^(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*(?P<ampm>[ap]m)?$").ok()?;
    let captures = clock_re.captures(token.trim())?;

    let raw_hour = captures.name("hour")?.as_str().parse::<u32>().ok()?;
    let minute = captures.name("minute")?.as_str().parse::<u32>().ok()?;
    if minute > 59 {
        return None;
    }

    let hour = if let Some(ampm) = captures.name("ampm") {
        if raw_hour == 0 || raw_hour > 12 {
            return None;
        }
        match (ampm.as_str().to_ascii_lowercase().as_str(), raw_hour) {
            ("am", 12) => 0,
            ("am", h) => h,
            ("pm", 12) => 12,
            ("pm", h) => h + 12,
            _ => return None,
        }
    } else {
        if raw_hour > 23 {
            return None;
        }
        raw_hour
    };

    Some(format!("{hour:02}:{minute:02}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    View(MonthGrid),
    Picked(DayPick),
    TimeSet(Option<String>),
    Committed(CommittedSelection),
    CommitUnavailable,
    Cancelled,
    DialogClosed,
    Help,
}

/// A calendar dialog driven by text commands.
#[derive(Debug)]
pub struct Session<C: Clock> {
    dialog: CalendarDialog,
    clock: C,
    default_time: Option<String>,
}

impl<C: Clock> Session<C> {
    pub fn new(cfg: &CalendarConfig, clock: C) -> Self {
        Self {
            dialog: CalendarDialog::new(cfg.week_start()),
            clock,
            default_time: cfg.default_time().map(str::to_string),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn dialog(&self) -> &CalendarDialog {
        &self.dialog
    }

    /// Opens the dialog. Without a seed time the configured default time is used.
    pub fn open(&mut self, mut seed: ScheduleSeed) -> Event {
        if seed.time.is_none() {
            seed.time = self.default_time.clone();
        }
        let today = self.clock.today();
        let grid = self.dialog.open(&seed, today).day_grid(today);
        Event::View(grid)
    }

    /// Parses and executes one line. Blank lines and `#` comments yield `None`.
    #[instrument(skip(self))]
    pub fn run_line(&mut self, line: &str) -> anyhow::Result<Option<Event>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        let command = trimmed.parse::<Command>()?;
        Ok(Some(self.execute(command)))
    }

    pub fn execute(&mut self, command: Command) -> Event {
        let today = self.clock.today();

        match command {
            Command::Open { date, time } => return self.open(ScheduleSeed { date, time }),
            Command::Help => return Event::Help,
            Command::Cancel => {
                if !self.dialog.is_open() {
                    return Event::DialogClosed;
                }
                self.dialog.cancel();
                return Event::Cancelled;
            }
            Command::Commit => {
                if !self.dialog.is_open() {
                    return Event::DialogClosed;
                }
                return match self.dialog.confirm() {
                    Some(selection) => Event::Committed(selection),
                    None => Event::CommitUnavailable,
                };
            }
            _ => {}
        }

        let Some(nav) = self.dialog.navigator_mut() else {
            debug!(?command, "command ignored; dialog closed");
            return Event::DialogClosed;
        };

        match command {
            Command::Navigate(step) => nav.navigate_month(step),
            Command::Today => nav.go_to_today(today),
            Command::Reset => nav.reset(),
            Command::Show => {}
            Command::Pick(day) => return Event::Picked(nav.select_day(day, today)),
            Command::Time(time) => {
                nav.set_time(&time);
                return Event::TimeSet(nav.selected_time().map(str::to_string));
            }
            Command::Open { .. } | Command::Help | Command::Cancel | Command::Commit => {}
        }

        Event::View(nav.day_grid(today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_commands_and_abbreviations() {
        assert_eq!(
            "ne".parse::<Command>().expect("parse"),
            Command::Navigate(MonthStep::Next)
        );
        assert_eq!(
            "PREV".parse::<Command>().expect("parse"),
            Command::Navigate(MonthStep::Previous)
        );
        assert_eq!("pick 15".parse::<Command>().expect("parse"), Command::Pick(15));
        assert_eq!(
            "time 3:30 pm".parse::<Command>().expect("parse"),
            Command::Time("15:30".to_string())
        );
        assert_eq!(
            "open 2024-12-23 17:00".parse::<Command>().expect("parse"),
            Command::Open {
                date: Some(date(2024, 12, 23)),
                time: Some("17:00".to_string())
            }
        );
        assert!("p".parse::<Command>().is_err());
        assert!("pick".parse::<Command>().is_err());
        assert!("time 25:00".parse::<Command>().is_err());
        assert!("fees".parse::<Command>().is_err());
    }

    #[test]
    fn open_accepts_time_without_date() {
        assert_eq!(
            "open 17:00".parse::<Command>().expect("parse"),
            Command::Open {
                date: None,
                time: Some("17:00".to_string())
            }
        );
        assert_eq!(
            "open 5:00 pm".parse::<Command>().expect("parse"),
            Command::Open {
                date: None,
                time: Some("17:00".to_string())
            }
        );
        assert_eq!(
            "open".parse::<Command>().expect("parse"),
            Command::Open { date: None, time: None }
        );
        assert!("open 2024-13-01".parse::<Command>().is_err());
        assert!("open 2024-12-23 later".parse::<Command>().is_err());
    }

    #[test]
    fn every_known_name_has_its_own_command() {
        for name in known_command_names() {
            let line = match name {
                "pick" | "select" => format!("{name} 1"),
                _ => name.to_string(),
            };
            let command = line
                .parse::<Command>()
                .unwrap_or_else(|err| panic!("{name} should parse: {err}"));
            assert_eq!(command == Command::Help, name == "help", "{name} -> {command:?}");
        }
    }

    #[test]
    fn clock_time_normalization() {
        assert_eq!(parse_clock_time("9:05"), Some("09:05".to_string()));
        assert_eq!(parse_clock_time("12:00am"), Some("00:00".to_string()));
        assert_eq!(parse_clock_time("12:15PM"), Some("12:15".to_string()));
        assert_eq!(parse_clock_time("13:00pm"), None);
        assert_eq!(parse_clock_time("10:60"), None);
        assert_eq!(parse_clock_time("noon"), None);
    }

    #[test]
    fn commands_on_closed_dialog_report_closed() {
        let clock = FixedClock::new(date(2025, 1, 1));
        let mut session = Session::new(&CalendarConfig::default(), clock);
        assert_eq!(session.execute(Command::Navigate(MonthStep::Next)), Event::DialogClosed);
        assert_eq!(session.execute(Command::Commit), Event::DialogClosed);
        assert_eq!(session.execute(Command::Cancel), Event::DialogClosed);
    }

    #[test]
    fn default_time_seeds_new_dialogs() {
        let cfg = CalendarConfig::parse("[policies]\ndefault_time = \"18:00\"\n").expect("parse config");
        let mut session = Session::new(&cfg, FixedClock::new(date(2025, 1, 1)));
        session.open(ScheduleSeed::default());
        let nav = session.dialog().navigator().expect("open dialog");
        assert_eq!(nav.selected_time(), Some("18:00"));
    }

    #[test]
    fn session_runs_script_lines() {
        let mut session = Session::new(&CalendarConfig::default(), FixedClock::new(date(2024, 12, 20)));
        for line in ["# reschedule", "open 2024-12-23", "", "next", "pick 15", "time 14:30"] {
            session.run_line(line).expect("run line");
        }
        let event = session.run_line("commit").expect("run line");
        assert_eq!(
            event,
            Some(Event::Committed(CommittedSelection {
                date: date(2025, 1, 15),
                time: "14:30".to_string()
            }))
        );
        assert!(!session.dialog().is_open());
    }
}
