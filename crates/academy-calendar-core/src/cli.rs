use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::parse_clock_time;

/// Library target that `-v`/`-q` tune; other crates stay at `warn`.
pub const LOG_TARGET: &str = "academy_calendar_core";

/// A `--rc` override. The key is lowercased and loses any `rc.` prefix.
#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        let key = k.trim().to_ascii_lowercase();
        let key = key.strip_prefix("rc.").unwrap_or(&key);
        if key.is_empty() {
            return Err(anyhow!("empty config key in: {s}"));
        }
        Ok(Self {
            key: key.to_string(),
            value: v.trim().to_string(),
        })
    }
}

fn parse_date_arg(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow!("expected YYYY-MM-DD, got {s}: {e}"))
}

fn parse_time_arg(s: &str) -> anyhow::Result<String> {
    parse_clock_time(s).ok_or_else(|| anyhow!("expected HH:MM or h:mmam/pm, got: {s}"))
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "academy-calendar",
    version,
    about = "Month-grid scheduling calendar for academy assessments",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// Calendar config file (TOML)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// Pin "today" instead of reading the clock
    #[arg(long = "today", value_parser = parse_date_arg)]
    pub today: Option<NaiveDate>,

    /// Existing date when editing a schedule
    #[arg(long = "date", value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Existing time when editing a schedule
    #[arg(long = "time", value_parser = parse_time_arg)]
    pub time: Option<String>,

    /// Emit JSON lines instead of text
    #[arg(long = "json")]
    pub json: bool,

    /// Commands to run, e.g. `next "pick 15" "time 14:30" commit`; read from stdin when empty
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub commands: Vec<String>,
}

/// Filter used when `RUST_LOG` is unset, e.g. `warn,academy_calendar_core=debug` for `-vv`.
pub fn default_log_filter(verbose: u8, quiet: u8) -> String {
    let (base, level) = match (quiet, verbose) {
        (2.., _) => ("error", "error"),
        (1, _) => ("warn", "warn"),
        (0, 3..) => ("warn", "trace"),
        (0, 2) => ("warn", "debug"),
        (0, 1) => ("warn", "info"),
        (0, 0) => ("warn", "warn"),
    };
    format!("{base},{LOG_TARGET}={level}")
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_filter = default_log_filter(verbose, quiet);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_filter))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(verbose > 0)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seed_and_commands() {
        let cli = GlobalCli::parse_from([
            "academy-calendar",
            "--today",
            "2024-12-20",
            "--date",
            "2024-12-23",
            "--time",
            "5:00pm",
            "--rc",
            "week_start=monday",
            "next",
            "pick 15",
        ]);
        assert_eq!(cli.today, NaiveDate::from_ymd_opt(2024, 12, 20));
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2024, 12, 23));
        assert_eq!(cli.time.as_deref(), Some("17:00"));
        assert_eq!(cli.rc_overrides[0].key, "week_start");
        assert_eq!(cli.rc_overrides[0].value, "monday");
        assert_eq!(cli.commands, vec!["next".to_string(), "pick 15".to_string()]);
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(GlobalCli::try_parse_from(["academy-calendar", "--today", "20/12/2024"]).is_err());
        assert!("novalue".parse::<KeyVal>().is_err());
        assert!(" =monday".parse::<KeyVal>().is_err());
    }

    #[test]
    fn rc_keys_are_normalized() {
        let kv = "RC.Render.Color = off".parse::<KeyVal>().expect("parse override");
        assert_eq!(kv.key, "render.color");
        assert_eq!(kv.value, "off");
    }

    #[test]
    fn verbosity_only_raises_the_calendar_target() {
        assert_eq!(default_log_filter(0, 0), "warn,academy_calendar_core=warn");
        assert_eq!(default_log_filter(2, 0), "warn,academy_calendar_core=debug");
        assert_eq!(default_log_filter(5, 0), "warn,academy_calendar_core=trace");
        assert_eq!(default_log_filter(3, 2), "error,academy_calendar_core=error");
    }
}
