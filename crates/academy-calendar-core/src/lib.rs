pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod dialog;
pub mod grid;
pub mod month;
pub mod navigator;
pub mod render;
pub mod schedule;

use std::ffi::OsString;
use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};

pub use clock::{Clock, FixedClock, ZonedClock};
pub use commands::{Command, Event, Session};
pub use dialog::{CalendarDialog, ScheduleSeed};
pub use grid::{CalendarDayCell, MonthGrid, WeekStart};
pub use month::{MonthStep, YearMonth};
pub use navigator::{CalendarNavigator, CommittedSelection, DayPick};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting academy calendar"
    );

    let mut cfg = config::CalendarConfig::load(cli.config.as_deref())?;
    cfg.apply_overrides(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value)))
        .context("failed to apply --rc overrides")?;

    let clock: Box<dyn Clock> = match cli.today {
        Some(today) => {
            debug!(%today, "using pinned today");
            Box::new(FixedClock::new(today))
        }
        None => {
            let clock = ZonedClock::resolve(cfg.timezone.as_deref());
            debug!(timezone = %clock.timezone(), "using system clock");
            Box::new(clock)
        }
    };

    let renderer = render::Renderer::new(&cfg, cli.json);
    let mut session = Session::new(&cfg, clock);
    let mut out = io::stdout().lock();

    let opened = session.open(ScheduleSeed {
        date: cli.date,
        time: cli.time,
    });
    renderer.print_event(&mut out, &opened, session.dialog().navigator())?;

    if cli.commands.is_empty() {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.context("failed to read command from stdin")?;
            run_one(&mut session, &renderer, &mut out, &line)?;
        }
    } else {
        for line in &cli.commands {
            run_one(&mut session, &renderer, &mut out, line)?;
        }
    }

    out.flush()?;
    info!("done");
    Ok(())
}

fn run_one<C: Clock, W: Write>(
    session: &mut Session<C>,
    renderer: &render::Renderer,
    out: &mut W,
    line: &str,
) -> anyhow::Result<()> {
    match session.run_line(line) {
        Ok(Some(event)) => renderer.print_event(out, &event, session.dialog().navigator()),
        Ok(None) => Ok(()),
        Err(err) => {
            warn!(line, error = %err, "command rejected");
            writeln!(out, "error: {err:#}")?;
            Ok(())
        }
    }
}
