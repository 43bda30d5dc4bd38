use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use academy_calendar_core::config::CalendarConfig;
use academy_calendar_core::{Clock, Event, FixedClock, ScheduleSeed, Session, YearMonth};
use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use clap::Parser;
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "academy-calendar-replay",
    about = "Replays calendar scenarios and checks the expected state after each step"
)]
struct Args {
    #[arg(long, default_value = "crates/academy-calendar-replay/scenarios/reschedule_rollover.json")]
    scenario: Vec<PathBuf>,

    /// Calendar config applied to every scenario
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    today: NaiveDate,
    #[serde(default)]
    seed_date: Option<NaiveDate>,
    #[serde(default)]
    seed_time: Option<String>,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    command: String,
    #[serde(default)]
    today: Option<NaiveDate>,
    #[serde(default)]
    expect: Option<Expect>,
}

/// `selected_date` and `selected_time` distinguish "absent" (not checked)
/// from `null` (must be empty).
#[derive(Debug, Default, Deserialize)]
struct Expect {
    #[serde(default)]
    viewed_month: Option<YearMonth>,
    #[serde(default, deserialize_with = "present")]
    selected_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present")]
    selected_time: Option<Option<String>>,
    #[serde(default)]
    can_commit: Option<bool>,
    #[serde(default)]
    day_cells: Option<usize>,
    #[serde(default)]
    leading_blanks: Option<usize>,
    #[serde(default)]
    committed: Option<String>,
    #[serde(default)]
    picked: Option<bool>,
    #[serde(default)]
    open: Option<bool>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug)]
struct ScenarioReport {
    name: String,
    steps: usize,
    failures: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let cfg = CalendarConfig::load(args.config.as_deref())?;
    let scenarios = load_scenarios(&args.scenario)?;
    if scenarios.is_empty() {
        return Err(anyhow!("no scenarios loaded"));
    }

    let mut failed = 0usize;
    for scenario in &scenarios {
        info!(scenario = %scenario.name, "running scenario");
        let report = run_scenario(&cfg, scenario)
            .with_context(|| format!("scenario {} could not run", scenario.name))?;

        let status = if report.failures.is_empty() { "ok" } else { "FAILED" };
        println!("Scenario: {} ({} steps) {}", report.name, report.steps, status);
        for failure in &report.failures {
            println!("  {failure}");
        }
        if !report.failures.is_empty() {
            failed += 1;
        }
    }

    println!("\n{} of {} scenarios passed", scenarios.len() - failed, scenarios.len());
    if failed > 0 {
        return Err(anyhow!("{failed} scenario(s) failed"));
    }
    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("warn"))
        .map_err(|e| anyhow!("invalid log level: {e}"))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    Ok(())
}

fn load_scenarios(paths: &[PathBuf]) -> anyhow::Result<Vec<Scenario>> {
    let mut out = Vec::new();

    for path in paths {
        out.push(load_scenario(path)?);
    }

    Ok(out)
}

fn load_scenario(path: &Path) -> anyhow::Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse scenario {}", path.display()))
}

fn run_scenario(cfg: &CalendarConfig, scenario: &Scenario) -> anyhow::Result<ScenarioReport> {
    let mut session = Session::new(cfg, FixedClock::new(scenario.today));
    session.open(ScheduleSeed {
        date: scenario.seed_date,
        time: scenario.seed_time.clone(),
    });

    let mut failures = Vec::new();
    for (idx, step) in scenario.steps.iter().enumerate() {
        if let Some(today) = step.today {
            session.clock_mut().set_today(today);
        }

        let event = session
            .run_line(&step.command)
            .with_context(|| format!("step {} `{}` was rejected", idx + 1, step.command))?;
        debug!(step = idx + 1, command = %step.command, ?event, "step executed");

        if let Some(expect) = &step.expect {
            for problem in check_step(&session, event.as_ref(), expect) {
                warn!(scenario = %scenario.name, step = idx + 1, %problem, "expectation failed");
                failures.push(format!("step {} `{}`: {problem}", idx + 1, step.command));
            }
        }
    }

    Ok(ScenarioReport {
        name: scenario.name.clone(),
        steps: scenario.steps.len(),
        failures,
    })
}

fn check_step(session: &Session<FixedClock>, event: Option<&Event>, expect: &Expect) -> Vec<String> {
    let mut problems = Vec::new();
    let nav = session.dialog().navigator();

    if let Some(open) = expect.open
        && open != nav.is_some()
    {
        problems.push(format!("dialog open: expected {open}, got {}", nav.is_some()));
    }

    if let Some(picked) = expect.picked {
        let actual = matches!(event, Some(Event::Picked(pick)) if pick.is_selected());
        if actual != picked {
            problems.push(format!("picked: expected {picked}, got {actual}"));
        }
    }

    if let Some(committed) = &expect.committed {
        match event {
            Some(Event::Committed(selection)) if &selection.to_string() == committed => {}
            other => problems.push(format!("committed: expected {committed}, got {other:?}")),
        }
    }

    let wants_navigator = expect.viewed_month.is_some()
        || expect.selected_date.is_some()
        || expect.selected_time.is_some()
        || expect.can_commit.is_some()
        || expect.day_cells.is_some()
        || expect.leading_blanks.is_some();
    if !wants_navigator {
        return problems;
    }

    let Some(nav) = nav else {
        problems.push("dialog is closed".to_string());
        return problems;
    };

    if let Some(month) = expect.viewed_month
        && nav.viewed_month() != month
    {
        problems.push(format!("viewed_month: expected {month}, got {}", nav.viewed_month()));
    }
    if let Some(selected) = &expect.selected_date
        && nav.selected_date() != *selected
    {
        problems.push(format!("selected_date: expected {selected:?}, got {:?}", nav.selected_date()));
    }
    if let Some(time) = &expect.selected_time
        && nav.selected_time() != time.as_deref()
    {
        problems.push(format!("selected_time: expected {time:?}, got {:?}", nav.selected_time()));
    }
    if let Some(can_commit) = expect.can_commit
        && nav.can_commit() != can_commit
    {
        problems.push(format!("can_commit: expected {can_commit}, got {}", nav.can_commit()));
    }

    let grid = nav.day_grid(session.clock().today());
    if let Some(cells) = expect.day_cells
        && grid.day_count() != cells
    {
        problems.push(format!("day_cells: expected {cells}, got {}", grid.day_count()));
    }
    if let Some(blanks) = expect.leading_blanks
        && grid.leading_blanks() != blanks
    {
        problems.push(format!("leading_blanks: expected {blanks}, got {}", grid.leading_blanks()));
    }

    problems
}
