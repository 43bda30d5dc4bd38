use std::io::{self, IsTerminal, Write};

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::commands::Event;
use crate::config::CalendarConfig;
use crate::grid::{CalendarDayCell, MonthGrid};
use crate::navigator::{CalendarNavigator, DayPick};

const CELL_WIDTH: usize = 4;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    json: bool,
}

impl Renderer {
    pub fn new(cfg: &CalendarConfig, json: bool) -> Self {
        Self {
            color: cfg.render.color && io::stdout().is_terminal(),
            json,
        }
    }

    pub fn plain() -> Self {
        Self {
            color: false,
            json: false,
        }
    }

    #[tracing::instrument(skip(self, out, event, navigator))]
    pub fn print_event<W: Write>(
        &self,
        out: &mut W,
        event: &Event,
        navigator: Option<&CalendarNavigator>,
    ) -> anyhow::Result<()> {
        if self.json {
            return self.print_event_json(out, event, navigator);
        }

        match event {
            Event::View(grid) => {
                self.write_month_grid(out, grid)?;
                if let Some(nav) = navigator {
                    write_footer(out, nav)?;
                }
            }
            Event::Picked(DayPick::Selected(date)) => {
                writeln!(out, "selected {}", date.format("%Y-%m-%d"))?
            }
            Event::Picked(DayPick::Past(date)) => writeln!(
                out,
                "{} is in the past; selection unchanged",
                date.format("%Y-%m-%d")
            )?,
            Event::Picked(DayPick::NotInMonth(day)) => {
                writeln!(out, "day {day} is not in the viewed month; selection unchanged")?
            }
            Event::TimeSet(Some(time)) => writeln!(out, "time {time}")?,
            Event::TimeSet(None) => writeln!(out, "time cleared")?,
            Event::Committed(selection) => writeln!(out, "committed {selection}")?,
            Event::CommitUnavailable => {
                writeln!(out, "commit unavailable: pick a day and a time first")?
            }
            Event::Cancelled => writeln!(out, "cancelled")?,
            Event::DialogClosed => writeln!(out, "dialog closed; use `open` first")?,
            Event::Help => write_help(out)?,
        }

        Ok(())
    }

    fn print_event_json<W: Write>(
        &self,
        out: &mut W,
        event: &Event,
        navigator: Option<&CalendarNavigator>,
    ) -> anyhow::Result<()> {
        #[derive(Serialize)]
        struct Envelope<T: Serialize> {
            event: &'static str,
            data: T,
        }

        fn emit<W: Write, T: Serialize>(out: &mut W, event: &'static str, data: T) -> anyhow::Result<()> {
            serde_json::to_writer(&mut *out, &Envelope { event, data })?;
            writeln!(out)?;
            Ok(())
        }

        match event {
            Event::View(grid) => emit(out, "view", grid.to_dto())?,
            Event::Picked(pick) => {
                let name = if pick.is_selected() { "picked" } else { "pick_ignored" };
                emit(out, name, navigator.map(CalendarNavigator::to_dto))?
            }
            Event::TimeSet(_) => emit(out, "time", navigator.map(CalendarNavigator::to_dto))?,
            Event::Committed(selection) => emit(out, "committed", selection.to_dto())?,
            Event::CommitUnavailable => emit(out, "commit_unavailable", navigator.map(CalendarNavigator::to_dto))?,
            Event::Cancelled => emit(out, "cancelled", ())?,
            Event::DialogClosed => emit(out, "dialog_closed", ())?,
            Event::Help => emit(out, "help", HELP_LINES)?,
        }

        Ok(())
    }

    pub fn write_month_grid<W: Write>(&self, out: &mut W, grid: &MonthGrid) -> anyhow::Result<()> {
        let row_width = CELL_WIDTH * 7;
        let title = grid.month.title();
        let pad = row_width.saturating_sub(UnicodeWidthStr::width(title.as_str())) / 2;
        writeln!(out, "{}{}", " ".repeat(pad), self.paint(&title, "1;36"))?;

        let labels = grid
            .week_start
            .labels()
            .iter()
            .map(|label| format!("{label:>3} "))
            .collect::<String>();
        writeln!(out, "{}", self.paint(labels.trim_end(), "33"))?;

        for week in grid.weeks() {
            let line = week.iter().map(|cell| self.format_cell(cell)).collect::<String>();
            writeln!(out, "{}", line.trim_end())?;
        }

        Ok(())
    }

    fn format_cell(&self, cell: &CalendarDayCell) -> String {
        let Some(day) = cell.day else {
            return " ".repeat(CELL_WIDTH);
        };

        if cell.is_selected {
            self.paint(&format!("[{day:>2}]"), "1;30;43")
        } else if cell.is_today {
            self.paint(&format!("<{day:>2}>"), "32")
        } else if cell.is_past {
            self.paint(&format!(" {day:>2} "), "2")
        } else {
            format!(" {day:>2} ")
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_footer<W: Write>(out: &mut W, nav: &CalendarNavigator) -> anyhow::Result<()> {
    let date = nav
        .selected_date()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    let time = nav.selected_time().unwrap_or("-");
    let commit = if nav.can_commit() { "ready" } else { "unavailable" };
    writeln!(out, "date {date}  time {time}  commit {commit}")?;
    Ok(())
}

const HELP_LINES: [&str; 10] = [
    "open [YYYY-MM-DD] [HH:MM]  open the calendar (seeded when editing)",
    "prev | next               move one month",
    "today                     show the current month",
    "pick <day>                select a day of the viewed month",
    "time <HH:MM|h:mmam>       set the time (no argument clears it)",
    "commit                    confirm date and time and close",
    "cancel                    close without changes",
    "reset                     clear the pick and return to the first month",
    "show                      redraw the month",
    "help                      this list",
];

fn write_help<W: Write>(out: &mut W) -> anyhow::Result<()> {
    for line in HELP_LINES {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
