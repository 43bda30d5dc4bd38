//! Month-grid date picker state.
//!
//! A [`CalendarNavigator`] owns the viewed month and the in-progress
//! date/time pick for one open calendar. Every transition is infallible;
//! the only rejection is a pick on a day before today, which leaves the
//! state untouched and reports [`DayPick::Past`].

use std::fmt;

use academy_calendar_shared::{
  NavigatorStateDto,
  SelectionDto
};
use chrono::NaiveDate;
use tracing::debug;

use crate::grid::{
  MonthGrid,
  WeekStart
};
use crate::month::{
  MonthStep,
  YearMonth
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CalendarViewState {
  viewed_month:  YearMonth,
  selected_date: Option<NaiveDate>,
  selected_time: Option<String>
}

/// Result of a day pick. Informational
/// only; a rejected pick is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPick {
  Selected(NaiveDate),
  Past(NaiveDate),
  NotInMonth(u32)
}

impl DayPick {
  pub fn is_selected(self) -> bool {
    matches!(self, DayPick::Selected(_))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedSelection {
  pub date: NaiveDate,
  pub time: String
}

impl CommittedSelection {
  pub fn to_dto(&self) -> SelectionDto {
    SelectionDto {
      date: self
        .date
        .format("%Y-%m-%d")
        .to_string(),
      time: self.time.clone()
    }
  }
}

impl fmt::Display for CommittedSelection {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{} {}",
      self.date.format("%Y-%m-%d"),
      self.time
    )
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarNavigator {
  state:      CalendarViewState,
  anchor:     YearMonth,
  week_start: WeekStart
}

impl CalendarNavigator {
  /// Opens on the month of `seed_date`, or
  /// of `today` when there is no seed. A
  /// seed is kept as the selection even if
  /// it already lies in the past.
  pub fn initialize(
    seed_date: Option<NaiveDate>,
    seed_time: Option<&str>,
    today: NaiveDate
  ) -> Self {
    let anchor = YearMonth::of(
      seed_date.unwrap_or(today)
    );
    debug!(
      anchor = %anchor,
      seed_date = ?seed_date,
      seed_time = ?seed_time,
      "calendar initialized"
    );
    Self {
      state: CalendarViewState {
        viewed_month:  anchor,
        selected_date: seed_date,
        selected_time: normalize_time(
          seed_time
        )
      },
      anchor,
      week_start: WeekStart::default()
    }
  }

  #[must_use]
  pub fn with_week_start(
    mut self,
    week_start: WeekStart
  ) -> Self {
    self.week_start = week_start;
    self
  }

  pub fn viewed_month(&self) -> YearMonth {
    self.state.viewed_month
  }

  pub fn selected_date(
    &self
  ) -> Option<NaiveDate> {
    self.state.selected_date
  }

  pub fn selected_time(
    &self
  ) -> Option<&str> {
    self.state.selected_time.as_deref()
  }

  pub fn week_start(&self) -> WeekStart {
    self.week_start
  }

  pub fn navigate_month(
    &mut self,
    step: MonthStep
  ) {
    let from = self.state.viewed_month;
    self.state.viewed_month =
      from.step(step);
    debug!(
      from = %from,
      to = %self.state.viewed_month,
      ?step,
      "navigated month"
    );
  }

  pub fn go_to_today(
    &mut self,
    today: NaiveDate
  ) {
    self.state.viewed_month =
      YearMonth::of(today);
    debug!(
      to = %self.state.viewed_month,
      "jumped to today's month"
    );
  }

  pub fn select_day(
    &mut self,
    day: u32,
    today: NaiveDate
  ) -> DayPick {
    let Some(candidate) =
      self.state.viewed_month.date(day)
    else {
      debug!(
        day,
        month = %self.state.viewed_month,
        "ignored pick outside month"
      );
      return DayPick::NotInMonth(day);
    };

    if candidate < today {
      debug!(
        %candidate,
        %today,
        "ignored pick on past day"
      );
      return DayPick::Past(candidate);
    }

    self.state.selected_date =
      Some(candidate);
    debug!(%candidate, "day selected");
    DayPick::Selected(candidate)
  }

  /// Stores the time as given. Input is
  /// expected to be `HH:MM` already; an
  /// empty string clears it.
  pub fn set_time(
    &mut self,
    time: &str
  ) {
    self.state.selected_time =
      normalize_time(Some(time));
    debug!(
      time = ?self.state.selected_time,
      "time set"
    );
  }

  pub fn can_commit(&self) -> bool {
    self.state.selected_date.is_some()
      && self.state.selected_time.is_some()
  }

  pub fn commit(
    &self
  ) -> Option<CommittedSelection> {
    let date = self.state.selected_date?;
    let time =
      self.state.selected_time.clone()?;
    Some(CommittedSelection { date, time })
  }

  /// Drops the pick and returns to the
  /// month the calendar opened on.
  pub fn reset(&mut self) {
    self.state = CalendarViewState {
      viewed_month:  self.anchor,
      selected_date: None,
      selected_time: None
    };
    debug!(anchor = %self.anchor, "calendar reset");
  }

  pub fn day_grid(
    &self,
    today: NaiveDate
  ) -> MonthGrid {
    MonthGrid::build(
      self.state.viewed_month,
      self.state.selected_date,
      today,
      self.week_start
    )
  }

  pub fn to_dto(
    &self
  ) -> NavigatorStateDto {
    NavigatorStateDto {
      viewed_month:  self
        .state
        .viewed_month
        .to_string(),
      selected_date: self
        .state
        .selected_date
        .map(|date| {
          date.format("%Y-%m-%d").to_string()
        }),
      selected_time: self
        .state
        .selected_time
        .clone(),
      can_commit:    self.can_commit()
    }
  }
}

fn normalize_time(
  raw: Option<&str>
) -> Option<String> {
  raw
    .map(str::trim)
    .filter(|time| !time.is_empty())
    .map(str::to_string)
}
