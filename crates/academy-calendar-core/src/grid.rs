use academy_calendar_shared::{
  DayCellDto,
  MonthGridDto,
  WeekStartDto
};
use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};
use serde::{
  Deserialize,
  Serialize
};

use crate::month::YearMonth;

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
  #[default]
  Sunday,
  Monday
}

impl WeekStart {
  /// Anything other than "monday" falls
  /// back to Sunday.
  pub fn from_name(raw: &str) -> Self {
    if raw
      .trim()
      .eq_ignore_ascii_case("monday")
    {
      WeekStart::Monday
    } else {
      WeekStart::Sunday
    }
  }

  pub fn weekday(self) -> Weekday {
    match self {
      | WeekStart::Sunday => Weekday::Sun,
      | WeekStart::Monday => Weekday::Mon
    }
  }

  /// Column of `day` in a week that
  /// starts on `self`.
  pub fn column_of(
    self,
    day: Weekday
  ) -> u32 {
    let day_idx =
      day.num_days_from_monday();
    let start_idx = self
      .weekday()
      .num_days_from_monday();
    (7 + day_idx - start_idx) % 7
  }

  pub fn labels(self) -> [&'static str; 7] {
    match self {
      | WeekStart::Sunday => {
        ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"]
      }
      | WeekStart::Monday => {
        ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"]
      }
    }
  }
}

impl From<WeekStart> for WeekStartDto {
  fn from(value: WeekStart) -> Self {
    match value {
      | WeekStart::Sunday => {
        WeekStartDto::Sunday
      }
      | WeekStart::Monday => {
        WeekStartDto::Monday
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub struct CalendarDayCell {
  pub day:         Option<u32>,
  pub is_past:     bool,
  pub is_today:    bool,
  pub is_selected: bool
}

impl CalendarDayCell {
  pub fn is_blank(&self) -> bool {
    self.day.is_none()
  }
}

/// Day cells of one month: leading blanks
/// up to the first weekday, then every day
/// in order. The last row is not padded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
  pub month:      YearMonth,
  pub week_start: WeekStart,
  pub cells:      Vec<CalendarDayCell>
}

impl MonthGrid {
  pub fn build(
    month: YearMonth,
    selected: Option<NaiveDate>,
    today: NaiveDate,
    week_start: WeekStart
  ) -> Self {
    let first = month.first_day();
    let leading = week_start
      .column_of(first.weekday());
    let days = month.days_in_month();

    let mut cells = Vec::with_capacity(
      (leading + days) as usize
    );
    cells.extend(
      (0..leading)
        .map(|_| CalendarDayCell::default())
    );

    for day in 1..=days {
      let Some(date) = month.date(day)
      else {
        continue;
      };
      cells.push(CalendarDayCell {
        day:         Some(day),
        is_past:     date < today,
        is_today:    date == today,
        is_selected: selected
          == Some(date)
      });
    }

    tracing::trace!(
      month = %month,
      leading,
      days,
      "built month grid"
    );

    Self {
      month,
      week_start,
      cells
    }
  }

  pub fn leading_blanks(&self) -> usize {
    self
      .cells
      .iter()
      .take_while(|cell| cell.is_blank())
      .count()
  }

  pub fn day_count(&self) -> usize {
    self
      .cells
      .iter()
      .filter(|cell| !cell.is_blank())
      .count()
  }

  pub fn weeks(
    &self
  ) -> impl Iterator<Item = &[CalendarDayCell]>
  {
    self.cells.chunks(7)
  }

  pub fn cell_for(
    &self,
    day: u32
  ) -> Option<&CalendarDayCell> {
    self
      .cells
      .iter()
      .find(|cell| cell.day == Some(day))
  }

  pub fn to_dto(&self) -> MonthGridDto {
    MonthGridDto {
      year:       self.month.year(),
      month:      self.month.month(),
      title:      self.month.title(),
      week_start: self.week_start.into(),
      cells:      self
        .cells
        .iter()
        .map(|cell| DayCellDto {
          day:         cell.day,
          is_past:     cell.is_past,
          is_today:    cell.is_today,
          is_selected: cell.is_selected
        })
        .collect()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn month(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m - 1)
      .expect("valid month")
  }

  #[test]
  fn sunday_start_leading_blanks_match_weekday() {
    // 2024-12-01 is a Sunday, 2025-01-01 a Wednesday.
    let dec = MonthGrid::build(
      month(2024, 12),
      None,
      date(2024, 12, 20),
      WeekStart::Sunday
    );
    assert_eq!(dec.leading_blanks(), 0);

    let jan = MonthGrid::build(
      month(2025, 1),
      None,
      date(2024, 12, 20),
      WeekStart::Sunday
    );
    assert_eq!(jan.leading_blanks(), 3);
    assert_eq!(jan.cells.len(), 3 + 31);
  }

  #[test]
  fn monday_start_shifts_blanks() {
    let dec = MonthGrid::build(
      month(2024, 12),
      None,
      date(2024, 12, 20),
      WeekStart::Monday
    );
    assert_eq!(dec.leading_blanks(), 6);

    let jan = MonthGrid::build(
      month(2025, 1),
      None,
      date(2024, 12, 20),
      WeekStart::Monday
    );
    assert_eq!(jan.leading_blanks(), 2);
  }

  #[test]
  fn day_count_matches_month_length() {
    let today = date(2020, 1, 1);
    for (y, m, expected) in [
      (2023, 2, 28),
      (2024, 2, 29),
      (2024, 4, 30),
      (2024, 12, 31)
    ] {
      let grid = MonthGrid::build(
        month(y, m),
        None,
        today,
        WeekStart::Sunday
      );
      assert_eq!(grid.day_count(), expected);
    }
  }

  #[test]
  fn flags_follow_today_and_selection() {
    let grid = MonthGrid::build(
      month(2024, 12),
      Some(date(2024, 12, 23)),
      date(2024, 12, 20),
      WeekStart::Sunday
    );

    let past = grid.cell_for(19).expect("day 19");
    assert!(past.is_past);
    assert!(!past.is_today);

    let today = grid.cell_for(20).expect("day 20");
    assert!(today.is_today);
    assert!(!today.is_past);

    let selected =
      grid.cell_for(23).expect("day 23");
    assert!(selected.is_selected);
    assert_eq!(
      grid
        .cells
        .iter()
        .filter(|cell| cell.is_selected)
        .count(),
      1
    );
  }

  #[test]
  fn selection_in_other_month_is_not_marked() {
    let grid = MonthGrid::build(
      month(2025, 1),
      Some(date(2024, 12, 15)),
      date(2024, 12, 1),
      WeekStart::Sunday
    );
    assert!(
      grid.cells.iter().all(|cell| !cell.is_selected)
    );
  }

  #[test]
  fn last_week_is_ragged() {
    // February 2026 starts on Sunday: 28 cells, exactly 4 rows.
    let feb = MonthGrid::build(
      month(2026, 2),
      None,
      date(2026, 1, 1),
      WeekStart::Sunday
    );
    assert_eq!(feb.weeks().count(), 4);

    let jan = MonthGrid::build(
      month(2025, 1),
      None,
      date(2025, 1, 1),
      WeekStart::Sunday
    );
    let rows = jan.weeks().collect::<Vec<_>>();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[4].len(), 6);
  }
}
