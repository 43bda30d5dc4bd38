use std::fmt;

use chrono::{
  Datelike,
  Duration,
  NaiveDate
};
use serde::Deserialize;

const MONTH_NAMES: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December"
];

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash
)]
pub enum MonthStep {
  Previous,
  Next
}

impl MonthStep {
  fn delta(self) -> i32 {
    match self {
      | MonthStep::Previous => -1,
      | MonthStep::Next => 1
    }
  }
}

/// A displayed calendar month with no day
/// component. `month0` is 0-11.
///
/// Every value is representable as a
/// `NaiveDate` on its first day; stepping
/// past chrono's supported range leaves
/// the month where it is. Deserializes
/// from a `YYYY-MM` string.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Deserialize,
)]
#[serde(try_from = "String")]
pub struct YearMonth {
  year:   i32,
  month0: u32
}

impl YearMonth {
  pub fn new(
    year: i32,
    month0: u32
  ) -> Option<Self> {
    if month0 > 11 {
      return None;
    }
    NaiveDate::from_ymd_opt(
      year,
      month0 + 1,
      1
    )?;
    NaiveDate::from_ymd_opt(
      year,
      month0 + 1,
      days_in(year, month0 + 1)?
    )?;
    Some(Self { year, month0 })
  }

  #[must_use]
  pub fn of(date: NaiveDate) -> Self {
    Self {
      year:   date.year(),
      month0: date.month0()
    }
  }

  pub fn year(self) -> i32 {
    self.year
  }

  pub fn month0(self) -> u32 {
    self.month0
  }

  /// 1-based month number.
  pub fn month(self) -> u32 {
    self.month0 + 1
  }

  #[must_use]
  pub fn step(
    self,
    step: MonthStep
  ) -> Self {
    self.shift(step.delta())
  }

  #[must_use]
  pub fn shift(
    self,
    months: i32
  ) -> Self {
    let total = i64::from(self.year)
      * 12
      + i64::from(self.month0)
      + i64::from(months);
    let year = total.div_euclid(12);
    let month0 =
      total.rem_euclid(12) as u32;

    i32::try_from(year)
      .ok()
      .and_then(|year| {
        Self::new(year, month0)
      })
      .unwrap_or(self)
  }

  pub fn first_day(self) -> NaiveDate {
    NaiveDate::from_ymd_opt(
      self.year,
      self.month(),
      1
    )
    .unwrap_or(NaiveDate::MIN)
  }

  pub fn last_day(self) -> NaiveDate {
    let first = self.first_day();
    let next = self.shift(1);
    if next == self {
      return NaiveDate::MAX;
    }
    next
      .first_day()
      .checked_sub_signed(
        Duration::days(1)
      )
      .unwrap_or(first)
  }

  pub fn days_in_month(self) -> u32 {
    self.last_day().day()
  }

  /// The date for `day` in this month,
  /// or `None` when the month has no
  /// such day.
  pub fn date(
    self,
    day: u32
  ) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
      self.year,
      self.month(),
      day
    )
  }

  pub fn name(self) -> &'static str {
    MONTH_NAMES[self.month0 as usize]
  }

  pub fn title(self) -> String {
    format!(
      "{} {}",
      self.name(),
      self.year
    )
  }

  /// Parses `YYYY-MM`.
  pub fn parse(
    raw: &str
  ) -> Option<Self> {
    let (year, month) =
      raw.trim().split_once('-')?;
    let year = year.parse::<i32>().ok()?;
    let month =
      month.parse::<u32>().ok()?;
    if month == 0 {
      return None;
    }
    Self::new(year, month - 1)
  }
}

impl TryFrom<String> for YearMonth {
  type Error = String;

  fn try_from(
    raw: String
  ) -> Result<Self, Self::Error> {
    Self::parse(&raw).ok_or_else(|| {
      format!(
        "invalid month `{raw}`, expected YYYY-MM"
      )
    })
  }
}

impl fmt::Display for YearMonth {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}",
      self.year,
      self.month()
    )
  }
}

fn days_in(
  year: i32,
  month: u32
) -> Option<u32> {
  (28..=31)
    .rev()
    .find(|day| {
      NaiveDate::from_ymd_opt(
        year, month, *day
      )
      .is_some()
    })
}
