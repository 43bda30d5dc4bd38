use chrono::NaiveDate;
use tracing::info;

use crate::grid::WeekStart;
use crate::navigator::{
  CalendarNavigator,
  CommittedSelection
};

/// Existing schedule used to seed a
/// dialog when editing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleSeed {
  pub date: Option<NaiveDate>,
  pub time: Option<String>
}

/// Modal wrapper around a navigator. The
/// navigator only exists while the dialog
/// is open, so nothing picked survives a
/// cancel.
#[derive(Debug, Clone, Default)]
pub struct CalendarDialog {
  navigator:  Option<CalendarNavigator>,
  week_start: WeekStart
}

impl CalendarDialog {
  pub fn new(week_start: WeekStart) -> Self {
    Self {
      navigator: None,
      week_start
    }
  }

  pub fn is_open(&self) -> bool {
    self.navigator.is_some()
  }

  /// Opens a fresh navigator, replacing
  /// any that was already open.
  pub fn open(
    &mut self,
    seed: &ScheduleSeed,
    today: NaiveDate
  ) -> &mut CalendarNavigator {
    if self.navigator.is_some() {
      tracing::debug!(
        "reopening calendar dialog; \
         discarding previous state"
      );
    }
    info!(
      seed_date = ?seed.date,
      seed_time = ?seed.time,
      %today,
      "calendar dialog opened"
    );
    self.navigator.insert(
      CalendarNavigator::initialize(
        seed.date,
        seed.time.as_deref(),
        today
      )
      .with_week_start(self.week_start)
    )
  }

  pub fn navigator(
    &self
  ) -> Option<&CalendarNavigator> {
    self.navigator.as_ref()
  }

  pub fn navigator_mut(
    &mut self
  ) -> Option<&mut CalendarNavigator> {
    self.navigator.as_mut()
  }

  pub fn can_confirm(&self) -> bool {
    self
      .navigator
      .as_ref()
      .is_some_and(
        CalendarNavigator::can_commit
      )
  }

  /// Hands back the selection and closes.
  /// While the pick is incomplete this
  /// returns `None` and the dialog stays
  /// open.
  pub fn confirm(
    &mut self
  ) -> Option<CommittedSelection> {
    let selection = self
      .navigator
      .as_ref()
      .and_then(CalendarNavigator::commit)?;
    self.navigator = None;
    info!(%selection, "calendar selection committed");
    Some(selection)
  }

  pub fn cancel(&mut self) {
    if self.navigator.take().is_some() {
      info!("calendar dialog cancelled");
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

  #[test]
  fn confirm_requires_date_and_time() {
    let today = date(2025, 5, 1);
    let mut dialog = CalendarDialog::default();
    let nav = dialog.open(&ScheduleSeed::default(), today);
    let _ = nav.select_day(10, today);

    assert!(!dialog.can_confirm());
    assert_eq!(dialog.confirm(), None);
    assert!(dialog.is_open());

    dialog
      .navigator_mut()
      .expect("open dialog")
      .set_time("08:00");
    assert!(dialog.can_confirm());
    let selection =
      dialog.confirm().expect("committed selection");
    assert_eq!(selection.date, date(2025, 5, 10));
    assert_eq!(selection.time, "08:00");
    assert!(!dialog.is_open());
  }

  #[test]
  fn cancel_discards_everything() {
    let today = date(2025, 5, 1);
    let mut dialog = CalendarDialog::default();
    let nav = dialog.open(&ScheduleSeed::default(), today);
    let _ = nav.select_day(10, today);
    nav.set_time("08:00");

    dialog.cancel();
    assert!(!dialog.is_open());
    assert_eq!(dialog.confirm(), None);

    let reopened =
      dialog.open(&ScheduleSeed::default(), today);
    assert_eq!(reopened.selected_date(), None);
    assert_eq!(reopened.selected_time(), None);
  }

  #[test]
  fn dialog_applies_week_start() {
    let mut dialog =
      CalendarDialog::new(WeekStart::Monday);
    let nav = dialog
      .open(&ScheduleSeed::default(), date(2025, 1, 1));
    assert_eq!(nav.week_start(), WeekStart::Monday);
  }
}
