use academy_calendar_shared::ScheduleUpdateDto;
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::dialog::{
  CalendarDialog,
  ScheduleSeed
};
use crate::navigator::CommittedSelection;

/// Something that can be (re)scheduled
/// through a calendar dialog. Persisting
/// the applied selection is up to the
/// implementor.
pub trait ScheduleTarget {
  fn current_slot(&self) -> ScheduleSeed;

  fn apply_selection(
    &mut self,
    selection: &CommittedSelection
  );
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
  pub id:           Uuid,
  pub title:        String,
  pub scheduled_on: Option<NaiveDate>,
  pub scheduled_at: Option<String>
}

impl Assessment {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      id:           Uuid::new_v4(),
      title:        title.into(),
      scheduled_on: None,
      scheduled_at: None
    }
  }

  #[must_use]
  pub fn scheduled(
    mut self,
    date: NaiveDate,
    time: impl Into<String>
  ) -> Self {
    self.scheduled_on = Some(date);
    self.scheduled_at = Some(time.into());
    self
  }

  pub fn to_update_dto(
    &self
  ) -> Option<ScheduleUpdateDto> {
    Some(ScheduleUpdateDto {
      assessment_id: self.id,
      title:         self.title.clone(),
      date:          self
        .scheduled_on?
        .format("%Y-%m-%d")
        .to_string(),
      time:          self
        .scheduled_at
        .clone()?
    })
  }
}

impl ScheduleTarget for Assessment {
  fn current_slot(&self) -> ScheduleSeed {
    ScheduleSeed {
      date: self.scheduled_on,
      time: self.scheduled_at.clone()
    }
  }

  fn apply_selection(
    &mut self,
    selection: &CommittedSelection
  ) {
    info!(
      assessment = %self.id,
      title = %self.title,
      from = ?self.scheduled_on,
      to = %selection,
      "assessment rescheduled"
    );
    self.scheduled_on =
      Some(selection.date);
    self.scheduled_at =
      Some(selection.time.clone());
  }
}

/// Opens `dialog` seeded from the
/// target's current slot, or from today
/// when it has none.
pub fn open_reschedule<T, C>(
  dialog: &mut CalendarDialog,
  target: &T,
  clock: &C
) where
  T: ScheduleTarget + ?Sized,
  C: Clock + ?Sized
{
  let seed = target.current_slot();
  dialog.open(&seed, clock.today());
}

/// Confirms the dialog and applies the
/// selection to `target`. Returns `None`,
/// leaving the target alone, while the
/// selection is incomplete.
pub fn confirm_reschedule<T>(
  dialog: &mut CalendarDialog,
  target: &mut T
) -> Option<CommittedSelection>
where
  T: ScheduleTarget + ?Sized
{
  let selection = dialog.confirm()?;
  target.apply_selection(&selection);
  Some(selection)
}
