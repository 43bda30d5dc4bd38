use serde::{
  Deserialize,
  Serialize
};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum WeekStartDto {
  Sunday,
  Monday
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct DayCellDto {
  pub day:         Option<u32>,
  #[serde(default)]
  pub is_past:     bool,
  #[serde(default)]
  pub is_today:    bool,
  #[serde(default)]
  pub is_selected: bool
}

/// One rendered month. `month` is 1-12;
/// `cells` starts with the leading
/// blanks and is not padded at the end.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct MonthGridDto {
  pub year:       i32,
  pub month:      u32,
  pub title:      String,
  pub week_start: WeekStartDto,
  pub cells:      Vec<DayCellDto>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct SelectionDto {
  pub date: String,
  pub time: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct NavigatorStateDto {
  pub viewed_month:  String,
  pub selected_date: Option<String>,
  pub selected_time: Option<String>,
  pub can_commit:    bool
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct ScheduleUpdateDto {
  pub assessment_id: Uuid,
  #[serde(default)]
  pub title:         String,
  pub date:          String,
  pub time:          String
}
