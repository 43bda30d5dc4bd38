use chrono::{
  NaiveDate,
  Utc
};
use chrono_tz::Tz;

pub const TIMEZONE_ENV_VAR: &str =
  "ACADEMY_CALENDAR_TZ";
const DEFAULT_TIMEZONE: &str = "UTC";

/// Source of "today". Everything that
/// compares against the current day takes
/// it from here so callers can pin it.
pub trait Clock {
  fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
  today: NaiveDate
}

impl FixedClock {
  pub fn new(today: NaiveDate) -> Self {
    Self { today }
  }

  pub fn set_today(
    &mut self,
    today: NaiveDate
  ) {
    tracing::debug!(%today, "fixed clock moved");
    self.today = today;
  }
}

impl Clock for FixedClock {
  fn today(&self) -> NaiveDate {
    self.today
  }
}

/// Wall clock read in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct ZonedClock {
  timezone: Tz
}

impl ZonedClock {
  pub fn new(timezone: Tz) -> Self {
    Self { timezone }
  }

  /// Resolves the timezone from the
  /// environment, then `configured`,
  /// then UTC.
  pub fn resolve(
    configured: Option<&str>
  ) -> Self {
    Self::new(resolve_timezone(
      configured
    ))
  }

  pub fn timezone(&self) -> Tz {
    self.timezone
  }
}

impl Clock for ZonedClock {
  fn today(&self) -> NaiveDate {
    Utc::now()
      .with_timezone(&self.timezone)
      .date_naive()
  }
}

impl<C: Clock + ?Sized> Clock for &C {
  fn today(&self) -> NaiveDate {
    (**self).today()
  }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
  fn today(&self) -> NaiveDate {
    (**self).today()
  }
}

pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  let from_env =
    std::env::var(TIMEZONE_ENV_VAR).ok();
  resolve_timezone_from(
    from_env.as_deref(),
    configured
  )
}

/// Environment value first, then the
/// configured id, then UTC. Invalid ids
/// are skipped with a warning.
fn resolve_timezone_from(
  from_env: Option<&str>,
  configured: Option<&str>
) -> Tz {
  if let Some(raw) = from_env
    && let Some(tz) =
      parse_timezone(raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "config")
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_TIMEZONE,
    "default"
  )
  .unwrap_or(chrono_tz::UTC)
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "resolved calendar timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::warn!(
        source,
        timezone = %trimmed,
        error = %err,
        "invalid timezone id; skipping"
      );
      None
    }
  }
}
