use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::commands::parse_clock_time;
use crate::grid::WeekStart;

pub const CONFIG_ENV_VAR: &str =
  "ACADEMY_CALENDAR_CONFIG";
const CONFIG_DIR_NAME: &str =
  "academy-calendar";
const CONFIG_FILE_NAME: &str =
  "calendar.toml";

fn default_version() -> u32 {
  1
}

fn default_week_start() -> String {
  "sunday".to_string()
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
  #[serde(default = "default_version")]
  pub version:  u32,
  #[serde(default)]
  pub timezone: Option<String>,
  #[serde(default)]
  pub policies: CalendarPolicies,
  #[serde(default)]
  pub render:   RenderConfig,
  #[serde(skip)]
  pub loaded_from: Option<PathBuf>
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarPolicies {
  #[serde(default = "default_week_start")]
  pub week_start:   String,
  #[serde(default)]
  pub default_time: String
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
  #[serde(default = "default_true")]
  pub color: bool
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      version:     default_version(),
      timezone:    None,
      policies:    CalendarPolicies::default(),
      render:      RenderConfig::default(),
      loaded_from: None
    }
  }
}

impl Default for CalendarPolicies {
  fn default() -> Self {
    Self {
      week_start:   default_week_start(),
      default_time: String::new()
    }
  }
}

impl Default for RenderConfig {
  fn default() -> Self {
    Self { color: true }
  }
}

impl CalendarConfig {
  /// Loads `explicit` if given (it must
  /// exist and parse), otherwise the path
  /// from the environment or the user
  /// config dir when present, otherwise
  /// defaults.
  #[tracing::instrument]
  pub fn load(
    explicit: Option<&Path>
  ) -> anyhow::Result<Self> {
    if let Some(path) = explicit {
      return Self::load_file(
        &expand_tilde(path)
      );
    }

    match resolve_config_path() {
      | Some(path) if path.exists() => {
        Self::load_file(&path)
      }
      | Some(path) => {
        debug!(
          file = %path.display(),
          "calendar config not found; using defaults"
        );
        Ok(Self::default())
      }
      | None => {
        warn!(
          "no calendar config location; \
           using defaults"
        );
        Ok(Self::default())
      }
    }
  }

  #[tracing::instrument]
  pub fn load_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let text = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut cfg = Self::parse(&text)
      .with_context(|| {
        format!(
          "failed to parse {}",
          path.display()
        )
      })?;
    cfg.loaded_from =
      Some(path.to_path_buf());
    info!(
      file = %path.display(),
      version = cfg.version,
      timezone = ?cfg.timezone,
      week_start = %cfg.policies.week_start,
      "loaded calendar config"
    );
    Ok(cfg)
  }

  pub fn parse(
    text: &str
  ) -> anyhow::Result<Self> {
    let mut cfg =
      toml::from_str::<Self>(text)?;
    cfg.sanitize();
    Ok(cfg)
  }

  /// Applies `key=value` overrides. Keys
  /// may carry an `rc.` prefix.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k);
      debug!(key = %key, value = %v, "applying override");
      match key {
        | "timezone" => {
          self.timezone = Some(v)
            .filter(|tz| {
              !tz.trim().is_empty()
            });
        }
        | "week_start"
        | "policies.week_start" => {
          self.policies.week_start = v;
        }
        | "default_time"
        | "policies.default_time" => {
          self.policies.default_time = v;
        }
        | "color" | "render.color" => {
          self.render.color =
            parse_bool(&v).ok_or_else(
              || {
                anyhow!(
                  "invalid color \
                   setting: {v}"
                )
              }
            )?;
        }
        | other => {
          return Err(anyhow!(
            "unknown config key: {other}"
          ));
        }
      }
    }
    self.sanitize();
    Ok(())
  }

  pub fn week_start(&self) -> WeekStart {
    WeekStart::from_name(
      &self.policies.week_start
    )
  }

  pub fn default_time(
    &self
  ) -> Option<&str> {
    Some(
      self.policies.default_time.trim()
    )
    .filter(|time| !time.is_empty())
  }

  fn sanitize(&mut self) {
    let week_start = self
      .policies
      .week_start
      .trim()
      .to_ascii_lowercase();
    if week_start != "sunday"
      && week_start != "monday"
    {
      warn!(
        week_start = %self.policies.week_start,
        "unsupported week_start; using sunday"
      );
      self.policies.week_start =
        default_week_start();
    } else {
      self.policies.week_start =
        week_start;
    }

    let default_time = self
      .policies
      .default_time
      .trim()
      .to_string();
    self.policies.default_time =
      if default_time.is_empty() {
        String::new()
      } else if let Some(time) =
        parse_clock_time(&default_time)
      {
        time
      } else {
        warn!(
          default_time = %default_time,
          "invalid default_time; ignoring"
        );
        String::new()
      };
  }
}

fn resolve_config_path()
-> Option<PathBuf> {
  let from_env =
    std::env::var(CONFIG_ENV_VAR).ok();
  config_path_from(
    from_env.as_deref(),
    dirs::config_dir()
  )
}

fn config_path_from(
  from_env: Option<&str>,
  config_dir: Option<PathBuf>
) -> Option<PathBuf> {
  if let Some(raw) = from_env {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(expand_tilde(
        Path::new(trimmed)
      ));
    }
  }

  config_dir.map(|dir| {
    dir
      .join(CONFIG_DIR_NAME)
      .join(CONFIG_FILE_NAME)
  })
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_document_uses_defaults() {
    let cfg = CalendarConfig::parse("")
      .expect("parse empty config");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.week_start(), WeekStart::Sunday);
    assert_eq!(cfg.default_time(), None);
    assert!(cfg.render.color);
  }

  #[test]
  fn sanitizes_bad_values() {
    let cfg = CalendarConfig::parse(
      r#"
        [policies]
        week_start = "friday"
        default_time = "25:99"
      "#
    )
    .expect("parse config");
    assert_eq!(cfg.policies.week_start, "sunday");
    assert_eq!(cfg.default_time(), None);
  }

  #[test]
  fn normalizes_default_time() {
    let cfg = CalendarConfig::parse(
      r#"
        timezone = "America/Mexico_City"
        [policies]
        week_start = "Monday"
        default_time = "4:05pm"
      "#
    )
    .expect("parse config");
    assert_eq!(cfg.week_start(), WeekStart::Monday);
    assert_eq!(cfg.default_time(), Some("16:05"));
    assert_eq!(cfg.timezone.as_deref(), Some("America/Mexico_City"));
  }

  #[test]
  fn environment_path_wins_over_config_dir() {
    let dir = PathBuf::from("/home/ana/.config");
    assert_eq!(
      config_path_from(
        Some("/srv/academy/calendar.toml"),
        Some(dir.clone())
      ),
      Some(PathBuf::from("/srv/academy/calendar.toml"))
    );
    assert_eq!(
      config_path_from(Some("  "), Some(dir.clone())),
      Some(dir.join("academy-calendar").join("calendar.toml"))
    );
    assert_eq!(config_path_from(None, None), None);
  }

  #[test]
  fn overrides_apply_and_reject_unknown_keys() {
    let mut cfg = CalendarConfig::default();
    cfg
      .apply_overrides([
        ("rc.week_start".to_string(), "monday".to_string()),
        ("color".to_string(), "off".to_string())
      ])
      .expect("apply overrides");
    assert_eq!(cfg.week_start(), WeekStart::Monday);
    assert!(!cfg.render.color);

    assert!(
      cfg
        .apply_overrides([(
          "fees.due_day".to_string(),
          "5".to_string()
        )])
        .is_err()
    );
    assert!(
      cfg
        .apply_overrides([(
          "color".to_string(),
          "purple".to_string()
        )])
        .is_err()
    );
  }
}
