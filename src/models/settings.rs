use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};

pub const DEFAULT_WORK_START_HOUR: u32 = 9;
pub const DEFAULT_WORK_END_HOUR: u32 = 17;
pub const DEFAULT_BREAK_MINUTES: i64 = 15;
pub const DEFAULT_MAX_WORK_HOURS_PER_DAY: u32 = 8;

pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 7;
pub const DEFAULT_SLOT_GRANULARITY_MINUTES: i64 = 30;
pub const DEFAULT_TIME_BUDGET_MS: u64 = 5000;
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;
pub const DEFAULT_REPAIR_THRESHOLD_MS: u64 = 2000;
pub const DEFAULT_REPAIR_STEP_MINUTES: i64 = 30;
pub const DEFAULT_FIXED_PRIORITY_THRESHOLD: u8 = 5;

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// The user's working pattern. Hours are interpreted in the offset of the
/// planning start instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSchedulePreferences {
    pub work_start_hour: u32,
    pub work_end_hour: u32,
    /// Empty means every day is a work day.
    pub preferred_work_days: Vec<Weekday>,
    /// Minutes; carried for callers, the overlap test does not pad with it.
    pub break_duration: i64,
    pub max_work_hours_per_day: u32,
}

impl Default for UserSchedulePreferences {
    fn default() -> Self {
        Self {
            work_start_hour: DEFAULT_WORK_START_HOUR,
            work_end_hour: DEFAULT_WORK_END_HOUR,
            preferred_work_days: ALL_WEEKDAYS.to_vec(),
            break_duration: DEFAULT_BREAK_MINUTES,
            max_work_hours_per_day: DEFAULT_MAX_WORK_HOURS_PER_DAY,
        }
    }
}

impl UserSchedulePreferences {
    pub fn with_work_hours(mut self, start_hour: u32, end_hour: u32) -> Self {
        self.work_start_hour = start_hour;
        self.work_end_hour = end_hour;
        self
    }

    pub fn is_work_day(&self, weekday: Weekday) -> bool {
        self.preferred_work_days.is_empty() || self.preferred_work_days.contains(&weekday)
    }

    pub fn max_work_minutes_per_day(&self) -> i64 {
        i64::from(self.max_work_hours_per_day) * 60
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.work_end_hour > 24 {
            return Err(AppError::validation("work end hour must be at most 24"));
        }
        if self.work_start_hour >= self.work_end_hour {
            return Err(AppError::validation(
                "work start hour must be earlier than work end hour",
            ));
        }
        if self.break_duration < 0 {
            return Err(AppError::validation("break duration must not be negative"));
        }
        Ok(())
    }
}

/// Tuning knobs for the optimization pipeline. Passed explicitly into every
/// stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizerConfig {
    pub lookahead_days: u32,
    pub slot_granularity_minutes: i64,
    pub time_budget_ms: u64,
    pub max_iterations: u32,
    /// Repair only runs when more than this much budget remains.
    pub repair_threshold_ms: u64,
    pub repair_step_minutes: i64,
    /// `fixed` constraints block placement only above this priority.
    pub fixed_priority_threshold: u8,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            slot_granularity_minutes: DEFAULT_SLOT_GRANULARITY_MINUTES,
            time_budget_ms: DEFAULT_TIME_BUDGET_MS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            repair_threshold_ms: DEFAULT_REPAIR_THRESHOLD_MS,
            repair_step_minutes: DEFAULT_REPAIR_STEP_MINUTES,
            fixed_priority_threshold: DEFAULT_FIXED_PRIORITY_THRESHOLD,
        }
    }
}

impl OptimizerConfig {
    pub fn from_json_str(raw: &str) -> AppResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> AppResult<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file, choosing YAML or JSON by extension.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        debug!(target: "app::config", path = %path.display(), is_yaml, "loading optimizer config");
        if is_yaml {
            Self::from_yaml_str(&raw)
        } else {
            Self::from_json_str(&raw)
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.lookahead_days == 0 {
            return Err(AppError::config("lookaheadDays must be at least 1"));
        }
        if self.slot_granularity_minutes <= 0 {
            return Err(AppError::config("slotGranularityMinutes must be positive"));
        }
        if self.repair_step_minutes <= 0 {
            return Err(AppError::config("repairStepMinutes must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub directives: Option<String>,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub log_dir: Option<PathBuf>,
}
