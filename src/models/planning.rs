use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::schedule::ScheduleConstraint;
use crate::models::settings::UserSchedulePreferences;
use crate::models::task::{Task, MAX_PRIORITY, MIN_PRIORITY};

/// Everything one optimization call consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRequest {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub constraints: Vec<ScheduleConstraint>,
    #[serde(default)]
    pub preferences: UserSchedulePreferences,
    /// First instant a slot may start at. Defaults to the current time.
    #[serde(default)]
    pub planning_start: Option<DateTime<FixedOffset>>,
    /// Overrides the configured budget for this call only.
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
}

impl OptimizationRequest {
    pub fn new(
        tasks: Vec<Task>,
        constraints: Vec<ScheduleConstraint>,
        preferences: UserSchedulePreferences,
    ) -> Self {
        Self {
            tasks,
            constraints,
            preferences,
            planning_start: None,
            time_budget_ms: None,
        }
    }

    pub fn starting_at(mut self, planning_start: DateTime<FixedOffset>) -> Self {
        self.planning_start = Some(planning_start);
        self
    }

    pub fn with_time_budget_ms(mut self, time_budget_ms: u64) -> Self {
        self.time_budget_ms = Some(time_budget_ms);
        self
    }

    /// Caller-side input checks. The engine tolerates malformed input, this is
    /// for front-ends that want to reject it up front.
    pub fn validate(&self) -> AppResult<()> {
        self.preferences.validate()?;

        let mut seen = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(AppError::validation_with_details(
                    "duplicate task id",
                    json!({ "taskId": task.id }),
                ));
            }
            if task.duration_minutes <= 0 {
                return Err(AppError::validation_with_details(
                    "task duration must be positive",
                    json!({ "taskId": task.id, "durationMinutes": task.duration_minutes }),
                ));
            }
            if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&task.priority) {
                return Err(AppError::validation_with_details(
                    "task priority must be between 1 and 5",
                    json!({ "taskId": task.id, "priority": task.priority }),
                ));
            }
            if let Some(window) = task
                .preferred_windows
                .iter()
                .find(|window| window.end_at <= window.start_at)
            {
                return Err(AppError::validation_with_details(
                    "preferred window must end after it starts",
                    json!({
                        "taskId": task.id,
                        "startAt": window.start_at.to_rfc3339(),
                        "endAt": window.end_at.to_rfc3339(),
                    }),
                ));
            }
        }

        for constraint in &self.constraints {
            if constraint.end_at <= constraint.start_at {
                return Err(AppError::validation_with_details(
                    "constraint must end after it starts",
                    json!({
                        "constraint": constraint.describe(),
                        "startAt": constraint.start_at.to_rfc3339(),
                        "endAt": constraint.end_at.to_rfc3339(),
                    }),
                ));
            }
        }

        Ok(())
    }
}
