use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
}

impl TimeWindow {
    pub fn new(start_at: DateTime<FixedOffset>, end_at: DateTime<FixedOffset>) -> Self {
        Self { start_at, end_at }
    }
}

/// A unit of work to place on the calendar. Read-only for the duration of one
/// optimization call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(alias = "duration")]
    pub duration_minutes: i64,
    /// 1 (lowest) to 5 (highest).
    pub priority: u8,
    #[serde(default)]
    pub due_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub preferred_windows: Vec<TimeWindow>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        duration_minutes: i64,
        priority: u8,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            duration_minutes,
            priority,
            due_at: None,
            preferred_windows: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_due_at(mut self, due_at: DateTime<FixedOffset>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    pub fn with_preferred_window(
        mut self,
        start_at: DateTime<FixedOffset>,
        end_at: DateTime<FixedOffset>,
    ) -> Self {
        self.preferred_windows.push(TimeWindow::new(start_at, end_at));
        self
    }

    pub fn with_dependency(mut self, task_id: impl Into<String>) -> Self {
        self.dependencies.push(task_id.into());
        self
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority >= 4
    }
}
