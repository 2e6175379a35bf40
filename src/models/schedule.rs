use std::fmt;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::services::schedule_utils;

/// Candidate placement interval, half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeSlot {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self { start, end }
    }

    /// # Panics
    ///
    /// Panics when the end falls outside chrono's range; the engine itself
    /// goes through [`TimeSlot::checked_with_duration`].
    pub fn with_duration(start: DateTime<FixedOffset>, minutes: i64) -> Self {
        Self {
            start,
            end: start + Duration::minutes(minutes),
        }
    }

    pub fn checked_with_duration(start: DateTime<FixedOffset>, minutes: i64) -> Option<Self> {
        let end = start.checked_add_signed(Duration::try_minutes(minutes)?)?;
        Some(Self { start, end })
    }

    pub fn duration_minutes(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_minutes()
    }

    pub fn overlaps(&self, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> bool {
        schedule_utils::overlaps(self.start, self.end, start, end)
    }

    pub fn checked_shifted(&self, minutes: i64) -> Option<Self> {
        let delta = Duration::try_minutes(minutes)?;
        Some(Self {
            start: self.start.checked_add_signed(delta)?,
            end: self.end.checked_add_signed(delta)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Fixed,
    Flexible,
    Unavailable,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Fixed => "fixed",
            ConstraintKind::Flexible => "flexible",
            ConstraintKind::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally imposed busy/free window such as a meeting or a blackout period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConstraint {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: ConstraintKind,
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub label: Option<String>,
}

impl ScheduleConstraint {
    pub fn new(
        kind: ConstraintKind,
        start_at: DateTime<FixedOffset>,
        end_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: None,
            kind,
            start_at,
            end_at,
            priority: None,
            label: None,
        }
    }

    pub fn unavailable(start_at: DateTime<FixedOffset>, end_at: DateTime<FixedOffset>) -> Self {
        Self::new(ConstraintKind::Unavailable, start_at, end_at)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn describe(&self) -> String {
        match (&self.label, &self.id) {
            (Some(label), _) => label.clone(),
            (None, Some(id)) => id.clone(),
            (None, None) => format!(
                "{} window {} - {}",
                self.kind,
                schedule_utils::format_datetime(self.start_at),
                schedule_utils::format_datetime(self.end_at)
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    pub task_id: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub confidence: f64,
}

impl ScheduledTask {
    pub fn new(task_id: impl Into<String>, slot: TimeSlot) -> Self {
        Self {
            task_id: task_id.into(),
            start_time: slot.start,
            end_time: slot.end,
            confidence: 0.0,
        }
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.start_time, self.end_time)
    }

    pub fn moved_to(&self, slot: TimeSlot) -> Self {
        Self {
            task_id: self.task_id.clone(),
            start_time: slot.start,
            end_time: slot.end,
            confidence: self.confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Overlap,
    ConstraintViolation,
    DependencyUnmet,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::Overlap => "overlap",
            ConflictKind::ConstraintViolation => "constraint_violation",
            ConflictKind::DependencyUnmet => "dependency_unmet",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub description: String,
    pub severity: ConflictSeverity,
    #[serde(default)]
    pub task_ids: Vec<String>,
    #[serde(default)]
    pub constraint_id: Option<String>,
}

impl ScheduleConflict {
    pub fn new(
        kind: ConflictKind,
        severity: ConflictSeverity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            severity,
            task_ids: Vec::new(),
            constraint_id: None,
        }
    }

    pub fn with_tasks<I, S>(mut self, task_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.task_ids.extend(task_ids.into_iter().map(Into::into));
        self
    }

    pub fn with_constraint(mut self, constraint_id: Option<String>) -> Self {
        self.constraint_id = constraint_id;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedSchedule {
    pub tasks: Vec<ScheduledTask>,
    pub score: f64,
    pub conflicts: Vec<ScheduleConflict>,
    #[serde(default)]
    pub unscheduled_task_ids: Vec<String>,
}

impl OptimizedSchedule {
    pub fn get(&self, task_id: &str) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|scheduled| scheduled.task_id == task_id)
    }

    pub fn conflicts_of(&self, kind: ConflictKind) -> impl Iterator<Item = &ScheduleConflict> {
        self.conflicts.iter().filter(move |conflict| conflict.kind == kind)
    }

    pub fn total_confidence(&self) -> f64 {
        self.tasks.iter().map(|scheduled| scheduled.confidence).sum()
    }

    /// Scheduled tasks ordered by start time, ties broken by id.
    pub fn by_start_time(&self) -> Vec<&ScheduledTask> {
        let mut ordered: Vec<&ScheduledTask> = self.tasks.iter().collect();
        ordered.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        ordered
    }
}
