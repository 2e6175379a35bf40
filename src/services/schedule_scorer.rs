use crate::models::schedule::{ScheduleConflict, ScheduleConstraint, ScheduledTask};
use crate::models::task::Task;
use crate::services::slot_scorer;

const BASE_CONFIDENCE: f64 = 0.5;
const PREFERRED_WINDOW_CONFIDENCE: f64 = 0.3;
const CONSTRAINT_OVERLAP_PENALTY: f64 = 0.2;

const PER_TASK_REWARD: f64 = 10.0;
const PER_CONFLICT_PENALTY: f64 = 20.0;

/// Placement quality estimate in `[0, 1]`.
pub fn confidence(
    scheduled: &ScheduledTask,
    task: Option<&Task>,
    constraints: &[ScheduleConstraint],
) -> f64 {
    let slot = scheduled.slot();
    let mut confidence = BASE_CONFIDENCE;

    if task.map_or(false, |task| slot_scorer::in_preferred_window(&slot, task)) {
        confidence += PREFERRED_WINDOW_CONFIDENCE;
    }

    let overlapped = constraints
        .iter()
        .filter(|constraint| slot.overlaps(constraint.start_at, constraint.end_at))
        .count();
    confidence -= CONSTRAINT_OVERLAP_PENALTY * overlapped as f64;

    confidence.clamp(0.0, 1.0)
}

/// `10 * scheduled - 20 * conflicts + sum(confidence)`, floored at zero.
pub fn aggregate_score(tasks: &[ScheduledTask], conflicts: &[ScheduleConflict]) -> f64 {
    let confidence: f64 = tasks.iter().map(|scheduled| scheduled.confidence).sum();
    let raw = PER_TASK_REWARD * tasks.len() as f64 - PER_CONFLICT_PENALTY * conflicts.len() as f64
        + confidence;
    raw.max(0.0)
}
