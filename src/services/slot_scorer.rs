//! Heuristic desirability of placing a task in a slot. Higher is better.
//!
//! The score reads only the slot and the task. The work-hours bonus uses the
//! fixed conventional 9-17 band, not the user's configured hours, so
//! `score` takes no preferences argument; the configured hours already bound
//! which slots are generated.

use crate::models::schedule::TimeSlot;
use crate::models::task::Task;
use crate::services::schedule_utils;

const PREFERRED_WINDOW_BONUS: f64 = 20.0;
const WORK_HOURS_BONUS: f64 = 10.0;
const LUNCH_PENALTY: f64 = 5.0;
const OVERDUE_PENALTY: f64 = 20.0;
const DUE_SOON_HORIZON_DAYS: i64 = 10;

const CONVENTIONAL_WORK_HOURS: std::ops::Range<u32> = 9..17;
const LUNCH_HOURS: std::ops::Range<u32> = 12..13;

pub fn score(slot: &TimeSlot, task: &Task) -> f64 {
    let hour = schedule_utils::hour_of(slot.start);
    let mut total = 0.0;

    if in_preferred_window(slot, task) {
        total += PREFERRED_WINDOW_BONUS;
    }
    if CONVENTIONAL_WORK_HOURS.contains(&hour) {
        total += WORK_HOURS_BONUS;
    }
    if LUNCH_HOURS.contains(&hour) {
        total -= LUNCH_PENALTY;
    }
    if task.is_high_priority() {
        total += f64::from(24 - hour.min(24)) * 2.0;
    }

    if let Some(due) = task.due_at {
        if slot.end > due {
            total -= OVERDUE_PENALTY;
        } else {
            let days = schedule_utils::days_until(slot.start, due);
            if days > 0 {
                total += (DUE_SOON_HORIZON_DAYS - days).max(0) as f64;
            }
        }
    }

    total
}

pub fn in_preferred_window(slot: &TimeSlot, task: &Task) -> bool {
    task.preferred_windows
        .iter()
        .any(|window| slot.overlaps(window.start_at, window.end_at))
}
