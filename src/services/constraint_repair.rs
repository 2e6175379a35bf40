use chrono::{DateTime, Datelike, FixedOffset};
use tracing::{debug, warn};

use crate::models::schedule::{OptimizedSchedule, ScheduledTask, TimeSlot};
use crate::services::planning_context::PlanningContext;
use crate::services::schedule_utils;
use crate::services::slot_generator::TimeSlotGenerator;

/// Best-effort forward sweep: walks placements in start order and nudges every
/// invalid one forward in fixed steps until it clears the constraints and the
/// tasks already repaired. Nudged slots never straddle two days; a slot that
/// would cross work end rolls over to the next work day's start. A task that
/// finds no room before the lookahead horizon keeps its original slot.
pub fn repair(schedule: &OptimizedSchedule, ctx: &PlanningContext<'_>) -> OptimizedSchedule {
    let generator = ctx.slot_generator();
    let mut repaired: Vec<ScheduledTask> = Vec::with_capacity(schedule.tasks.len());
    let mut moved = 0usize;
    let mut stuck = 0usize;

    for scheduled in schedule.by_start_time() {
        let current = scheduled.slot();
        let duration = ctx
            .task(&scheduled.task_id)
            .map(|task| task.duration_minutes)
            .unwrap_or_else(|| current.duration_minutes());
        let slot = TimeSlot::checked_with_duration(current.start, duration).unwrap_or(current);

        if is_clear(&slot, &repaired, ctx) {
            repaired.push(scheduled.moved_to(slot));
            continue;
        }

        match next_clear_slot(&slot, &repaired, &generator, ctx) {
            Some(next) => {
                debug!(
                    target: "optimizer::repair",
                    task_id = %scheduled.task_id,
                    from = %slot.start,
                    to = %next.start,
                    "task shifted"
                );
                moved += 1;
                repaired.push(scheduled.moved_to(next));
            }
            None => {
                warn!(
                    target: "optimizer::repair",
                    task_id = %scheduled.task_id,
                    "no conflict-free slot before the lookahead horizon"
                );
                stuck += 1;
                repaired.push(scheduled.clone());
            }
        }
    }

    debug!(target: "optimizer::repair", moved, stuck, "repair sweep finished");
    ctx.annotate(repaired, schedule.unscheduled_task_ids.clone())
}

fn is_clear(slot: &TimeSlot, repaired: &[ScheduledTask], ctx: &PlanningContext<'_>) -> bool {
    ctx.validator.is_slot_valid(slot, ctx.constraints, repaired)
}

fn next_clear_slot(
    slot: &TimeSlot,
    repaired: &[ScheduledTask],
    generator: &TimeSlotGenerator<'_>,
    ctx: &PlanningContext<'_>,
) -> Option<TimeSlot> {
    let duration = slot.duration_minutes();
    let step = ctx.config.repair_step_minutes.max(1);
    let horizon = generator.horizon_end()?;
    let mut candidate = slot.checked_shifted(step)?;

    while candidate.start < horizon {
        let (work_start, work_end) = generator.work_bounds(candidate.start)?;
        let weekday = work_start.date_naive().weekday();

        if !ctx.preferences.is_work_day(weekday) || candidate.end > work_end {
            let next_start = next_day_start(work_start, ctx)?;
            candidate = TimeSlot::checked_with_duration(next_start, duration)?;
            continue;
        }
        if candidate.start < work_start {
            candidate = TimeSlot::checked_with_duration(work_start, duration)?;
            continue;
        }
        if generator.fits_work_day(&candidate) && is_clear(&candidate, repaired, ctx) {
            return Some(candidate);
        }
        candidate = candidate.checked_shifted(step)?;
    }

    None
}

fn next_day_start(
    work_start: DateTime<FixedOffset>,
    ctx: &PlanningContext<'_>,
) -> Option<DateTime<FixedOffset>> {
    let next = work_start.date_naive().succ_opt()?;
    schedule_utils::at_hour(
        next,
        *ctx.planning_start.offset(),
        ctx.preferences.work_start_hour,
    )
}
