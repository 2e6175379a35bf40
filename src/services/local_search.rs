use std::fmt;

use tracing::{debug, trace};

use crate::models::schedule::{OptimizedSchedule, ScheduledTask, TimeSlot};
use crate::services::greedy_scheduler;
use crate::services::planning_context::PlanningContext;
use crate::utils::clock::TimeBudget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A full pass found no improving move.
    LocalOptimum,
    BudgetExhausted,
    IterationCap,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::LocalOptimum => "local_optimum",
            StopReason::BudgetExhausted => "budget_exhausted",
            StopReason::IterationCap => "iteration_cap",
        })
    }
}

#[derive(Debug, Clone)]
pub struct LocalSearchOutcome {
    pub schedule: OptimizedSchedule,
    pub iterations: u32,
    pub accepted_moves: u32,
    pub stop_reason: StopReason,
}

/// Iterative improvement over adjacent swaps and single-task relocations.
///
/// Every candidate is fully re-annotated before comparison and only strictly
/// better schedules are accepted, so the returned score is never below the
/// input's. The budget is polled once at the top of each iteration.
pub fn improve(
    initial: &OptimizedSchedule,
    ctx: &PlanningContext<'_>,
    budget: &TimeBudget<'_>,
) -> LocalSearchOutcome {
    let mut current = ctx.reannotate(initial);
    let mut iterations = 0;
    let mut accepted_moves = 0;

    let stop_reason = loop {
        if iterations >= ctx.config.max_iterations {
            break StopReason::IterationCap;
        }
        if budget.is_exhausted() {
            break StopReason::BudgetExhausted;
        }
        iterations += 1;

        let mut improved = false;

        let ordered_ids = ordered_task_ids(&current);
        for pair in ordered_ids.windows(2) {
            if let Some(candidate) = try_swap(&current, &pair[0], &pair[1], ctx) {
                if candidate.score > current.score {
                    trace!(
                        target: "optimizer::local_search",
                        first = %pair[0],
                        second = %pair[1],
                        from = current.score,
                        to = candidate.score,
                        "swap accepted"
                    );
                    current = candidate;
                    accepted_moves += 1;
                    improved = true;
                }
            }
        }

        for task_id in ordered_task_ids(&current) {
            if let Some(candidate) = try_relocate(&current, &task_id, ctx) {
                if candidate.score > current.score {
                    trace!(
                        target: "optimizer::local_search",
                        task_id = %task_id,
                        from = current.score,
                        to = candidate.score,
                        "relocation accepted"
                    );
                    current = candidate;
                    accepted_moves += 1;
                    improved = true;
                }
            }
        }

        if !improved {
            break StopReason::LocalOptimum;
        }
    };

    debug!(
        target: "optimizer::local_search",
        iterations,
        accepted_moves,
        score = current.score,
        %stop_reason,
        "local search finished"
    );

    LocalSearchOutcome {
        schedule: current,
        iterations,
        accepted_moves,
        stop_reason,
    }
}

fn ordered_task_ids(schedule: &OptimizedSchedule) -> Vec<String> {
    schedule
        .by_start_time()
        .into_iter()
        .map(|scheduled| scheduled.task_id.clone())
        .collect()
}

fn with_moves(
    schedule: &OptimizedSchedule,
    moves: &[(&str, TimeSlot)],
    ctx: &PlanningContext<'_>,
) -> OptimizedSchedule {
    let placements = schedule
        .tasks
        .iter()
        .map(|scheduled| {
            match moves
                .iter()
                .find(|(task_id, _)| *task_id == scheduled.task_id)
            {
                Some((_, slot)) => scheduled.moved_to(*slot),
                None => scheduled.clone(),
            }
        })
        .collect();
    ctx.annotate(placements, schedule.unscheduled_task_ids.clone())
}

/// Exchanges the start times of two tasks, each keeping its own duration.
fn try_swap(
    schedule: &OptimizedSchedule,
    first_id: &str,
    second_id: &str,
    ctx: &PlanningContext<'_>,
) -> Option<OptimizedSchedule> {
    let first = schedule.get(first_id)?;
    let second = schedule.get(second_id)?;

    let first_slot =
        TimeSlot::checked_with_duration(second.start_time, first.slot().duration_minutes())?;
    let second_slot =
        TimeSlot::checked_with_duration(first.start_time, second.slot().duration_minutes())?;

    if first_slot.overlaps(second_slot.start, second_slot.end) {
        return None;
    }
    let others: Vec<&ScheduledTask> = schedule
        .tasks
        .iter()
        .filter(|scheduled| scheduled.task_id != first_id && scheduled.task_id != second_id)
        .collect();
    if !is_placeable(&first_slot, &others, ctx) || !is_placeable(&second_slot, &others, ctx) {
        return None;
    }

    Some(with_moves(
        schedule,
        &[(first_id, first_slot), (second_id, second_slot)],
        ctx,
    ))
}

/// Moves one task to its best-scoring valid slot, scored against the task's
/// own data.
fn try_relocate(
    schedule: &OptimizedSchedule,
    task_id: &str,
    ctx: &PlanningContext<'_>,
) -> Option<OptimizedSchedule> {
    let scheduled = schedule.get(task_id)?;
    let task = ctx.task(task_id)?;
    let (slot, _) = greedy_scheduler::best_slot(task, ctx, &schedule.tasks, Some(task_id))?;
    if slot == scheduled.slot() {
        return None;
    }
    Some(with_moves(schedule, &[(task_id, slot)], ctx))
}

fn is_placeable(slot: &TimeSlot, others: &[&ScheduledTask], ctx: &PlanningContext<'_>) -> bool {
    ctx.slot_generator().fits_work_day(slot)
        && ctx
            .validator
            .is_slot_valid(slot, ctx.constraints, others.iter().copied())
}
