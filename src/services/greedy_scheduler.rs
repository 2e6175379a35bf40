use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{debug, warn};

use crate::models::schedule::{OptimizedSchedule, ScheduledTask, TimeSlot};
use crate::models::task::Task;
use crate::services::planning_context::PlanningContext;
use crate::services::slot_scorer;

/// Priority descending, then due date ascending with undated tasks last.
/// Input order breaks remaining ties.
pub fn order_tasks<'t>(tasks: impl IntoIterator<Item = &'t Task>) -> Vec<&'t Task> {
    let mut ordered: Vec<&Task> = tasks.into_iter().collect();
    ordered.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| compare_due(a, b))
    });
    ordered
}

fn compare_due(a: &Task, b: &Task) -> Ordering {
    match (a.due_at, b.due_at) {
        (Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Highest-scoring valid slot for `task` in the lookahead window; the earliest
/// one wins ties. `exclude` removes one task from the overlap set.
pub fn best_slot(
    task: &Task,
    ctx: &PlanningContext<'_>,
    existing: &[ScheduledTask],
    exclude: Option<&str>,
) -> Option<(TimeSlot, f64)> {
    let mut best: Option<(TimeSlot, f64)> = None;

    for slot in ctx.slot_generator().candidates(task.duration_minutes) {
        let others = existing
            .iter()
            .filter(|scheduled| Some(scheduled.task_id.as_str()) != exclude);
        if !ctx.validator.is_slot_valid(&slot, ctx.constraints, others) {
            continue;
        }
        let score = slot_scorer::score(&slot, task);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((slot, score)),
        }
    }

    best
}

/// Single-pass construction: each task, in priority order, takes its best
/// valid slot or is dropped and reported.
pub fn build_initial_schedule(ctx: &PlanningContext<'_>) -> OptimizedSchedule {
    let mut placements: Vec<ScheduledTask> = Vec::with_capacity(ctx.tasks.len());
    let mut unscheduled = Vec::new();
    for task in order_tasks(unique_in_input_order(ctx)) {
        match best_slot(task, ctx, &placements, None) {
            Some((slot, score)) => {
                debug!(
                    target: "optimizer::greedy",
                    task_id = %task.id,
                    start = %slot.start,
                    score,
                    "task placed"
                );
                placements.push(ScheduledTask::new(task.id.clone(), slot));
            }
            None => {
                warn!(
                    target: "optimizer::greedy",
                    task_id = %task.id,
                    duration_minutes = task.duration_minutes,
                    "no valid slot in lookahead window"
                );
                unscheduled.push(task.id.clone());
            }
        }
    }

    ctx.annotate(placements, unscheduled)
}

/// First occurrence of every id, in input order. Matches the task body the
/// context resolves for that id.
fn unique_in_input_order<'a>(ctx: &PlanningContext<'a>) -> Vec<&'a Task> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(ctx.tasks.len());
    for task in ctx.tasks {
        if seen.insert(task.id.as_str()) {
            unique.push(task);
        } else {
            warn!(target: "optimizer::greedy", task_id = %task.id, "duplicate task id ignored");
        }
    }
    unique
}
