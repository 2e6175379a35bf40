use std::collections::{BTreeMap, HashSet};

use crate::models::schedule::{
    ConflictKind, ConflictSeverity, ConstraintKind, ScheduleConflict, ScheduledTask,
};
use crate::services::planning_context::PlanningContext;
use crate::services::schedule_utils;

/// Classifies every problem left in a set of placements. Never mutates the
/// placements; calling it twice yields the same conflicts.
pub fn detect_conflicts(
    tasks: &[ScheduledTask],
    unscheduled_task_ids: &[String],
    ctx: &PlanningContext<'_>,
) -> Vec<ScheduleConflict> {
    let mut conflicts = Vec::new();

    for task_id in unscheduled_task_ids {
        conflicts.push(unschedulable_conflict(task_id, ctx));
    }

    let mut ordered: Vec<&ScheduledTask> = tasks.iter().collect();
    ordered.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.task_id.cmp(&b.task_id))
    });

    for (idx, first) in ordered.iter().enumerate() {
        for second in &ordered[idx + 1..] {
            if schedule_utils::overlaps(
                first.start_time,
                first.end_time,
                second.start_time,
                second.end_time,
            ) {
                conflicts.push(
                    ScheduleConflict::new(
                        ConflictKind::Overlap,
                        ConflictSeverity::High,
                        format!(
                            "task {} [{} - {}] overlaps task {} [{} - {}]",
                            first.task_id,
                            schedule_utils::format_datetime(first.start_time),
                            schedule_utils::format_datetime(first.end_time),
                            second.task_id,
                            schedule_utils::format_datetime(second.start_time),
                            schedule_utils::format_datetime(second.end_time),
                        ),
                    )
                    .with_tasks([first.task_id.as_str(), second.task_id.as_str()]),
                );
            }
        }
    }

    for scheduled in &ordered {
        for constraint in ctx
            .constraints
            .iter()
            .filter(|constraint| constraint.kind == ConstraintKind::Unavailable)
        {
            if scheduled
                .slot()
                .overlaps(constraint.start_at, constraint.end_at)
            {
                conflicts.push(
                    ScheduleConflict::new(
                        ConflictKind::ConstraintViolation,
                        ConflictSeverity::High,
                        format!(
                            "task {} is scheduled during unavailable time ({})",
                            scheduled.task_id,
                            constraint.describe()
                        ),
                    )
                    .with_tasks([scheduled.task_id.as_str()])
                    .with_constraint(constraint.id.clone()),
                );
            }
        }
    }

    conflicts.extend(dependency_conflicts(&ordered, ctx));
    conflicts.extend(daily_capacity_conflicts(&ordered, ctx));

    // Stable: keeps detection order within one severity.
    conflicts.sort_by(|a, b| b.severity.cmp(&a.severity));
    conflicts
}

fn unschedulable_conflict(task_id: &str, ctx: &PlanningContext<'_>) -> ScheduleConflict {
    let title = ctx
        .task(task_id)
        .map(|task| task.title.as_str())
        .unwrap_or(task_id);
    ScheduleConflict::new(
        ConflictKind::ConstraintViolation,
        ConflictSeverity::High,
        format!(
            "task {} ({}) could not be placed within the {}-day lookahead window",
            task_id, title, ctx.config.lookahead_days
        ),
    )
    .with_tasks([task_id])
}

fn dependency_conflicts(
    ordered: &[&ScheduledTask],
    ctx: &PlanningContext<'_>,
) -> Vec<ScheduleConflict> {
    let mut conflicts = Vec::new();

    for scheduled in ordered {
        let Some(task) = ctx.task(&scheduled.task_id) else {
            continue;
        };
        let mut seen = HashSet::new();
        for dependency_id in &task.dependencies {
            // Ids outside the input set are treated as already satisfied.
            if dependency_id == &task.id
                || !ctx.contains_task(dependency_id)
                || !seen.insert(dependency_id.as_str())
            {
                continue;
            }

            match ordered
                .iter()
                .find(|candidate| &candidate.task_id == dependency_id)
            {
                Some(dependency) if dependency.end_time <= scheduled.start_time => {}
                Some(dependency) => conflicts.push(
                    ScheduleConflict::new(
                        ConflictKind::DependencyUnmet,
                        ConflictSeverity::Medium,
                        format!(
                            "task {} starts at {} before its dependency {} finishes at {}",
                            scheduled.task_id,
                            schedule_utils::format_datetime(scheduled.start_time),
                            dependency_id,
                            schedule_utils::format_datetime(dependency.end_time),
                        ),
                    )
                    .with_tasks([scheduled.task_id.as_str(), dependency_id.as_str()]),
                ),
                None => conflicts.push(
                    ScheduleConflict::new(
                        ConflictKind::DependencyUnmet,
                        ConflictSeverity::Medium,
                        format!(
                            "task {} depends on {}, which is not scheduled",
                            scheduled.task_id, dependency_id
                        ),
                    )
                    .with_tasks([scheduled.task_id.as_str(), dependency_id.as_str()]),
                ),
            }
        }
    }

    conflicts
}

fn daily_capacity_conflicts(
    ordered: &[&ScheduledTask],
    ctx: &PlanningContext<'_>,
) -> Vec<ScheduleConflict> {
    let limit = ctx.preferences.max_work_minutes_per_day();
    if limit <= 0 {
        return Vec::new();
    }

    let offset = *ctx.planning_start.offset();
    let mut day_totals: BTreeMap<_, (i64, Vec<&str>)> = BTreeMap::new();
    for scheduled in ordered {
        let day = scheduled.start_time.with_timezone(&offset).date_naive();
        let entry = day_totals.entry(day).or_insert_with(|| (0, Vec::new()));
        entry.0 += scheduled.slot().duration_minutes();
        entry.1.push(scheduled.task_id.as_str());
    }

    day_totals
        .into_iter()
        .filter(|(_, (minutes, _))| *minutes > limit)
        .map(|(day, (minutes, task_ids))| {
            ScheduleConflict::new(
                ConflictKind::ConstraintViolation,
                ConflictSeverity::Medium,
                format!(
                    "{} has {} scheduled minutes, above the daily limit of {} minutes",
                    day, minutes, limit
                ),
            )
            .with_tasks(task_ids)
        })
        .collect()
}
