use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Timelike};
use task_schedule_optimizer::services::constraint_repair;
use task_schedule_optimizer::services::planning_context::PlanningContext;
use task_schedule_optimizer::{
    ConflictKind, ManualClock, OptimizationRequest, OptimizedSchedule, OptimizerConfig,
    ScheduleConstraint, ScheduleOptimizer, ScheduledTask, Task, TimeSlot,
    UserSchedulePreferences,
};

fn at(day_offset: i64, hour: i64, minute: i64) -> DateTime<FixedOffset> {
    let base = FixedOffset::east_opt(2 * 3600)
        .expect("offset")
        .with_ymd_and_hms(2025, 5, 1, 0, 0, 0)
        .single()
        .expect("base day");
    base + Duration::days(day_offset) + Duration::hours(hour) + Duration::minutes(minute)
}

fn busy_backlog() -> Vec<Task> {
    (0..12)
        .map(|i| {
            let priority = (i % 5) as u8 + 1;
            let duration = 30 + (i as i64 % 4) * 30;
            let task = Task::new(format!("task-{i}"), format!("Backlog item {i}"), duration, priority);
            if i % 3 == 0 {
                task.with_due_at(at(2 + i as i64 / 3, 17, 0))
            } else {
                task
            }
        })
        .collect()
}

fn lunch_and_standups() -> Vec<ScheduleConstraint> {
    let mut constraints: Vec<ScheduleConstraint> = (0..5)
        .map(|day| {
            ScheduleConstraint::unavailable(at(day, 12, 0), at(day, 13, 0))
                .with_id(format!("lunch-{day}"))
        })
        .collect();
    constraints.push(
        ScheduleConstraint::unavailable(at(1, 9, 0), at(1, 11, 0))
            .with_id("dentist")
            .with_label("Dentist"),
    );
    constraints
}

fn optimizer() -> ScheduleOptimizer {
    ScheduleOptimizer::with_clock(OptimizerConfig::default(), Arc::new(ManualClock::new(0)))
}

fn assert_no_pairwise_overlap(schedule: &OptimizedSchedule) {
    for (i, a) in schedule.tasks.iter().enumerate() {
        for b in schedule.tasks.iter().skip(i + 1) {
            assert!(
                !(a.start_time < b.end_time && b.start_time < a.end_time),
                "{} overlaps {}",
                a.task_id,
                b.task_id
            );
        }
    }
}

#[test]
fn placements_stay_inside_work_hours_with_exact_durations() {
    let tasks = busy_backlog();
    let preferences = UserSchedulePreferences::default().with_work_hours(9, 17);
    let request = OptimizationRequest::new(tasks.clone(), lunch_and_standups(), preferences)
        .starting_at(at(0, 0, 0));

    let schedule = optimizer().optimize(&request);

    assert_eq!(schedule.tasks.len(), tasks.len());
    for scheduled in &schedule.tasks {
        let task = tasks
            .iter()
            .find(|task| task.id == scheduled.task_id)
            .expect("scheduled id comes from input");
        assert_eq!(
            scheduled.end_time - scheduled.start_time,
            Duration::minutes(task.duration_minutes)
        );
        assert!(scheduled.start_time.hour() >= 9);
        assert_eq!(scheduled.start_time.date_naive(), scheduled.end_time.date_naive());
        assert!(
            scheduled.end_time.hour() < 17
                || (scheduled.end_time.hour() == 17 && scheduled.end_time.minute() == 0)
        );
        assert!(scheduled.start_time >= at(0, 0, 0));
    }
    assert_no_pairwise_overlap(&schedule);
    assert_eq!(schedule.conflicts_of(ConflictKind::Overlap).count(), 0);
}

#[test]
fn local_search_never_lowers_the_greedy_score() {
    let request = OptimizationRequest::new(
        busy_backlog(),
        lunch_and_standups(),
        UserSchedulePreferences::default(),
    )
    .starting_at(at(0, 0, 0));

    let report = optimizer().optimize_with_report(&request);

    assert!(report.local_search.score >= report.greedy.score);
    assert!(report.local_search_iterations <= OptimizerConfig::default().max_iterations);
    assert!(report.repaired.is_some());
}

#[test]
fn confidences_are_bounded_and_score_is_non_negative() {
    let mut tasks = busy_backlog();
    tasks.push(
        Task::new("focus", "Deep work", 120, 5).with_preferred_window(at(0, 9, 0), at(0, 12, 0)),
    );
    let request =
        OptimizationRequest::new(tasks, lunch_and_standups(), UserSchedulePreferences::default())
            .starting_at(at(0, 0, 0));

    let schedule = optimizer().optimize(&request);

    assert!(schedule.score >= 0.0);
    for scheduled in &schedule.tasks {
        assert!((0.0..=1.0).contains(&scheduled.confidence), "{scheduled:?}");
    }
    assert!(schedule.get("focus").is_some());
}

#[test]
fn every_input_id_appears_at_most_once() {
    let mut tasks = busy_backlog();
    // Sorts ahead of the original task-0 by priority; the first occurrence still wins.
    tasks.push(Task::new("task-0", "Duplicate id", 120, 5));
    let request =
        OptimizationRequest::new(tasks.clone(), Vec::new(), UserSchedulePreferences::default())
            .starting_at(at(0, 0, 0));
    // Two seconds per clock read leaves too little budget for repair, so the
    // greedy and local-search placements reach the output untouched.
    let engine = ScheduleOptimizer::with_clock(
        OptimizerConfig::default(),
        Arc::new(ManualClock::ticking(2_000)),
    );

    let report = engine.optimize_with_report(&request);
    assert!(report.repaired.is_none());
    let schedule = report.result;

    let mut seen = HashSet::new();
    for scheduled in &schedule.tasks {
        assert!(seen.insert(scheduled.task_id.clone()), "{} placed twice", scheduled.task_id);
        let first = tasks
            .iter()
            .find(|task| task.id == scheduled.task_id)
            .expect("scheduled id comes from input");
        assert_eq!(
            scheduled.end_time - scheduled.start_time,
            Duration::minutes(first.duration_minutes),
            "{}",
            scheduled.task_id
        );
    }
    for id in &schedule.unscheduled_task_ids {
        assert!(seen.insert(id.clone()), "{id} both placed and unscheduled");
    }
    assert_eq!(seen.len(), 12);
    let original = schedule.get("task-0").expect("task-0 placed");
    assert_eq!(original.end_time - original.start_time, Duration::minutes(30));
}

#[test]
fn repair_clears_stale_placements_out_of_blackouts() {
    let tasks = vec![
        Task::new("a", "Status report", 60, 3),
        Task::new("b", "Code review", 30, 2),
    ];
    let constraints =
        vec![ScheduleConstraint::unavailable(at(0, 9, 0), at(0, 11, 0)).with_id("all-hands")];
    let preferences = UserSchedulePreferences::default();
    let config = OptimizerConfig::default();
    let ctx = PlanningContext::new(&tasks, &constraints, &preferences, &config, at(0, 0, 0));

    let stale = ctx.annotate(
        vec![
            ScheduledTask::new("a", TimeSlot::with_duration(at(0, 9, 0), 60)),
            ScheduledTask::new("b", TimeSlot::with_duration(at(0, 10, 0), 30)),
        ],
        Vec::new(),
    );
    assert!(stale.conflicts_of(ConflictKind::ConstraintViolation).count() >= 2);

    let repaired = constraint_repair::repair(&stale, &ctx);

    assert_eq!(repaired.tasks.len(), 2);
    for scheduled in &repaired.tasks {
        assert!(scheduled.start_time >= at(0, 11, 0), "{scheduled:?}");
    }
    assert_no_pairwise_overlap(&repaired);
    assert!(repaired.conflicts.is_empty(), "{:?}", repaired.conflicts);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_on_a_shared_engine_agree() {
    let engine = Arc::new(optimizer());
    let request = Arc::new(
        OptimizationRequest::new(
            busy_backlog(),
            lunch_and_standups(),
            UserSchedulePreferences::default(),
        )
        .starting_at(at(0, 0, 0)),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let request = Arc::clone(&request);
            tokio::task::spawn_blocking(move || engine.optimize(&request))
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.expect("optimizer task panicked"));
    }

    let first = &results[0];
    for other in &results[1..] {
        assert_eq!(other, first);
    }
}
