use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use task_schedule_optimizer::services::local_search;
use task_schedule_optimizer::services::planning_context::PlanningContext;
use task_schedule_optimizer::utils::clock::TimeBudget;
use task_schedule_optimizer::{
    optimize_schedule, ConflictKind, ConflictSeverity, ManualClock, OptimizationRequest,
    OptimizerConfig, ScheduleConstraint, ScheduleOptimizer, ScheduledTask, Task, TimeSlot,
    UserSchedulePreferences,
};

fn base_day() -> DateTime<FixedOffset> {
    let tz = FixedOffset::east_opt(0).expect("offset");
    tz.from_local_datetime(
        &NaiveDate::from_ymd_opt(2025, 5, 1)
            .expect("base date")
            .and_hms_opt(0, 0, 0)
            .expect("base time"),
    )
    .single()
    .expect("base day")
}

fn at(day_offset: i64, hour: i64, minute: i64) -> DateTime<FixedOffset> {
    base_day() + Duration::days(day_offset) + Duration::hours(hour) + Duration::minutes(minute)
}

fn deterministic_optimizer() -> ScheduleOptimizer {
    ScheduleOptimizer::with_clock(OptimizerConfig::default(), Arc::new(ManualClock::new(0)))
}

#[test]
fn priority_and_due_date_drive_initial_placement() {
    let tasks = vec![
        Task::new("C", "Archive old tickets", 90, 1),
        Task::new("B", "Reply to vendor", 30, 3),
        Task::new("A", "Ship hotfix", 60, 5).with_due_at(at(1, 17, 0)),
    ];
    let request = OptimizationRequest::new(
        tasks,
        Vec::new(),
        UserSchedulePreferences::default().with_work_hours(9, 17),
    )
    .starting_at(base_day());

    let schedule = deterministic_optimizer().optimize(&request);

    assert!(schedule.conflicts.is_empty(), "{:?}", schedule.conflicts);
    assert_eq!(schedule.tasks.len(), 3);

    let a = schedule.get("A").expect("A scheduled");
    let b = schedule.get("B").expect("B scheduled");
    let c = schedule.get("C").expect("C scheduled");
    assert_eq!(a.start_time, at(0, 9, 0));
    assert_eq!(a.end_time, at(0, 10, 0));
    assert!(a.start_time < b.start_time);
    assert!(a.start_time < c.start_time);
    assert!(schedule.score >= 30.0);
}

#[test]
fn blackout_days_push_task_to_first_free_day() {
    let blackout = ScheduleConstraint::unavailable(at(0, 9, 0), at(2, 17, 0))
        .with_id("offsite")
        .with_label("Company offsite");
    let request = OptimizationRequest::new(
        vec![Task::new("report", "Quarterly report", 60, 3)],
        vec![blackout],
        UserSchedulePreferences::default(),
    )
    .starting_at(base_day());

    let schedule = deterministic_optimizer().optimize(&request);

    let report = schedule.get("report").expect("report scheduled");
    assert_eq!(report.start_time.date_naive(), at(3, 0, 0).date_naive());
    assert_eq!(report.start_time, at(3, 9, 0));
    assert!(schedule.conflicts.is_empty());
}

#[test]
fn local_search_moves_high_priority_task_into_open_morning_slot() {
    let tasks = vec![
        Task::new("low", "Inbox zero", 60, 1),
        Task::new("high", "Design review", 60, 5).with_preferred_window(at(0, 9, 0), at(0, 10, 0)),
    ];
    let preferences = UserSchedulePreferences::default();
    let config = OptimizerConfig::default();
    let ctx = PlanningContext::new(&tasks, &[], &preferences, &config, base_day());

    let greedy_like = ctx.annotate(
        vec![
            ScheduledTask::new("low", TimeSlot::with_duration(at(0, 9, 0), 60)),
            ScheduledTask::new("high", TimeSlot::with_duration(at(0, 11, 0), 60)),
        ],
        Vec::new(),
    );

    let clock = ManualClock::new(0);
    let budget = TimeBudget::start(&clock, config.time_budget_ms);
    let outcome = local_search::improve(&greedy_like, &ctx, &budget);

    assert!(outcome.schedule.score > greedy_like.score);
    assert_eq!(
        outcome.schedule.get("high").expect("high").start_time,
        at(0, 9, 0)
    );
    assert!(outcome.schedule.conflicts.is_empty());
}

#[test]
fn dependency_violations_are_reported_not_fatal() {
    let tasks = vec![
        Task::new("deploy", "Deploy", 30, 5).with_dependency("test"),
        Task::new("test", "Run test suite", 60, 2),
    ];
    let request = OptimizationRequest::new(tasks, Vec::new(), UserSchedulePreferences::default())
        .starting_at(base_day());

    let schedule = deterministic_optimizer().optimize(&request);

    assert_eq!(schedule.tasks.len(), 2);
    let deploy = schedule.get("deploy").expect("deploy");
    let test = schedule.get("test").expect("test");
    // Priority wins the first morning slot; the lower-priority dependency lands after it.
    assert_eq!(deploy.start_time, at(0, 9, 0));
    assert!(test.start_time >= deploy.end_time);

    assert_eq!(schedule.conflicts.len(), 1, "{:?}", schedule.conflicts);
    let unmet: Vec<_> = schedule.conflicts_of(ConflictKind::DependencyUnmet).collect();
    assert_eq!(unmet.len(), 1);
    assert_eq!(unmet[0].severity, ConflictSeverity::Medium);
    assert_eq!(unmet[0].task_ids, vec!["deploy".to_string(), "test".to_string()]);
}

#[test]
fn schedule_serializes_to_camel_case_wire_format() {
    let request = OptimizationRequest::new(
        vec![Task::new("a", "Write", 30, 3)],
        Vec::new(),
        UserSchedulePreferences::default(),
    )
    .starting_at(base_day());
    let schedule = deterministic_optimizer().optimize(&request);

    let value = serde_json::to_value(&schedule).expect("serialize");
    assert_eq!(value["tasks"][0]["taskId"], "a");
    assert!(value["tasks"][0]["startTime"].is_string());
    assert!(value["tasks"][0]["confidence"].is_number());
    assert!(value["conflicts"].as_array().expect("conflicts").is_empty());
    assert!(value["score"].is_number());
}

#[test]
fn free_function_entry_point_places_tasks() {
    let tasks = vec![Task::new("a", "Plan week", 30, 4)];
    let schedule = optimize_schedule(&tasks, &[], &UserSchedulePreferences::default(), Some(500));
    assert_eq!(schedule.tasks.len(), 1);
    let placed = &schedule.tasks[0];
    assert_eq!(
        placed.end_time.signed_duration_since(placed.start_time),
        Duration::minutes(30)
    );
    assert!(schedule.conflicts.is_empty());
}
