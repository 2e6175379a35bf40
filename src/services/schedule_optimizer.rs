use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use tracing::{debug, info};

use crate::models::planning::OptimizationRequest;
use crate::models::schedule::{OptimizedSchedule, ScheduleConstraint};
use crate::models::settings::{OptimizerConfig, UserSchedulePreferences};
use crate::models::task::Task;
use crate::services::constraint_repair;
use crate::services::greedy_scheduler;
use crate::services::local_search::{self, StopReason};
use crate::services::planning_context::PlanningContext;
use crate::utils::clock::{MonotonicClock, SystemClock, TimeBudget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Greedy,
    LocalSearch,
    Repair,
    Score,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Greedy => "greedy",
            PipelineStage::LocalSearch => "local_search",
            PipelineStage::Repair => "repair",
            PipelineStage::Score => "score",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every intermediate schedule of one run, for callers that want to inspect
/// how each stage changed the result.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub greedy: OptimizedSchedule,
    pub local_search: OptimizedSchedule,
    pub local_search_iterations: u32,
    pub local_search_stop: StopReason,
    /// `None` when too little budget remained for the repair sweep.
    pub repaired: Option<OptimizedSchedule>,
    pub result: OptimizedSchedule,
    pub elapsed_ms: u64,
}

/// The configured engine. Holds no per-call state, so one instance can serve
/// concurrent calls from several threads.
#[derive(Clone)]
pub struct ScheduleOptimizer {
    config: OptimizerConfig,
    clock: Arc<dyn MonotonicClock>,
}

impl fmt::Debug for ScheduleOptimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleOptimizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ScheduleOptimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl ScheduleOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: OptimizerConfig, clock: Arc<dyn MonotonicClock>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn optimize(&self, request: &OptimizationRequest) -> OptimizedSchedule {
        self.optimize_with_report(request).result
    }

    /// Runs `Greedy -> LocalSearch -> (Repair) -> Score` strictly in order.
    /// Always ends in a fully annotated schedule, even when nothing could be
    /// placed.
    pub fn optimize_with_report(&self, request: &OptimizationRequest) -> PipelineReport {
        let planning_start = request.planning_start.unwrap_or_else(local_now);
        let budget_ms = request.time_budget_ms.unwrap_or(self.config.time_budget_ms);
        self.run(
            &request.tasks,
            &request.constraints,
            &request.preferences,
            planning_start,
            budget_ms,
        )
    }

    fn run(
        &self,
        tasks: &[Task],
        constraints: &[ScheduleConstraint],
        preferences: &UserSchedulePreferences,
        planning_start: DateTime<FixedOffset>,
        budget_ms: u64,
    ) -> PipelineReport {
        let budget = TimeBudget::start(self.clock.as_ref(), budget_ms);
        let ctx = PlanningContext::new(tasks, constraints, preferences, &self.config, planning_start);

        info!(
            target: "optimizer::pipeline",
            tasks = tasks.len(),
            constraints = constraints.len(),
            budget_ms,
            planning_start = %planning_start,
            "optimization started"
        );

        let greedy = greedy_scheduler::build_initial_schedule(&ctx);
        log_stage(PipelineStage::Greedy, &greedy);

        let searched = local_search::improve(&greedy, &ctx, &budget);
        log_stage(PipelineStage::LocalSearch, &searched.schedule);

        let remaining_ms = budget.remaining_ms();
        let repaired = if remaining_ms > self.config.repair_threshold_ms {
            let repaired = constraint_repair::repair(&searched.schedule, &ctx);
            log_stage(PipelineStage::Repair, &repaired);
            Some(repaired)
        } else {
            debug!(
                target: "optimizer::pipeline",
                remaining_ms,
                threshold_ms = self.config.repair_threshold_ms,
                "skipping repair, budget too low"
            );
            None
        };

        let result = ctx.reannotate(repaired.as_ref().unwrap_or(&searched.schedule));
        log_stage(PipelineStage::Score, &result);

        let elapsed_ms = budget.elapsed_ms();
        info!(
            target: "optimizer::pipeline",
            scheduled = result.tasks.len(),
            unscheduled = result.unscheduled_task_ids.len(),
            conflicts = result.conflicts.len(),
            score = result.score,
            elapsed_ms,
            "optimization finished"
        );

        PipelineReport {
            greedy,
            local_search: searched.schedule,
            local_search_iterations: searched.iterations,
            local_search_stop: searched.stop_reason,
            repaired,
            result,
            elapsed_ms,
        }
    }
}

/// Single-call entry point with the default configuration, the system clock
/// and the current local time as planning start.
pub fn optimize_schedule(
    tasks: &[Task],
    constraints: &[ScheduleConstraint],
    preferences: &UserSchedulePreferences,
    time_budget_ms: Option<u64>,
) -> OptimizedSchedule {
    let optimizer = ScheduleOptimizer::default();
    let budget_ms = time_budget_ms.unwrap_or(optimizer.config.time_budget_ms);
    optimizer
        .run(tasks, constraints, preferences, local_now(), budget_ms)
        .result
}

fn local_now() -> DateTime<FixedOffset> {
    let now = Local::now();
    now.with_timezone(now.offset())
}

fn log_stage(stage: PipelineStage, schedule: &OptimizedSchedule) {
    debug!(
        target: "optimizer::pipeline",
        %stage,
        scheduled = schedule.tasks.len(),
        conflicts = schedule.conflicts.len(),
        score = schedule.score,
        total_confidence = schedule.total_confidence(),
        "stage complete"
    );
}
