use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};

use crate::models::schedule::{OptimizedSchedule, ScheduleConstraint, ScheduledTask};
use crate::models::settings::{OptimizerConfig, UserSchedulePreferences};
use crate::models::task::Task;
use crate::services::conflict_detector;
use crate::services::constraint_validator::ConstraintValidator;
use crate::services::schedule_scorer;
use crate::services::slot_generator::TimeSlotGenerator;

/// Read-only inputs shared by every pipeline stage of one optimization call.
/// Tasks are indexed by id so relocations score against the task's own
/// priority, due date and windows.
pub struct PlanningContext<'a> {
    pub tasks: &'a [Task],
    pub constraints: &'a [ScheduleConstraint],
    pub preferences: &'a UserSchedulePreferences,
    pub config: &'a OptimizerConfig,
    pub planning_start: DateTime<FixedOffset>,
    pub validator: ConstraintValidator,
    index: HashMap<&'a str, &'a Task>,
}

impl<'a> PlanningContext<'a> {
    pub fn new(
        tasks: &'a [Task],
        constraints: &'a [ScheduleConstraint],
        preferences: &'a UserSchedulePreferences,
        config: &'a OptimizerConfig,
        planning_start: DateTime<FixedOffset>,
    ) -> Self {
        let mut index = HashMap::with_capacity(tasks.len());
        for task in tasks {
            // First occurrence wins when ids repeat.
            index.entry(task.id.as_str()).or_insert(task);
        }
        Self {
            tasks,
            constraints,
            preferences,
            config,
            planning_start,
            validator: ConstraintValidator::new(config.fixed_priority_threshold),
            index,
        }
    }

    pub fn task(&self, task_id: &str) -> Option<&'a Task> {
        self.index.get(task_id).copied()
    }

    pub fn contains_task(&self, task_id: &str) -> bool {
        self.index.contains_key(task_id)
    }

    pub fn slot_generator(&self) -> TimeSlotGenerator<'a> {
        TimeSlotGenerator::new(self.preferences, self.config, self.planning_start)
    }

    /// Builds a fully annotated schedule value: confidences, conflicts and the
    /// aggregate score are all recomputed from the placements.
    pub fn annotate(
        &self,
        placements: Vec<ScheduledTask>,
        unscheduled_task_ids: Vec<String>,
    ) -> OptimizedSchedule {
        let tasks: Vec<ScheduledTask> = placements
            .into_iter()
            .map(|mut scheduled| {
                scheduled.confidence = schedule_scorer::confidence(
                    &scheduled,
                    self.task(&scheduled.task_id),
                    self.constraints,
                );
                scheduled
            })
            .collect();

        let conflicts = conflict_detector::detect_conflicts(&tasks, &unscheduled_task_ids, self);
        let score = schedule_scorer::aggregate_score(&tasks, &conflicts);

        OptimizedSchedule {
            tasks,
            score,
            conflicts,
            unscheduled_task_ids,
        }
    }

    /// Re-annotates an existing schedule value, e.g. after an external edit.
    pub fn reannotate(&self, schedule: &OptimizedSchedule) -> OptimizedSchedule {
        self.annotate(schedule.tasks.clone(), schedule.unscheduled_task_ids.clone())
    }
}
