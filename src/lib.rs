pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{AppError, AppResult};
pub use models::planning::OptimizationRequest;
pub use models::schedule::{
    ConflictKind, ConflictSeverity, ConstraintKind, OptimizedSchedule, ScheduleConflict,
    ScheduleConstraint, ScheduledTask, TimeSlot,
};
pub use models::settings::{LoggingConfig, OptimizerConfig, UserSchedulePreferences};
pub use models::task::{Task, TimeWindow};
pub use services::schedule_optimizer::{optimize_schedule, PipelineReport, ScheduleOptimizer};
pub use utils::clock::{ManualClock, MonotonicClock, SystemClock};
