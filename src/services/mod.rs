pub mod conflict_detector;
pub mod constraint_repair;
pub mod constraint_validator;
pub mod greedy_scheduler;
pub mod local_search;
pub mod planning_context;
pub mod schedule_optimizer;
pub mod schedule_scorer;
pub mod schedule_utils;
pub mod slot_generator;
pub mod slot_scorer;
