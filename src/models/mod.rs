pub mod planning;
pub mod schedule;
pub mod settings;
pub mod task;
