pub mod collectors;
pub mod config;
pub mod results;
pub mod scheduler;
pub mod worker;

pub use config::GcConfig;
pub use results::{GcResult, GcStatistics};
pub use scheduler::TaskScheduler;
pub use worker::GarbageCollector;
