pub mod generator;
pub mod loader;
pub mod partition;
pub mod probe;
pub mod runner;
pub mod stats;

pub use generator::{generate_records, random_unit_vector};
pub use loader::run_load;
pub use partition::PartitionCursor;
pub use probe::run_probe;
pub use runner::run_queries;
pub use stats::RunStats;
