pub mod generate;
pub mod jobs;
pub mod queue;
