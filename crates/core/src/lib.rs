pub mod error;
pub mod results;
pub mod status;
pub mod task;
