//! CLI library components for the dataset transpiler.

pub mod logging;
pub mod pipeline;
pub mod types;
