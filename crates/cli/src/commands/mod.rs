//! Command handlers for the Investment Insights CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod clean;
pub mod ingest;
pub mod retrieve;
pub mod retry;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use clean::CleanCommand;
pub use ingest::IngestCommand;
pub use retrieve::RetrieveCommand;
pub use stats::StatsCommand;
