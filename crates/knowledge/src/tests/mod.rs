//! Cross-module pipeline scenarios.

mod pipeline;
mod ranking;
mod stubs;
