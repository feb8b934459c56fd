//! Prompt assembly for grounded answering.
//!
//! This crate combines a static system instruction, retrieved context and the
//! user's question into the two-message input sent to the language model:
//! - Built-in default instruction and answer template
//! - Handlebars template rendering
//! - Optional YAML template overrides in `.insight/prompts/`

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build, build_prompt, join_context};
pub use loader::{list_prompts, load_prompt, load_prompt_or_default};
pub use types::{
    Prompt, PromptTemplate, DEFAULT_FALLBACK, DEFAULT_SYSTEM_INSTRUCTION, DEFAULT_USER_TEMPLATE,
};
