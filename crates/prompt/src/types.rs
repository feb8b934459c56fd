//! Prompt types.

use serde::{Deserialize, Serialize};

/// Identifier of the built-in template.
pub const DEFAULT_PROMPT_ID: &str = "insight.answer.default";

/// Role and source scope of the assistant. Does not vary per query.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are Ghana Investment Insights, an assistant \
for investors, analysts and policymakers exploring Ghana's economic landscape. You answer \
questions about sector performance, macroeconomic indicators and regulatory changes. Your only \
authoritative source is the official Bank of Ghana publication material supplied to you as \
context; do not draw on other sources or prior knowledge. Quote figures and dates exactly as \
they appear in the context.";

/// Answer the question from the supplied context only.
pub const DEFAULT_USER_TEMPLATE: &str = "Answer the following question using only the context below.

Context:
{{context}}

Question: {{question}}

If the answer is not in the context, say '{{fallback}}'";

/// Sentence the model is told to give when the context lacks the answer.
pub const DEFAULT_FALLBACK: &str = "I'm sorry, that information is not in this publication.";

/// A template for assembling prompts, built-in or loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Unique template identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Static system instruction
    #[serde(default = "default_system")]
    pub system: String,

    /// Handlebars user-message template; must reference `context` and `question`
    #[serde(default = "default_template")]
    pub template: String,

    /// Refusal sentence substituted for `{{fallback}}`
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_system() -> String {
    DEFAULT_SYSTEM_INSTRUCTION.to_string()
}

fn default_template() -> String {
    DEFAULT_USER_TEMPLATE.to_string()
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            id: DEFAULT_PROMPT_ID.to_string(),
            title: "Grounded answer".to_string(),
            api_version: "1.0".to_string(),
            system: default_system(),
            template: default_template(),
            fallback: default_fallback(),
        }
    }
}

/// A fully assembled prompt ready for the answerer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// System instruction
    pub system: String,

    /// User message with embedded context and question
    pub user: String,
}
