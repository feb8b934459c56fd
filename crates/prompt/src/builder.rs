//! Prompt builder for rendering the answer template around retrieved context.

use crate::types::{Prompt, PromptTemplate, DEFAULT_FALLBACK, DEFAULT_USER_TEMPLATE};
use handlebars::Handlebars;
use insight_core::{AppError, AppResult};
use std::collections::HashMap;

/// Join retrieved chunk texts with a newline, keeping their ranked order.
pub fn join_context<I, S>(chunks: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut context = String::new();
    for (i, chunk) in chunks.into_iter().enumerate() {
        if i > 0 {
            context.push('\n');
        }
        context.push_str(chunk.as_ref());
    }
    context
}

/// Build a prompt from a system instruction, ranked chunk texts and a question
/// using the built-in answer template.
///
/// # Example
/// ```
/// use insight_prompt::{build, DEFAULT_SYSTEM_INSTRUCTION};
///
/// let chunks = ["Ghana's inflation rate fell to 18% in May 2025."];
/// let prompt = build(DEFAULT_SYSTEM_INSTRUCTION, chunks, "What is Ghana's inflation rate?").unwrap();
/// assert!(prompt.user.contains("fell to 18%"));
/// ```
pub fn build<I, S>(system_instruction: &str, retrieved: I, question: &str) -> AppResult<Prompt>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let user = render_user_message(DEFAULT_USER_TEMPLATE, retrieved, question, DEFAULT_FALLBACK)?;
    Ok(Prompt {
        system: system_instruction.to_string(),
        user,
    })
}

/// Build a prompt from a loaded template.
pub fn build_prompt<I, S>(
    template: &PromptTemplate,
    retrieved: I,
    question: &str,
) -> AppResult<Prompt>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tracing::debug!("Building prompt: {}", template.id);

    let user = render_user_message(&template.template, retrieved, question, &template.fallback)?;
    Ok(Prompt {
        system: template.system.clone(),
        user,
    })
}

fn render_user_message<I, S>(
    template: &str,
    retrieved: I,
    question: &str,
    fallback: &str,
) -> AppResult<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let context = join_context(retrieved);
    tracing::debug!("Assembled {} bytes of context", context.len());

    let mut variables = HashMap::new();
    variables.insert("context".to_string(), context);
    variables.insert("question".to_string(), question.to_string());
    variables.insert("fallback".to_string(), fallback.to_string());

    render_template(template, &variables)
}

/// Render a Handlebars template with variables.
pub(crate) fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text output, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
