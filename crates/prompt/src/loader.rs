//! Prompt loader for YAML template overrides.

use crate::types::{PromptTemplate, DEFAULT_PROMPT_ID};
use insight_core::config::STATE_DIR;
use insight_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(STATE_DIR).join("prompts")
}

/// Load a prompt template by ID from `.insight/prompts/<id>.yml`.
///
/// # Example
/// ```no_run
/// use insight_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let template = load_prompt(Path::new("."), "insight.answer.terse")?;
/// println!("Loaded prompt: {}", template.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptTemplate> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let template: PromptTemplate = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&template)?;

    tracing::info!("Loaded prompt: {} ({})", template.id, template.title);

    Ok(template)
}

/// Load the default template, honouring a workspace override if one exists.
pub fn load_prompt_or_default(workspace_path: &Path) -> AppResult<PromptTemplate> {
    let override_file = prompts_dir(workspace_path).join(format!("{}.yml", DEFAULT_PROMPT_ID));
    if override_file.exists() {
        load_prompt(workspace_path, DEFAULT_PROMPT_ID)
    } else {
        Ok(PromptTemplate::default())
    }
}

/// List all available prompt IDs in the workspace.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let dir = prompts_dir(workspace_path);

    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(&dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    Ok(prompt_ids)
}

/// Validate a prompt template.
fn validate_prompt(template: &PromptTemplate) -> AppResult<()> {
    if template.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if template.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if !template.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: '{}'. Expected format: 'x.y'",
            template.api_version
        )));
    }

    if template.system.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt system instruction cannot be empty".to_string(),
        ));
    }

    if template.fallback.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt fallback sentence cannot be empty".to_string(),
        ));
    }

    for placeholder in ["{{context}}", "{{question}}"] {
        if !template.template.contains(placeholder) {
            return Err(AppError::Prompt(format!(
                "Prompt template must reference {}",
                placeholder
            )));
        }
    }

    Ok(())
}
