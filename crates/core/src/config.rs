//! Configuration management.
//!
//! Configuration is layered, later sources overriding earlier ones:
//! - Built-in defaults
//! - Config file (`.insight/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with all state stored in `.insight/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".insight";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .insight/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active LLM provider ("groq" or "ollama")
    pub provider: String,

    /// Model identifier for answer generation
    pub model: String,

    /// Explicit API key override
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Retrieval pipeline settings
    pub knowledge: KnowledgeConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Groq {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        temperature: Option<f32>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        temperature: Option<f32>,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model name configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::Groq { model, .. } | ProviderConfig::Ollama { model, .. } => model,
        }
    }

    /// Endpoint override, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProviderConfig::Groq { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }

    /// Sampling temperature override, if any.
    pub fn temperature(&self) -> Option<f32> {
        match self {
            ProviderConfig::Groq { temperature, .. }
            | ProviderConfig::Ollama { temperature, .. } => *temperature,
        }
    }

    /// Request timeout in seconds, if any.
    pub fn timeout(&self) -> Option<u64> {
        match self {
            ProviderConfig::Groq { timeout, .. } | ProviderConfig::Ollama { timeout, .. } => {
                *timeout
            }
        }
    }
}

/// Retrieval pipeline configuration (`knowledge:` section of config.yaml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeConfig {
    /// Collection name inside the vector index
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Corpus directory, relative to the workspace
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared with the preceding chunk
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// JSON field holding the document text
    #[serde(default = "default_text_field")]
    pub text_field: String,

    /// Embedding backend
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_collection() -> String {
    "ml_publications".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_top_k() -> usize {
    4
}

fn default_text_field() -> String {
    "publication_description".to_string()
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            data_dir: default_data_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            text_field: default_text_field(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl KnowledgeConfig {
    /// Reject chunk parameters outside `0 < overlap < size`.
    pub fn validate_chunking(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::MalformedChunkParameters(
                "chunk_size must be positive".to_string(),
            ));
        }
        if self.chunk_overlap == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(AppError::MalformedChunkParameters(format!(
                "chunk_overlap must satisfy 0 < overlap < chunk_size (got overlap {}, size {})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Embedding backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Endpoint override for HTTP providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds for HTTP providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
            timeout_secs: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    knowledge: Option<KnowledgeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "groq".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            knowledge: KnowledgeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and environment variables.
    ///
    /// Environment variables:
    /// - `INSIGHT_WORKSPACE`: Override workspace path
    /// - `INSIGHT_CONFIG`: Path to config file
    /// - `INSIGHT_PROVIDER`: LLM provider
    /// - `INSIGHT_MODEL`: Model identifier
    /// - `INSIGHT_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use insight_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], but an explicit workspace or config file
    /// (from CLI flags) takes precedence over the environment before the
    /// YAML file is located.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace =
            workspace.or_else(|| std::env::var_os("INSIGHT_WORKSPACE").map(PathBuf::from));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var_os("INSIGHT_CONFIG").map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.state_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("INSIGHT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("INSIGHT_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("INSIGHT_API_KEY").ok();
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.apply_yaml(&contents).map_err(|e| match e {
            AppError::Serialization(msg) => {
                AppError::Config(format!("Failed to parse config file {:?}: {}", path, msg))
            }
            other => other,
        })?;

        tracing::debug!("Merged configuration from {:?}", path);
        Ok(result)
    }

    /// Apply the sections of a YAML document on top of this config.
    fn apply_yaml(&mut self, contents: &str) -> AppResult<()> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                self.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            self.provider = llm.active_provider.clone();
            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                self.model = provider_config.model().to_string();
            }
            self.llm = Some(llm);
        }

        if let Some(knowledge) = config_file.knowledge {
            self.knowledge = knowledge;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .insight directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .insight directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Absolute corpus directory.
    pub fn data_dir(&self) -> PathBuf {
        if self.knowledge.data_dir.is_absolute() {
            self.knowledge.data_dir.clone()
        } else {
            self.workspace.join(&self.knowledge.data_dir)
        }
    }

    /// Get the configuration of a provider, if the config file declares one.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Resolve the API key for a provider.
    ///
    /// `INSIGHT_API_KEY` wins; otherwise the env var named by the provider
    /// config is read, falling back to `GROQ_API_KEY` for Groq.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::Groq { api_key_env, .. }) => Some(api_key_env.clone()),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider == "groq" => Some("GROQ_API_KEY".to_string()),
            None => None,
        };

        env_var.and_then(|var| std::env::var(var).ok())
    }

    /// Validate configuration for the active provider and the pipeline.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["groq", "ollama"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        self.knowledge.validate_chunking()?;

        if self.knowledge.top_k == 0 {
            return Err(AppError::Config("top_k must be positive".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "groq");
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.knowledge.collection, "ml_publications");
        assert_eq!(config.knowledge.chunk_size, 500);
        assert_eq!(config.knowledge.chunk_overlap, 50);
        assert_eq!(config.knowledge.top_k, 4);
        assert!(!config.verbose);
    }

    #[test]
    fn test_state_dir() {
        let config = AppConfig::default();
        assert!(config.state_dir().ends_with(".insight"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_apply_yaml_sections() {
        let yaml = r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: http://localhost:11434
      model: llama3.2
    groq:
      apiKeyEnv: MY_GROQ_KEY
      model: llama-3.1-70b-versatile
logging:
  level: warn
  color: false
knowledge:
  collection: bog_reports
  chunkSize: 800
  chunkOverlap: 80
"#;
        let mut config = AppConfig::default();
        config.apply_yaml(yaml).unwrap();

        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.log_level, Some("warn".to_string()));
        assert!(config.no_color);
        assert_eq!(config.knowledge.collection, "bog_reports");
        assert_eq!(config.knowledge.chunk_size, 800);
        assert_eq!(config.knowledge.chunk_overlap, 80);
        // Unspecified fields keep their defaults
        assert_eq!(config.knowledge.top_k, 4);
        assert_eq!(config.knowledge.embedding.provider, "trigram");

        match config.get_provider_config("groq") {
            Some(ProviderConfig::Groq { api_key_env, .. }) => {
                assert_eq!(api_key_env, "MY_GROQ_KEY")
            }
            other => panic!("Expected groq provider config, got {:?}", other),
        }
        assert!(matches!(
            config.get_provider_config("ollama"),
            Some(ProviderConfig::Ollama { .. })
        ));
    }

    #[test]
    fn test_merge_yaml_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "knowledge:\n  topK: 7\n").unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.knowledge.top_k, 7);
    }

    #[test]
    fn test_merge_yaml_invalid() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "knowledge: [unclosed").unwrap();

        let result = AppConfig::default().merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_chunking() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.knowledge.chunk_overlap = config.knowledge.chunk_size;
        assert!(matches!(
            config.validate(),
            Err(AppError::MalformedChunkParameters(_))
        ));

        config.knowledge.chunk_size = 0;
        assert!(matches!(
            config.validate(),
            Err(AppError::MalformedChunkParameters(_))
        ));
    }

    #[test]
    fn test_resolve_api_key_explicit() {
        let mut config = AppConfig::default();
        config.api_key = Some("explicit".to_string());
        assert_eq!(config.resolve_api_key("groq"), Some("explicit".to_string()));
    }

    #[test]
    fn test_load_with_explicit_workspace() {
        let temp = tempfile::TempDir::new().unwrap();
        let state_dir = temp.path().join(STATE_DIR);
        std::fs::create_dir_all(&state_dir).unwrap();
        std::fs::write(
            state_dir.join("config.yaml"),
            "knowledge:\n  collection: bog_reports\n",
        )
        .unwrap();

        let config = AppConfig::load_with(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.knowledge.collection, "bog_reports");
    }

    #[test]
    fn test_load_with_missing_workspace() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = AppConfig::load_with(Some(temp.path().join("missing")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_data_dir_relative_to_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/insights");
        assert_eq!(config.data_dir(), PathBuf::from("/srv/insights/data"));
    }
}
