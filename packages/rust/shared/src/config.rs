//! Application configuration for termdeck.
//!
//! User config lives at `~/.termdeck/termdeck.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TermDeckError};
use crate::types::{OutputMode, ProviderKind};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "termdeck.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".termdeck";

// ---------------------------------------------------------------------------
// Config structs (matching termdeck.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// External definition provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Deck and note type settings for package output.
    #[serde(default)]
    pub deck: DeckConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Path of the persistent definition cache.
    #[serde(default = "default_cache_file")]
    pub cache_file: String,

    /// Output mode when `--mode` is not given.
    #[serde(default)]
    pub mode: OutputMode,

    /// Definition source when `--provider` is not given.
    #[serde(default)]
    pub provider: ProviderKind,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            cache_file: default_cache_file(),
            mode: OutputMode::default(),
            provider: ProviderKind::default(),
        }
    }
}

fn default_cache_file() -> String {
    "definition_cache.json".into()
}

/// `[provider]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Root of an OpenAI-compatible API (`/chat/completions` is appended).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model ID sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// System message sent before each term.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// User message template; `{term}` is replaced with the term.
    #[serde(default = "default_user_prompt")]
    pub user_prompt: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient failures (429, 5xx, timeouts).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay; doubles on each further attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            system_prompt: default_system_prompt(),
            user_prompt: default_user_prompt(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl ProviderConfig {
    /// Parse `base_url`, rejecting anything that is not an absolute URL.
    pub fn endpoint_root(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| {
            TermDeckError::config(format!("invalid provider base_url '{}': {e}", self.base_url))
        })
    }

    /// Render the user prompt for `term`.
    pub fn user_message(&self, term: &str) -> String {
        self.user_prompt.replace("{term}", term)
    }
}

fn default_base_url() -> String {
    "https://api.deepinfra.com/v1/openai".into()
}
fn default_model() -> String {
    "deepseek-ai/DeepSeek-V3-0324".into()
}
fn default_api_key_env() -> String {
    "DEEPINFRA_API_KEY".into()
}
fn default_system_prompt() -> String {
    "You are an expert in startups and business education. Provide concise definitions in \
     Russian for key startup terminology, suitable for inclusion in educational flashcards. \
     Each definition should be 1-2 sentences and clear to a university-level student."
        .into()
}
fn default_user_prompt() -> String {
    "Дай краткое определение термина «{term}» в контексте стартапов и бизнеса на русском языке."
        .into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_backoff_ms() -> u64 {
    500
}

/// `[deck]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckConfig {
    /// Deck name shown in the flashcard application.
    #[serde(default = "default_deck_name")]
    pub name: String,

    /// Note type name.
    #[serde(default = "default_note_type_name")]
    pub note_type_name: String,

    /// Stable deck id; `0` derives one from the package time base.
    #[serde(default = "default_deck_id")]
    pub deck_id: i64,

    /// Stable note type id; `0` derives one from the package time base.
    #[serde(default = "default_note_type_id")]
    pub note_type_id: i64,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            name: default_deck_name(),
            note_type_name: default_note_type_name(),
            deck_id: default_deck_id(),
            note_type_id: default_note_type_id(),
        }
    }
}

fn default_deck_name() -> String {
    "Startup Terms in Russian".into()
}
fn default_note_type_name() -> String {
    "Startup Terms Model".into()
}
fn default_deck_id() -> i64 {
    2_059_400_110
}
fn default_note_type_id() -> i64 {
    1_607_392_319
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.termdeck/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TermDeckError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.termdeck/termdeck.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TermDeckError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TermDeckError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TermDeckError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TermDeckError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TermDeckError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the provider API key from the env var named in the config.
pub fn resolve_api_key(config: &ProviderConfig) -> Result<String> {
    let var_name = &config.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(TermDeckError::config(format!(
            "API key not found. Set the {var_name} environment variable \
             (or add it to a .env file in the working directory)."
        ))),
    }
}
