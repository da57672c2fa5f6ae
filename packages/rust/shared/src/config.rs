//! Application configuration for gameenrich.
//!
//! User config lives at `~/.gameenrich/gameenrich.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GameEnrichError, Result};
use crate::types::PlayerMode;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "gameenrich.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".gameenrich";

// ---------------------------------------------------------------------------
// Config structs (matching gameenrich.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generative model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Row processing settings.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Extra player-mode synonyms.
    #[serde(default)]
    pub player_mode: PlayerModeSection,
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier sent to the service.
    #[serde(default = "default_model")]
    pub model: String,

    /// REST base URL of the generative language API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".into()
}
fn default_model() -> String {
    "gemini-2.0-flash-lite".into()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Input table path.
    #[serde(default = "default_input")]
    pub input: String,

    /// Output table path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Single-character field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Pause after every row, in milliseconds.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// Cut descriptions that run well past this many words. Unset keeps
    /// descriptions exactly as the model returned them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_word_limit: Option<usize>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            delimiter: default_delimiter(),
            pacing_ms: default_pacing_ms(),
            description_word_limit: None,
        }
    }
}

fn default_input() -> String {
    "Game_Thumbnail.csv".into()
}
fn default_output() -> String {
    "enhanced_game_data.csv".into()
}
fn default_delimiter() -> String {
    ",".into()
}
fn default_pacing_ms() -> u64 {
    3_000
}

/// `[player_mode]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerModeSection {
    /// Rules tried before the built-in synonym table.
    #[serde(default)]
    pub synonyms: Vec<PlayerModeRule>,
}

/// Maps any answer containing `pattern` (case-insensitive) to `mode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerModeRule {
    pub pattern: String,
    pub mode: PlayerMode,
}

impl PlayerModeRule {
    pub fn new(pattern: impl Into<String>, mode: PlayerMode) -> Self {
        Self {
            pattern: pattern.into(),
            mode,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Table to read.
    pub input: PathBuf,
    /// Table to write.
    pub output: PathBuf,
    /// Field delimiter byte for both tables.
    pub delimiter: u8,
    /// Pause after every row.
    pub pacing: Duration,
    /// Optional description word limit (see [`PipelineSection`]).
    pub description_word_limit: Option<usize>,
    /// User-supplied player-mode rules.
    pub player_mode_rules: Vec<PlayerModeRule>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let section = PipelineSection::default();
        Self {
            input: PathBuf::from(section.input),
            output: PathBuf::from(section.output),
            delimiter: b',',
            pacing: Duration::from_millis(section.pacing_ms),
            description_word_limit: None,
            player_mode_rules: Vec::new(),
        }
    }
}

impl TryFrom<&AppConfig> for PipelineConfig {
    type Error = GameEnrichError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let section = &config.pipeline;
        Ok(Self {
            input: PathBuf::from(&section.input),
            output: PathBuf::from(&section.output),
            delimiter: parse_delimiter(&section.delimiter)?,
            pacing: Duration::from_millis(section.pacing_ms),
            description_word_limit: section.description_word_limit,
            player_mode_rules: config.player_mode.synonyms.clone(),
        })
    }
}

/// Parse a delimiter setting. Accepts a single ASCII character or `\t`.
pub fn parse_delimiter(value: &str) -> Result<u8> {
    match value {
        "\\t" | "\t" | "tab" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        other => Err(GameEnrichError::config(format!(
            "delimiter must be a single ASCII character, got {other:?}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.gameenrich/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GameEnrichError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.gameenrich/gameenrich.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| GameEnrichError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        GameEnrichError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| GameEnrichError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| GameEnrichError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| GameEnrichError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the model API key from the environment variable named in the config.
///
/// A missing or blank key is fatal: it is checked once at startup, before
/// any row is read.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.model.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(GameEnrichError::Credential(format!(
            "API key not found. Set the {var_name} environment variable \
             (or add it to a .env file in the working directory)."
        ))),
    }
}
