//! Shared types, error model, and configuration for gameenrich.
//!
//! This crate is the foundation depended on by all other gameenrich crates.
//! It provides:
//! - [`GameEnrichError`]: the unified error type
//! - Domain types ([`EnrichmentResult`], [`PlayerMode`], [`Enrichment`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ModelConfig, PipelineConfig, PipelineSection, PlayerModeRule, PlayerModeSection,
    config_dir, config_file_path, init_config, load_config, load_config_from, parse_delimiter,
    resolve_api_key,
};
pub use error::{GameEnrichError, Result};
pub use types::{
    DEFAULT_DESCRIPTION, DEFAULT_GENRE, ENRICHMENT_COLUMNS, Enrichment, EnrichmentResult,
    EnrichmentStatus, GAME_TITLE_COLUMN, PlayerMode,
};
