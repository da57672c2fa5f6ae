//! Core enrichment logic for gameenrich.
//!
//! This crate ties together table I/O, the per-row enricher (prompting,
//! response parsing, player-mode normalization) and the sequential dataset
//! pipeline that paces model calls.

pub mod enricher;
pub mod parser;
pub mod pipeline;
pub mod player_mode;
pub mod table;

pub use enricher::{ResponseInterpreter, RowEnricher, build_prompt};
pub use pipeline::{
    DatasetPipeline, PipelineOutput, PipelineProgress, RunSummary, SilentProgress, enrich_file,
};
pub use player_mode::PlayerModeMapper;
pub use table::Table;
