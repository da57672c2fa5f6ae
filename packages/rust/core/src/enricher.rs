//! Row enricher: one title in, one fully populated result out.
//!
//! Each call sends exactly one prompt to the model and parses the
//! three-line answer. Row-level failures are folded into an [`Enrichment`]
//! whose status says how it went; only a rejected credential is returned
//! as an error, since every later row would fail the same way.

use std::sync::Arc;

use gameenrich_llm::TextModel;
use gameenrich_shared::{
    DEFAULT_DESCRIPTION, DEFAULT_GENRE, Enrichment, EnrichmentResult, EnrichmentStatus,
    GameEnrichError, PipelineConfig, PlayerMode, Result,
};
use tracing::{debug, instrument, warn};

use crate::parser::{self, ParsedResponse};
use crate::player_mode::PlayerModeMapper;

/// Build the single prompt sent for `title`.
pub fn build_prompt(title: &str) -> String {
    format!(
        "You are filling in a video game database entry for '{title}'.\n\
         Answer with exactly three lines and nothing else:\n\
         Genre: <the primary single-word genre, e.g. Fighting, Shooter, RPG, Simulation, \
         Strategy, Action, Adventure, Puzzle, Sports, Racing>\n\
         Description: <a concise gameplay description, strictly under 30 words, \
         without repeating the game's title>\n\
         Player Mode: <exactly one of: Singleplayer, Multiplayer, Both>"
    )
}

/// Turns a raw model answer into an [`Enrichment`].
///
/// Holds the parsing rules only, so saved responses can be re-interpreted
/// without a model.
#[derive(Debug, Clone, Default)]
pub struct ResponseInterpreter {
    mapper: PlayerModeMapper,
    description_word_limit: Option<usize>,
}

impl ResponseInterpreter {
    pub fn new(mapper: PlayerModeMapper, description_word_limit: Option<usize>) -> Self {
        Self {
            mapper,
            description_word_limit,
        }
    }

    /// Rules and word limit from a pipeline config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            PlayerModeMapper::with_rules(config.player_mode_rules.iter().cloned()),
            config.description_word_limit,
        )
    }

    pub fn interpret(&self, response: &str) -> Enrichment {
        let parsed = parser::parse_response(response);
        if parsed.found() == 0 {
            warn!(
                preview = %response.chars().take(120).collect::<String>(),
                "response had no recognizable labels, using defaults"
            );
            return Enrichment::failed("malformed response: no labeled lines");
        }

        self.assemble(parsed)
    }

    fn assemble(&self, parsed: ParsedResponse) -> Enrichment {
        let mut degraded = Vec::new();

        let genre = parsed.genre.unwrap_or_else(|| {
            degraded.push("genre missing");
            DEFAULT_GENRE.to_string()
        });

        let short_description = match parsed.description {
            Some(text) => match self.description_word_limit {
                Some(limit) => parser::truncate_words(&text, limit),
                None => text,
            },
            None => {
                degraded.push("description missing");
                DEFAULT_DESCRIPTION.to_string()
            }
        };

        let player_mode = match parsed.player_mode {
            Some(raw) => {
                let mode = self.mapper.normalize(&raw);
                if !mode.is_known() {
                    warn!(answer = %raw, "unexpected player mode answer");
                    degraded.push("player mode unrecognized");
                }
                mode
            }
            None => {
                degraded.push("player mode missing");
                PlayerMode::Unknown
            }
        };

        let (status, detail) = if degraded.is_empty() {
            (EnrichmentStatus::Complete, None)
        } else {
            (EnrichmentStatus::Partial, Some(degraded.join(", ")))
        };

        Enrichment {
            result: EnrichmentResult {
                genre,
                short_description,
                player_mode,
            },
            status,
            detail,
        }
    }
}

/// Turns titles into [`Enrichment`]s via a [`TextModel`].
#[derive(Debug, Clone)]
pub struct RowEnricher {
    model: Arc<dyn TextModel>,
    interpreter: ResponseInterpreter,
}

impl RowEnricher {
    /// An enricher with the built-in player-mode table and no description limit.
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self {
            model,
            interpreter: ResponseInterpreter::default(),
        }
    }

    /// An enricher using the rules and word limit from a pipeline config.
    pub fn from_config(model: Arc<dyn TextModel>, config: &PipelineConfig) -> Self {
        Self {
            model,
            interpreter: ResponseInterpreter::from_config(config),
        }
    }

    pub fn with_interpreter(mut self, interpreter: ResponseInterpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Enrich one non-empty title with exactly one model call.
    ///
    /// Returns `Err` only for fatal errors (see [`GameEnrichError::is_fatal`]).
    #[instrument(skip_all, fields(title = %title))]
    pub async fn enrich(&self, title: &str) -> Result<Enrichment> {
        let prompt = build_prompt(title);

        let response = match self.model.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                let err = GameEnrichError::from(e);
                if err.is_fatal() {
                    return Err(err);
                }
                warn!(error = %err, "model call failed, using defaults");
                return Ok(Enrichment::failed(err.to_string()));
            }
        };

        debug!(response = %response, "model answered");
        Ok(self.interpreter.interpret(&response))
    }
}
