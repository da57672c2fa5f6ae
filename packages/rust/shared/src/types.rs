//! Core domain types for title enrichment.

use serde::{Deserialize, Serialize};

/// Name of the one column every input table must carry.
pub const GAME_TITLE_COLUMN: &str = "game_title";

/// Columns appended to every output row, in this order.
pub const ENRICHMENT_COLUMNS: [&str; 3] = ["genre", "short_description", "player_mode"];

/// Genre used when the model gives nothing usable.
pub const DEFAULT_GENRE: &str = "Unknown";

/// Description used when the model gives nothing usable.
pub const DEFAULT_DESCRIPTION: &str = "N/A";

// ---------------------------------------------------------------------------
// PlayerMode
// ---------------------------------------------------------------------------

/// How many people can play a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerMode {
    #[serde(alias = "singleplayer", alias = "SINGLEPLAYER")]
    Singleplayer,
    #[serde(alias = "multiplayer", alias = "MULTIPLAYER")]
    Multiplayer,
    #[serde(alias = "both", alias = "BOTH")]
    Both,
    /// The model's answer could not be mapped onto the closed set.
    #[default]
    #[serde(alias = "unknown", alias = "UNKNOWN")]
    Unknown,
}

impl PlayerMode {
    /// The closed set a model answer may map to.
    pub const KNOWN: [PlayerMode; 3] = [Self::Singleplayer, Self::Multiplayer, Self::Both];

    /// Canonical column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Singleplayer => "Singleplayer",
            Self::Multiplayer => "Multiplayer",
            Self::Both => "Both",
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Self::Unknown
    }
}

impl std::fmt::Display for PlayerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlayerMode {
    type Err = String;

    /// Exact, case-insensitive match on the canonical names only.
    /// Synonym handling lives in the enricher's mapper.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim();
        Self::KNOWN
            .into_iter()
            .chain(std::iter::once(Self::Unknown))
            .find(|mode| mode.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unrecognized player mode: {needle:?}"))
    }
}

// ---------------------------------------------------------------------------
// EnrichmentResult
// ---------------------------------------------------------------------------

/// The three fields derived for one row.
///
/// Always fully populated: anything that could not be determined carries
/// its documented default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub genre: String,
    pub short_description: String,
    pub player_mode: PlayerMode,
}

impl Default for EnrichmentResult {
    fn default() -> Self {
        Self {
            genre: DEFAULT_GENRE.to_string(),
            short_description: DEFAULT_DESCRIPTION.to_string(),
            player_mode: PlayerMode::Unknown,
        }
    }
}

impl EnrichmentResult {
    /// True when every field holds its default value.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Field values in [`ENRICHMENT_COLUMNS`] order.
    pub fn columns(&self) -> [&str; 3] {
        [
            self.genre.as_str(),
            self.short_description.as_str(),
            self.player_mode.as_str(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Enrichment outcome
// ---------------------------------------------------------------------------

/// How a row's enrichment went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// All three fields came from the model response.
    Complete,
    /// The response was usable but at least one field was degraded.
    Partial,
    /// The call failed or the response was unusable; all fields are defaults.
    Failed,
    /// The row had no title, so no call was made.
    Skipped,
}

impl EnrichmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// What the row enricher hands back: the result plus a status flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub result: EnrichmentResult,
    pub status: EnrichmentStatus,
    /// Human-readable reason for a degraded or failed row.
    pub detail: Option<String>,
}

impl Enrichment {
    /// A row that was never sent to the model.
    pub fn skipped() -> Self {
        Self {
            result: EnrichmentResult::default(),
            status: EnrichmentStatus::Skipped,
            detail: Some("missing game title".into()),
        }
    }

    /// A row whose model call or response failed outright.
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            result: EnrichmentResult::default(),
            status: EnrichmentStatus::Failed,
            detail: Some(detail.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_result_uses_documented_values() {
        let result = EnrichmentResult::default();
        assert_eq!(result.columns(), ["Unknown", "N/A", "Unknown"]);
        assert!(result.is_default());
    }

    #[test]
    fn player_mode_from_str_is_case_insensitive() {
        assert_eq!("SINGLEPLAYER".parse::<PlayerMode>(), Ok(PlayerMode::Singleplayer));
        assert_eq!(" both ".parse::<PlayerMode>(), Ok(PlayerMode::Both));
        assert!("co-op".parse::<PlayerMode>().is_err());
    }

    #[test]
    fn player_mode_serde_uses_canonical_names() {
        let json = serde_json::to_string(&PlayerMode::Multiplayer).unwrap();
        assert_eq!(json, r#""Multiplayer""#);
        let parsed: PlayerMode = serde_json::from_str(r#""both""#).unwrap();
        assert_eq!(parsed, PlayerMode::Both);
    }

    #[test]
    fn failed_and_skipped_carry_defaults() {
        assert!(Enrichment::skipped().result.is_default());
        let failed = Enrichment::failed("timeout");
        assert_eq!(failed.status, EnrichmentStatus::Failed);
        assert_eq!(failed.detail.as_deref(), Some("timeout"));
    }
}
