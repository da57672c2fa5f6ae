//! Line-oriented parser for the three-line labeled model answer.
//!
//! Expected shape:
//!
//! ```text
//! Genre: Simulation
//! Description: Farm, build relationships, and explore caves.
//! Player Mode: Both
//! ```
//!
//! Labels are matched case-insensitively and may be wrapped in markdown
//! (`**Genre:** RPG`, `- Genre: RPG`, `1. Genre: RPG`). The first occurrence
//! of a label wins.

use std::sync::LazyLock;

use regex::Regex;

/// A labeled line: optional decoration or list number, the label, a colon,
/// the value.
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[\s>*#_\-•]*(?:\d+[.)][\s*_]*)?(genre|short[\s_-]*description|description|player[\s_-]*modes?)[\s*_]*:(.*)$",
    )
    .expect("valid regex")
});

/// Which field a labeled line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Genre,
    Description,
    PlayerMode,
}

impl Label {
    fn from_match(label: &str) -> Self {
        let lower = label.to_ascii_lowercase();
        if lower.starts_with("genre") {
            Self::Genre
        } else if lower.starts_with("player") {
            Self::PlayerMode
        } else {
            Self::Description
        }
    }
}

/// Raw field values found in a response. `None` means the label was absent
/// or carried an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    pub genre: Option<String>,
    pub description: Option<String>,
    pub player_mode: Option<String>,
}

impl ParsedResponse {
    /// Number of labels that produced a value.
    pub fn found(&self) -> usize {
        [&self.genre, &self.description, &self.player_mode]
            .iter()
            .filter(|field| field.is_some())
            .count()
    }
}

/// Detect a known label on one line and return it with its trimmed value.
pub fn parse_line(line: &str) -> Option<(Label, String)> {
    let caps = LABEL_RE.captures(line.trim_end())?;
    let label = Label::from_match(caps.get(1)?.as_str());
    let value = clean_value(caps.get(2)?.as_str());
    Some((label, value))
}

/// Split a response into lines and pick out the labeled fields.
pub fn parse_response(text: &str) -> ParsedResponse {
    let mut parsed = ParsedResponse::default();

    for line in text.lines() {
        let Some((label, value)) = parse_line(line) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        let slot = match label {
            Label::Genre => &mut parsed.genre,
            Label::Description => &mut parsed.description,
            Label::PlayerMode => &mut parsed.player_mode,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    parsed
}

/// Strip whitespace, markdown emphasis and wrapping quotes from a value.
fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '*' || c == '_')
        .trim()
        .trim_matches('"')
        .trim()
        .to_string()
}

/// Cut `text` to `limit` words plus an ellipsis when it runs more than five
/// words past the limit. Shorter text is returned unchanged.
pub fn truncate_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit.saturating_add(5) {
        return text.to_string();
    }
    format!("{}...", words[..limit].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_response() {
        let parsed = parse_response(
            "Genre: Simulation\nDescription: Farm, build relationships, and explore caves.\nPlayer Mode: Both",
        );
        assert_eq!(parsed.genre.as_deref(), Some("Simulation"));
        assert_eq!(
            parsed.description.as_deref(),
            Some("Farm, build relationships, and explore caves.")
        );
        assert_eq!(parsed.player_mode.as_deref(), Some("Both"));
        assert_eq!(parsed.found(), 3);
    }

    #[test]
    fn labels_are_case_and_whitespace_tolerant() {
        let parsed = parse_response("  GENRE :  RPG  \r\n description:Dungeon crawling.\nplayer mode:   Singleplayer\n");
        assert_eq!(parsed.genre.as_deref(), Some("RPG"));
        assert_eq!(parsed.description.as_deref(), Some("Dungeon crawling."));
        assert_eq!(parsed.player_mode.as_deref(), Some("Singleplayer"));
    }

    #[test]
    fn markdown_decoration_is_stripped() {
        let text = "Here is the info:\n\n**Genre:** Fighting\n- **Description**: \"Duel rivals in fast bouts.\"\n* Player-Mode: *Multiplayer*";
        let parsed = parse_response(text);
        assert_eq!(parsed.genre.as_deref(), Some("Fighting"));
        assert_eq!(parsed.description.as_deref(), Some("Duel rivals in fast bouts."));
        assert_eq!(parsed.player_mode.as_deref(), Some("Multiplayer"));
    }

    #[test]
    fn label_variants() {
        assert_eq!(
            parse_line("Short Description: Race karts."),
            Some((Label::Description, "Race karts.".to_string()))
        );
        assert_eq!(
            parse_line("PlayerModes: Both"),
            Some((Label::PlayerMode, "Both".to_string()))
        );
        assert_eq!(parse_line("Publisher: Nintendo"), None);
        assert_eq!(parse_line("The genre is racing"), None);
    }

    #[test]
    fn missing_and_empty_labels_are_none() {
        let parsed = parse_response("Genre:\nPlayer Mode: Both");
        assert_eq!(parsed.genre, None);
        assert_eq!(parsed.description, None);
        assert_eq!(parsed.player_mode.as_deref(), Some("Both"));
        assert_eq!(parsed.found(), 1);
    }

    #[test]
    fn numbered_list_labels() {
        let parsed = parse_response(
            "1. Genre: RPG\n2) **Description:** Explore a ruined kingdom.\n3. Player Mode: Both",
        );
        assert_eq!(parsed.genre.as_deref(), Some("RPG"));
        assert_eq!(parsed.description.as_deref(), Some("Explore a ruined kingdom."));
        assert_eq!(parsed.player_mode.as_deref(), Some("Both"));
        assert_eq!(parse_line("1999: Genre shift"), None);
    }

    #[test]
    fn first_occurrence_wins() {
        let parsed = parse_response("Genre: Puzzle\nGenre: Action");
        assert_eq!(parsed.genre.as_deref(), Some("Puzzle"));
    }

    #[test]
    fn unlabeled_text_finds_nothing() {
        assert_eq!(parse_response("I'm not sure about that game.").found(), 0);
        assert_eq!(parse_response("").found(), 0);
    }

    #[test]
    fn description_colon_in_value_is_kept() {
        let parsed = parse_response("Description: Two modes: story and arcade.");
        assert_eq!(parsed.description.as_deref(), Some("Two modes: story and arcade."));
    }

    #[test]
    fn truncate_words_leaves_near_limit_text() {
        let text = "one two three four five six seven";
        assert_eq!(truncate_words(text, 5), text);
        assert_eq!(truncate_words(text, 1), "one...");
    }

    #[test]
    fn truncate_words_with_huge_limit_is_unchanged() {
        assert_eq!(truncate_words("a b c", usize::MAX), "a b c");
    }
}
