//! Free-text player-mode answers mapped onto the closed set.

use gameenrich_shared::{PlayerMode, PlayerModeRule};

/// Built-in substring rules. Matching is on the lowercased answer.
const BUILTIN_RULES: &[(&str, PlayerMode)] = &[
    ("both", PlayerMode::Both),
    ("single", PlayerMode::Singleplayer),
    ("solo", PlayerMode::Singleplayer),
    ("campaign", PlayerMode::Singleplayer),
    ("multi", PlayerMode::Multiplayer),
    ("co-op", PlayerMode::Multiplayer),
    ("coop", PlayerMode::Multiplayer),
    ("cooperative", PlayerMode::Multiplayer),
    ("online", PlayerMode::Multiplayer),
    ("pvp", PlayerMode::Multiplayer),
];

/// Normalizes a model's player-mode answer.
///
/// Order of precedence:
/// 1. exact canonical name, case-insensitive (`"SINGLEPLAYER"`);
/// 2. user rules, first match wins;
/// 3. built-in rules, where an answer naming both a single-player and a
///    multiplayer form (`"single and multiplayer"`) counts as `Both`.
///
/// Anything else is [`PlayerMode::Unknown`].
#[derive(Debug, Clone, Default)]
pub struct PlayerModeMapper {
    rules: Vec<PlayerModeRule>,
}

impl PlayerModeMapper {
    /// A mapper with only the built-in table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mapper that consults `rules` before the built-in table.
    pub fn with_rules(rules: impl IntoIterator<Item = PlayerModeRule>) -> Self {
        let mut mapper = Self::new();
        for rule in rules {
            mapper.push_rule(rule);
        }
        mapper
    }

    /// Add one rule after the existing user rules. Blank patterns are ignored.
    pub fn push_rule(&mut self, rule: PlayerModeRule) {
        let pattern = rule.pattern.trim().to_lowercase();
        if !pattern.is_empty() {
            self.rules.push(PlayerModeRule::new(pattern, rule.mode));
        }
    }

    pub fn normalize(&self, answer: &str) -> PlayerMode {
        let cleaned = clean(answer);
        if cleaned.is_empty() {
            return PlayerMode::Unknown;
        }

        if let Ok(mode) = cleaned.parse::<PlayerMode>() {
            return mode;
        }

        if let Some(rule) = self
            .rules
            .iter()
            .find(|rule| cleaned.contains(rule.pattern.as_str()))
        {
            return rule.mode;
        }

        let mut single = false;
        let mut multi = false;
        for (pattern, mode) in BUILTIN_RULES {
            if !cleaned.contains(pattern) {
                continue;
            }
            match mode {
                PlayerMode::Both => return PlayerMode::Both,
                PlayerMode::Singleplayer => single = true,
                PlayerMode::Multiplayer => multi = true,
                PlayerMode::Unknown => {}
            }
        }

        match (single, multi) {
            (true, true) => PlayerMode::Both,
            (true, false) => PlayerMode::Singleplayer,
            (false, true) => PlayerMode::Multiplayer,
            (false, false) => PlayerMode::Unknown,
        }
    }
}

/// Lowercase and strip quoting/markdown/punctuation around the answer.
fn clean(answer: &str) -> String {
    answer
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '_' | '`' | '.' | '!'))
        .trim()
        .to_lowercase()
}
