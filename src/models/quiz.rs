use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Preference answers collected once per recommendation request. Mood,
/// tempo and decade stay free-form strings so an unrecognized value can
/// degrade to "no constraint" instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAnswers {
    pub mood: String,
    pub tempo: String,
    pub genres: Vec<String>,
    /// A decade like "1990s", or "any" for no constraint.
    pub decade: String,
    pub format: FormatChoice,
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatChoice {
    Single,
    Album,
    Both,
}

impl Default for FormatChoice {
    fn default() -> Self {
        FormatChoice::Both
    }
}

impl FromStr for FormatChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(FormatChoice::Single),
            "album" => Ok(FormatChoice::Album),
            "both" | "" => Ok(FormatChoice::Both),
            other => Err(format!("unknown format choice: {}", other)),
        }
    }
}
