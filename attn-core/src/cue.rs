use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Defines a binary cue and the response it expects
pub trait Cue: Copy + Clone + PartialEq + Eq + Send + Sync + fmt::Debug {
    /// The other label of the pair.
    fn opposite(&self) -> Self;
    fn expected_response(&self) -> Choice;
    /// Text handed to the voice collaborator.
    fn spoken(&self) -> &'static str;
    /// Text shown on the presentation surface.
    fn display(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CueLabel {
    #[serde(rename = "PLUS")]
    Increase,
    #[serde(rename = "MINUS")]
    Decrease,
}

impl Cue for CueLabel {
    fn opposite(&self) -> Self {
        match self {
            CueLabel::Increase => CueLabel::Decrease,
            CueLabel::Decrease => CueLabel::Increase,
        }
    }

    fn expected_response(&self) -> Choice {
        match self {
            CueLabel::Increase => Choice::Plus,
            CueLabel::Decrease => Choice::Minus,
        }
    }

    fn spoken(&self) -> &'static str {
        match self {
            CueLabel::Increase => "plus",
            CueLabel::Decrease => "minus",
        }
    }

    fn display(&self) -> &'static str {
        match self {
            CueLabel::Increase => "PLUS",
            CueLabel::Decrease => "MINUS",
        }
    }
}

impl fmt::Display for CueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// A participant response: one of the two response keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl Choice {
    pub fn symbol(&self) -> &'static str {
        match self {
            Choice::Plus => "+",
            Choice::Minus => "-",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Choice::Plus => Choice::Minus,
            Choice::Minus => Choice::Plus,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" | "p" | "plus" => Ok(Choice::Plus),
            // U+2212 is what the on-screen minus key produces
            "-" | "\u{2212}" | "m" | "minus" => Ok(Choice::Minus),
            other => Err(format!("unrecognised response `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_map_to_their_response_key() {
        assert_eq!(CueLabel::Increase.expected_response(), Choice::Plus);
        assert_eq!(CueLabel::Decrease.expected_response(), Choice::Minus);
        assert_eq!(CueLabel::Increase.opposite(), CueLabel::Decrease);
    }

    #[test]
    fn parses_typed_responses() {
        assert_eq!("+".parse::<Choice>(), Ok(Choice::Plus));
        assert_eq!(" - ".parse::<Choice>(), Ok(Choice::Minus));
        assert_eq!("\u{2212}".parse::<Choice>(), Ok(Choice::Minus));
        assert!("x".parse::<Choice>().is_err());
    }

    #[test]
    fn serializes_with_dataset_spelling() {
        assert_eq!(serde_json::to_string(&CueLabel::Increase).unwrap(), "\"PLUS\"");
        assert_eq!(serde_json::to_string(&Choice::Minus).unwrap(), "\"-\"");
    }
}
