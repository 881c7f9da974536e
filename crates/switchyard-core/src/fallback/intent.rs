//! Intent labels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse request classification used only to pick a fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Coding,
    Factual,
    Creative,
    Analysis,
    Conversation,
    /// Catch-all for unknown or unclassified labels
    Ambiguous,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::Coding,
        Intent::Factual,
        Intent::Creative,
        Intent::Analysis,
        Intent::Conversation,
        Intent::Ambiguous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Coding => "coding",
            Intent::Factual => "factual",
            Intent::Creative => "creative",
            Intent::Analysis => "analysis",
            Intent::Conversation => "conversation",
            Intent::Ambiguous => "ambiguous",
        }
    }

    /// Lenient label parsing; anything unrecognized is `Ambiguous`
    pub fn parse(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect();
        let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

        match normalized.as_str() {
            "coding" | "code" | "coding help" | "programming" | "debugging" => Intent::Coding,
            "factual" | "fact" | "factual lookup" | "lookup" | "question" => Intent::Factual,
            "creative" | "creative writing" | "writing" | "story" => Intent::Creative,
            "analysis" | "analytical" | "reasoning" | "research" => Intent::Analysis,
            "conversation" | "chat" | "conversational" | "small talk" => Intent::Conversation,
            _ => Intent::Ambiguous,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Intent::parse(s))
    }
}

impl From<&str> for Intent {
    fn from(label: &str) -> Self {
        Intent::parse(label)
    }
}
