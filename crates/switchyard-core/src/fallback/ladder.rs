//! Intent → ordered candidate table

use super::catalog::ModelCatalog;
use super::intent::Intent;
use crate::error::{SwitchyardError, SwitchyardResult};
use serde::Serialize;
use std::collections::HashMap;

/// One rung of a fallback chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LadderEntry {
    pub provider: String,
    pub model: String,
    /// Human-readable justification, used for logging only
    pub reason: String,
}

impl LadderEntry {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for LadderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Static intent table plus the catalog used to validate candidates.
///
/// Every chain is non-empty and an `Ambiguous` chain always exists, so
/// [`Ladder::get_chain`] never returns an empty slice.
#[derive(Debug, Clone)]
pub struct Ladder {
    chains: HashMap<Intent, Vec<LadderEntry>>,
    catalog: ModelCatalog,
}

impl Ladder {
    pub fn builder() -> LadderBuilder {
        LadderBuilder::new()
    }

    /// Chain for an intent label; unknown labels use the ambiguous chain
    pub fn get_chain(&self, intent: &str) -> &[LadderEntry] {
        self.chain_for(Intent::parse(intent))
    }

    pub fn chain_for(&self, intent: Intent) -> &[LadderEntry] {
        self.chains
            .get(&intent)
            .or_else(|| self.chains.get(&Intent::Ambiguous))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Intents with an explicit chain, in declaration order
    pub fn intents(&self) -> Vec<Intent> {
        Intent::ALL
            .into_iter()
            .filter(|intent| self.chains.contains_key(intent))
            .collect()
    }
}

impl Default for Ladder {
    fn default() -> Self {
        let entry = LadderEntry::new;
        let mut chains = HashMap::new();

        chains.insert(
            Intent::Coding,
            vec![
                entry("anthropic", "claude-3-5-sonnet-latest", "strongest code reasoning"),
                entry("openai", "gpt-4o", "broad language coverage"),
                entry("openrouter", "meta-llama/llama-3.1-70b-instruct", "independent capacity"),
            ],
        );
        chains.insert(
            Intent::Factual,
            vec![
                entry("openai", "gpt-4o-mini", "fast and accurate on lookups"),
                entry("google", "gemini-1.5-flash", "low latency alternative"),
                entry("anthropic", "claude-3-5-haiku-latest", "cross-vendor fallback"),
            ],
        );
        chains.insert(
            Intent::Creative,
            vec![
                entry("anthropic", "claude-3-5-sonnet-latest", "best long-form prose"),
                entry("openai", "gpt-4o", "comparable quality"),
                entry("google", "gemini-1.5-pro", "large context fallback"),
            ],
        );
        chains.insert(
            Intent::Analysis,
            vec![
                entry("openai", "gpt-4o", "structured reasoning"),
                entry("anthropic", "claude-3-5-sonnet-latest", "careful multi-step analysis"),
                entry("google", "gemini-1.5-pro", "large context fallback"),
            ],
        );
        chains.insert(
            Intent::Conversation,
            vec![
                entry("openai", "gpt-4o-mini", "cheap and responsive"),
                entry("anthropic", "claude-3-5-haiku-latest", "cheap cross-vendor fallback"),
                entry("google", "gemini-1.5-flash", "last resort"),
            ],
        );
        chains.insert(
            Intent::Ambiguous,
            vec![
                entry("openai", "gpt-4o-mini", "general purpose default"),
                entry("anthropic", "claude-3-5-haiku-latest", "general purpose fallback"),
                entry("openrouter", "meta-llama/llama-3.1-70b-instruct", "independent capacity"),
            ],
        );

        Self {
            chains,
            catalog: ModelCatalog::builtin(),
        }
    }
}

/// Builder for custom ladders
#[derive(Debug, Clone, Default)]
pub struct LadderBuilder {
    chains: HashMap<Intent, Vec<LadderEntry>>,
    catalog: Option<ModelCatalog>,
}

impl LadderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate to an intent's chain
    pub fn entry(
        mut self,
        intent: Intent,
        provider: impl Into<String>,
        model: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.chains
            .entry(intent)
            .or_default()
            .push(LadderEntry::new(provider, model, reason));
        self
    }

    /// Replace an intent's chain
    pub fn chain(mut self, intent: Intent, entries: Vec<LadderEntry>) -> Self {
        self.chains.insert(intent, entries);
        self
    }

    pub fn catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Build the ladder.
    ///
    /// Without an explicit catalog, every model named in the table is
    /// recognized.
    pub fn build(self) -> SwitchyardResult<Ladder> {
        if let Some((intent, _)) = self.chains.iter().find(|(_, chain)| chain.is_empty()) {
            return Err(SwitchyardError::config_key(
                format!("chain for intent '{}' is empty", intent),
                format!("ladder.{}", intent),
            ));
        }
        if !self.chains.contains_key(&Intent::Ambiguous) {
            return Err(SwitchyardError::config_key(
                "an ambiguous chain is required",
                "ladder.ambiguous",
            ));
        }

        let catalog = self.catalog.unwrap_or_else(|| {
            let mut catalog = ModelCatalog::new();
            for entry in self.chains.values().flatten() {
                catalog.add_model(&entry.provider, entry.model.clone());
            }
            catalog
        });

        Ok(Ladder {
            chains: self.chains,
            catalog,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_chain_is_valid() {
        let ladder = Ladder::default();
        for intent in Intent::ALL {
            let chain = ladder.chain_for(intent);
            assert!(!chain.is_empty(), "{} chain is empty", intent);
            for entry in chain {
                assert!(
                    ladder.catalog().is_recognized(&entry.provider, &entry.model),
                    "{} not in catalog",
                    entry
                );
            }
        }
    }

    #[test]
    fn test_unknown_intent_uses_ambiguous_chain() {
        let ladder = Ladder::default();
        assert_eq!(
            ladder.get_chain("not-a-real-intent"),
            ladder.chain_for(Intent::Ambiguous)
        );
        assert_eq!(ladder.get_chain("coding help")[0].provider, "anthropic");
    }

    #[test]
    fn test_builder_requires_ambiguous() {
        let result = Ladder::builder()
            .entry(Intent::Coding, "openai", "gpt-4o", "only")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_empty_chain() {
        let result = Ladder::builder()
            .entry(Intent::Ambiguous, "openai", "gpt-4o", "default")
            .chain(Intent::Coding, Vec::new())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_missing_intent_falls_back() {
        let ladder = Ladder::builder()
            .entry(Intent::Ambiguous, "local", "tiny", "default")
            .build()
            .unwrap();
        assert_eq!(ladder.chain_for(Intent::Creative)[0].model, "tiny");
        assert!(ladder.catalog().is_recognized("local", "tiny"));
        assert_eq!(ladder.intents(), vec![Intent::Ambiguous]);
    }
}
