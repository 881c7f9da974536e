//! Recognized models per provider

use std::collections::{BTreeMap, BTreeSet};

/// Provider → recognized model names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelCatalog {
    models: BTreeMap<String, BTreeSet<String>>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Models the built-in ladders reference
    pub fn builtin() -> Self {
        Self::new()
            .with_models("openai", ["gpt-4o", "gpt-4o-mini"])
            .with_models(
                "anthropic",
                ["claude-3-5-sonnet-latest", "claude-3-5-haiku-latest"],
            )
            .with_models("google", ["gemini-1.5-pro", "gemini-1.5-flash"])
            .with_models("openrouter", ["meta-llama/llama-3.1-70b-instruct"])
    }

    pub fn with_models<I, S>(mut self, provider: &str, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models
            .entry(provider.to_lowercase())
            .or_default()
            .extend(models.into_iter().map(Into::into));
        self
    }

    pub fn add_model(&mut self, provider: &str, model: impl Into<String>) {
        self.models
            .entry(provider.to_lowercase())
            .or_default()
            .insert(model.into());
    }

    pub fn is_recognized(&self, provider: &str, model: &str) -> bool {
        self.models
            .get(&provider.to_lowercase())
            .is_some_and(|models| models.contains(model))
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn models(&self, provider: &str) -> Vec<&str> {
        self.models
            .get(&provider.to_lowercase())
            .map(|models| models.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}
