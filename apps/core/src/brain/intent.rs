//! Intent taxonomy and classification results.
//!
//! The taxonomy is a read-only document of `{tag, patterns, responses}` entries,
//! loaded once at startup. Tags are plain strings so new intents only need a new
//! JSON entry.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Tag returned when nothing matched above threshold
pub const UNKNOWN_INTENT: &str = "unknown";

/// Which tier of the cascade produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Trained statistical classifier
    Classifier,
    /// Jaccard similarity against taxonomy patterns
    Similarity,
    /// Fixed keyword table
    Keyword,
    /// No tier produced a result
    Fallback,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResolutionSource::Classifier => "classifier",
            ResolutionSource::Similarity => "similarity",
            ResolutionSource::Keyword => "keyword",
            ResolutionSource::Fallback => "fallback",
        };
        write!(f, "{}", label)
    }
}

/// Result of intent classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Detected intent tag
    pub intent: String,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Tier that produced the result
    pub source: ResolutionSource,
}

impl IntentResult {
    pub fn new(intent: impl Into<String>, confidence: f32, source: ResolutionSource) -> Self {
        Self {
            intent: intent.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }

    /// The designated "nothing matched" result
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_INTENT, 0.0, ResolutionSource::Fallback)
    }

    pub fn is_unknown(&self) -> bool {
        self.intent == UNKNOWN_INTENT
    }
}

/// A single taxonomy entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentDefinition {
    pub tag: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub responses: Vec<String>,
}

/// The full intent taxonomy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentTaxonomy {
    pub intents: Vec<IntentDefinition>,
}

impl IntentTaxonomy {
    /// Parse a taxonomy document
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a taxonomy document from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let taxonomy = Self::from_json_str(&content)?;
        info!(
            "Loaded {} intents from {}",
            taxonomy.intents.len(),
            path.as_ref().display()
        );
        Ok(taxonomy)
    }

    /// All tags, in document order
    pub fn tags(&self) -> Vec<String> {
        self.intents.iter().map(|i| i.tag.clone()).collect()
    }

    /// Candidate reply templates for a tag
    pub fn responses_for(&self, tag: &str) -> Option<&[String]> {
        self.intents
            .iter()
            .find(|i| i.tag == tag)
            .map(|i| i.responses.as_slice())
            .filter(|r| !r.is_empty())
    }

    /// Every (tag, pattern) pair, in document order
    pub fn patterns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.intents.iter().flat_map(|intent| {
            intent
                .patterns
                .iter()
                .map(move |p| (intent.tag.as_str(), p.as_str()))
        })
    }

    /// Number of example patterns across all intents
    pub fn sample_count(&self) -> usize {
        self.intents.iter().map(|i| i.patterns.len()).sum()
    }
}
