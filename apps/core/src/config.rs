//! Runtime configuration.
//!
//! Values come from environment variables (after loading an optional `.env`
//! file) and fall back to defaults that match the bundled data layout.

use crate::brain::keywords::KEYWORD_CONFIDENCE;
use crate::brain::normalizer::TokenizerKind;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;
use validator::Validate;

/// Minimum classifier probability before the rule-based tiers are consulted
pub const DEFAULT_CLASSIFIER_MIN_CONFIDENCE: f32 = 0.3;
/// Minimum Jaccard score for a pattern match to stand
pub const DEFAULT_SIMILARITY_MIN_SCORE: f32 = 0.3;

pub const ENV_INTENTS_PATH: &str = "UMSS_INTENTS_PATH";
pub const ENV_KNOWLEDGE_PATH: &str = "UMSS_KNOWLEDGE_PATH";
pub const ENV_MODEL_PATH: &str = "UMSS_MODEL_PATH";
pub const ENV_TOKENIZER: &str = "UMSS_TOKENIZER";
pub const ENV_CLASSIFIER_MIN_CONFIDENCE: &str = "UMSS_CLASSIFIER_MIN_CONFIDENCE";
pub const ENV_SIMILARITY_MIN_SCORE: &str = "UMSS_SIMILARITY_MIN_SCORE";
pub const ENV_KEYWORD_CONFIDENCE: &str = "UMSS_KEYWORD_CONFIDENCE";

/// Cascade thresholds. These are untuned defaults carried over as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct ResolverThresholds {
    /// Below this, the classifier result competes with the rule-based result
    #[validate(range(min = 0.0, max = 1.0))]
    pub classifier_min_confidence: f32,
    /// Below this, the similarity result is replaced by the keyword result
    #[validate(range(min = 0.0, max = 1.0))]
    pub similarity_min_score: f32,
    /// Fixed confidence of a keyword hit
    #[validate(range(min = 0.0, max = 1.0))]
    pub keyword_confidence: f32,
}

impl Default for ResolverThresholds {
    fn default() -> Self {
        Self {
            classifier_min_confidence: DEFAULT_CLASSIFIER_MIN_CONFIDENCE,
            similarity_min_score: DEFAULT_SIMILARITY_MIN_SCORE,
            keyword_confidence: KEYWORD_CONFIDENCE,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub intents_path: PathBuf,
    pub knowledge_path: PathBuf,
    /// Optional trained classifier; absence means rule-based resolution
    pub model_path: Option<PathBuf>,
    pub tokenizer: TokenizerKind,
    pub thresholds: ResolverThresholds,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            intents_path: PathBuf::from("data/intents.json"),
            knowledge_path: PathBuf::from("data/umss_info.json"),
            model_path: Some(PathBuf::from("models/intent_classifier.bin")),
            tokenizer: TokenizerKind::default(),
            thresholds: ResolverThresholds::default(),
        }
    }
}

impl AssistantConfig {
    /// Load `.env` (if any), then read the environment
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_env()
    }

    /// Build from environment variables only, defaults for anything unset
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            intents_path: env::var(ENV_INTENTS_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.intents_path),
            knowledge_path: env::var(ENV_KNOWLEDGE_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.knowledge_path),
            model_path: match env::var(ENV_MODEL_PATH) {
                Ok(value) if value.trim().is_empty() => None,
                Ok(value) => Some(PathBuf::from(value)),
                Err(_) => defaults.model_path,
            },
            tokenizer: parse_var(ENV_TOKENIZER)?.unwrap_or(defaults.tokenizer),
            thresholds: ResolverThresholds {
                classifier_min_confidence: parse_var(ENV_CLASSIFIER_MIN_CONFIDENCE)?
                    .unwrap_or(defaults.thresholds.classifier_min_confidence),
                similarity_min_score: parse_var(ENV_SIMILARITY_MIN_SCORE)?
                    .unwrap_or(defaults.thresholds.similarity_min_score),
                keyword_confidence: parse_var(ENV_KEYWORD_CONFIDENCE)?
                    .unwrap_or(defaults.thresholds.keyword_confidence),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check threshold ranges
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        Ok(())
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}
