//! Intent Resolver - orchestrates the classification cascade.
//!
//! Tiers, in order:
//! 1. Trained classifier (only when an artifact loaded)
//! 2. Jaccard similarity against taxonomy patterns
//! 3. Fixed keyword table
//!
//! Each tier is a [`ResolutionStrategy`]. [`IntentResolver::resolve_normalized`]
//! walks them in order and arbitrates with the configured thresholds: the first
//! result at or above its tier's threshold wins, except that a low-confidence
//! classifier result is kept as a candidate and only replaced by a strictly more
//! confident rule-based result.

use super::classifier::{ClassifierArtifact, IntentModel};
use super::intent::{IntentResult, IntentTaxonomy, ResolutionSource};
use super::keywords::KeywordClassifier;
use super::normalizer::{normalize, similarity, Tokenizer};
use crate::config::ResolverThresholds;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// One tier of the cascade
pub trait ResolutionStrategy: Send + Sync {
    /// Name for logs
    fn name(&self) -> &'static str;

    /// Classify a normalized utterance. `Ok(None)` means "no opinion".
    fn classify(&self, normalized: &str) -> Result<Option<IntentResult>>;

    /// Results below this confidence do not settle the cascade
    fn min_confidence(&self) -> f32;

    /// Whether a below-threshold result stays in the running as a candidate
    fn keeps_low_confidence(&self) -> bool {
        false
    }
}

/// Tier 1: trained classifier
pub struct ClassifierStrategy {
    model: Arc<dyn IntentModel>,
    tokenizer: Arc<dyn Tokenizer>,
    min_confidence: f32,
}

impl ClassifierStrategy {
    pub fn new(
        model: Arc<dyn IntentModel>,
        tokenizer: Arc<dyn Tokenizer>,
        min_confidence: f32,
    ) -> Self {
        Self {
            model,
            tokenizer,
            min_confidence,
        }
    }
}

impl ResolutionStrategy for ClassifierStrategy {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn classify(&self, normalized: &str) -> Result<Option<IntentResult>> {
        let text = self.tokenizer.tokenize(normalized).join(" ");
        let label = self.model.predict(&text)?;
        let confidence = self
            .model
            .predict_proba(&text)?
            .into_iter()
            .map(|(_, p)| p)
            .fold(0.0f32, f32::max);
        Ok(Some(IntentResult::new(
            label,
            confidence,
            ResolutionSource::Classifier,
        )))
    }

    fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    fn keeps_low_confidence(&self) -> bool {
        true
    }
}

/// Tier 2: best Jaccard score over every taxonomy pattern
pub struct SimilarityStrategy {
    /// `(tag, pattern)` pairs, patterns normalized like utterances
    patterns: Vec<(String, String)>,
    tokenizer: Arc<dyn Tokenizer>,
    min_score: f32,
}

impl SimilarityStrategy {
    pub fn new(taxonomy: &IntentTaxonomy, tokenizer: Arc<dyn Tokenizer>, min_score: f32) -> Self {
        let patterns = taxonomy
            .patterns()
            .map(|(tag, pattern)| (tag.to_string(), normalize(pattern)))
            .collect();
        Self {
            patterns,
            tokenizer,
            min_score,
        }
    }
}

impl ResolutionStrategy for SimilarityStrategy {
    fn name(&self) -> &'static str {
        "similarity"
    }

    fn classify(&self, normalized: &str) -> Result<Option<IntentResult>> {
        let mut best: Option<(&str, f32)> = None;
        for (tag, pattern) in &self.patterns {
            let score = similarity(self.tokenizer.as_ref(), normalized, pattern);
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((tag.as_str(), score));
            }
        }
        Ok(best.map(|(tag, score)| IntentResult::new(tag, score, ResolutionSource::Similarity)))
    }

    fn min_confidence(&self) -> f32 {
        self.min_score
    }
}

/// Tier 3: keyword table
pub struct KeywordStrategy {
    classifier: KeywordClassifier,
}

impl KeywordStrategy {
    pub fn new(confidence: f32) -> Self {
        Self {
            classifier: KeywordClassifier::with_confidence(confidence),
        }
    }
}

impl ResolutionStrategy for KeywordStrategy {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn classify(&self, normalized: &str) -> Result<Option<IntentResult>> {
        Ok(self.classifier.classify(normalized))
    }

    fn min_confidence(&self) -> f32 {
        0.0
    }
}

/// Kind of model backing the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    MachineLearning,
    RuleBased,
}

/// Description of the active model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub kind: ModelKind,
    pub version: String,
    pub accuracy: f32,
    pub labels: Vec<String>,
}

/// Intent resolver over an ordered list of strategies
pub struct IntentResolver {
    taxonomy: Arc<IntentTaxonomy>,
    tokenizer: Arc<dyn Tokenizer>,
    artifact: Option<Arc<ClassifierArtifact>>,
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl IntentResolver {
    /// Rule-based resolver (similarity + keywords)
    pub fn new(
        taxonomy: Arc<IntentTaxonomy>,
        tokenizer: Arc<dyn Tokenizer>,
        thresholds: ResolverThresholds,
    ) -> Self {
        let strategies = Self::rule_strategies(&taxonomy, &tokenizer, &thresholds);
        info!(
            "Intent resolver ready (rule-based, tokenizer: {})",
            tokenizer.name()
        );
        Self {
            taxonomy,
            tokenizer,
            artifact: None,
            strategies,
        }
    }

    /// Resolver backed by a trained artifact, with the rule-based tiers behind it
    pub fn with_artifact(
        taxonomy: Arc<IntentTaxonomy>,
        tokenizer: Arc<dyn Tokenizer>,
        thresholds: ResolverThresholds,
        artifact: ClassifierArtifact,
    ) -> Self {
        let artifact = Arc::new(artifact);
        let mut resolver = Self::with_model(
            taxonomy,
            tokenizer,
            thresholds,
            artifact.clone() as Arc<dyn IntentModel>,
        );
        resolver.artifact = Some(artifact);
        resolver
    }

    /// Resolver with any [`IntentModel`] as the first tier
    pub fn with_model(
        taxonomy: Arc<IntentTaxonomy>,
        tokenizer: Arc<dyn Tokenizer>,
        thresholds: ResolverThresholds,
        model: Arc<dyn IntentModel>,
    ) -> Self {
        let mut strategies: Vec<Box<dyn ResolutionStrategy>> = vec![Box::new(
            ClassifierStrategy::new(model, tokenizer.clone(), thresholds.classifier_min_confidence),
        )];
        strategies.extend(Self::rule_strategies(&taxonomy, &tokenizer, &thresholds));
        info!(
            "Intent resolver ready (classifier + rules, tokenizer: {})",
            tokenizer.name()
        );
        Self {
            taxonomy,
            tokenizer,
            artifact: None,
            strategies,
        }
    }

    /// Try to load an artifact; any failure is logged and the resolver stays rule-based
    pub fn load(
        taxonomy: Arc<IntentTaxonomy>,
        tokenizer: Arc<dyn Tokenizer>,
        thresholds: ResolverThresholds,
        model_path: Option<&Path>,
    ) -> Self {
        let Some(path) = model_path else {
            info!("No classifier artifact configured, using rule-based classifier");
            return Self::new(taxonomy, tokenizer, thresholds);
        };

        match ClassifierArtifact::load(path) {
            Ok(artifact) => {
                info!(
                    "Classifier artifact loaded from {} (version {}, accuracy {:.3})",
                    path.display(),
                    artifact.version,
                    artifact.accuracy
                );
                Self::with_artifact(taxonomy, tokenizer, thresholds, artifact)
            }
            Err(e) => {
                warn!(
                    "Failed to load classifier artifact from {}: {}. Using rule-based classifier",
                    path.display(),
                    e
                );
                Self::new(taxonomy, tokenizer, thresholds)
            }
        }
    }

    fn rule_strategies(
        taxonomy: &Arc<IntentTaxonomy>,
        tokenizer: &Arc<dyn Tokenizer>,
        thresholds: &ResolverThresholds,
    ) -> Vec<Box<dyn ResolutionStrategy>> {
        vec![
            Box::new(SimilarityStrategy::new(
                taxonomy,
                tokenizer.clone(),
                thresholds.similarity_min_score,
            )),
            Box::new(KeywordStrategy::new(thresholds.keyword_confidence)),
        ]
    }

    /// Whether a trained artifact is in use
    pub fn model_loaded(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Resolve a raw utterance
    #[instrument(skip(self), fields(tokenizer = self.tokenizer.name()))]
    pub fn resolve(&self, utterance: &str) -> IntentResult {
        let normalized = normalize(utterance);
        let result = self.resolve_normalized(&normalized);
        debug!(
            intent = %result.intent,
            confidence = result.confidence,
            source = %result.source,
            "Resolved intent"
        );
        result
    }

    /// Run the cascade on already-normalized text
    pub fn resolve_normalized(&self, normalized: &str) -> IntentResult {
        let mut candidate: Option<IntentResult> = None;

        for strategy in &self.strategies {
            match strategy.classify(normalized) {
                Ok(Some(result)) if result.confidence >= strategy.min_confidence() => {
                    return arbitrate(candidate, result);
                }
                Ok(Some(result)) => {
                    debug!(
                        "{} result {} ({:.3}) below threshold {:.3}",
                        strategy.name(),
                        result.intent,
                        result.confidence,
                        strategy.min_confidence()
                    );
                    if strategy.keeps_low_confidence() && candidate.is_none() {
                        candidate = Some(result);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("{} strategy failed, falling through: {}", strategy.name(), e);
                }
            }
        }

        candidate.unwrap_or_else(IntentResult::unknown)
    }

    /// Describe the active model
    pub fn model_info(&self) -> ModelInfo {
        match &self.artifact {
            Some(artifact) => ModelInfo {
                kind: ModelKind::MachineLearning,
                version: artifact.version.clone(),
                accuracy: artifact.accuracy,
                labels: artifact.labels().to_vec(),
            },
            None => ModelInfo {
                kind: ModelKind::RuleBased,
                version: "1.0".to_string(),
                accuracy: 0.0,
                labels: self.taxonomy.tags(),
            },
        }
    }
}

/// A held low-confidence candidate only loses to a strictly more confident result.
fn arbitrate(candidate: Option<IntentResult>, result: IntentResult) -> IntentResult {
    match candidate {
        Some(held) if result.confidence <= held.confidence => held,
        _ => result,
    }
}

impl std::fmt::Debug for IntentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentResolver")
            .field("intents", &self.taxonomy.intents.len())
            .field("tokenizer", &self.tokenizer.name())
            .field("model_loaded", &self.model_loaded())
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Stub model used in tests to drive the classifier tier deterministically
#[cfg(test)]
pub(crate) struct FixedModel {
    pub label: String,
    pub confidence: f32,
    pub fail: bool,
    pub labels: Vec<String>,
}

#[cfg(test)]
impl FixedModel {
    pub fn new(label: &str, confidence: f32) -> Self {
        Self {
            label: label.to_string(),
            confidence,
            fail: false,
            labels: vec![label.to_string()],
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("unused", 0.0)
        }
    }
}

#[cfg(test)]
use crate::error::AppError;

#[cfg(test)]
impl IntentModel for FixedModel {
    fn predict(&self, _text: &str) -> Result<String> {
        if self.fail {
            return Err(AppError::Classifier("stub failure".to_string()));
        }
        Ok(self.label.clone())
    }

    fn predict_proba(&self, _text: &str) -> Result<Vec<(String, f32)>> {
        if self.fail {
            return Err(AppError::Classifier("stub failure".to_string()));
        }
        Ok(vec![(self.label.clone(), self.confidence)])
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::normalizer::{LemmaTokenizer, WhitespaceTokenizer};

    fn taxonomy() -> Arc<IntentTaxonomy> {
        Arc::new(
            IntentTaxonomy::from_json_str(
                r#"{"intents": [
                    {"tag": "saludo", "patterns": ["hola", "buenos días"], "responses": ["¡Hola!"]},
                    {"tag": "horario", "patterns": ["quiero armar mi horario"], "responses": []}
                ]}"#,
            )
            .unwrap(),
        )
    }

    fn tokenizer() -> Arc<dyn Tokenizer> {
        Arc::new(LemmaTokenizer::spanish())
    }

    #[test]
    fn test_similarity_tier() {
        let resolver = IntentResolver::new(taxonomy(), tokenizer(), ResolverThresholds::default());
        let result = resolver.resolve("¡Hola!");
        assert_eq!(result.intent, "saludo");
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.source, ResolutionSource::Similarity);
        assert!(!resolver.model_loaded());
    }

    #[test]
    fn test_keyword_tier() {
        let resolver = IntentResolver::new(taxonomy(), tokenizer(), ResolverThresholds::default());
        let result = resolver.resolve("venden fotocopias?");
        assert_eq!(result.intent, "valorados");
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_unknown() {
        let resolver = IntentResolver::new(taxonomy(), tokenizer(), ResolverThresholds::default());
        assert_eq!(resolver.resolve("gracias"), IntentResult::unknown());
        assert_eq!(resolver.resolve(""), IntentResult::unknown());
    }

    #[test]
    fn test_punctuated_patterns_match() {
        let taxonomy = Arc::new(
            IntentTaxonomy::from_json_str(
                r#"{"intents": [
                    {"tag": "saludo", "patterns": ["¡Hola!"], "responses": []},
                    {"tag": "aulas", "patterns": ["¿Dónde queda el aula?"], "responses": []}
                ]}"#,
            )
            .unwrap(),
        );
        for tok in [tokenizer(), Arc::new(WhitespaceTokenizer) as Arc<dyn Tokenizer>] {
            let resolver = IntentResolver::new(taxonomy.clone(), tok, ResolverThresholds::default());
            let result = resolver.resolve("hola");
            assert_eq!(result.intent, "saludo");
            assert_eq!(result.confidence, 1.0);
            assert_eq!(resolver.resolve("dónde queda el aula").intent, "aulas");
        }
    }

    #[test]
    fn test_confident_classifier_wins() {
        let model = Arc::new(FixedModel::new("despedida", 0.9));
        let resolver =
            IntentResolver::with_model(taxonomy(), tokenizer(), ResolverThresholds::default(), model);
        let result = resolver.resolve("hola");
        assert_eq!(result.intent, "despedida");
        assert_eq!(result.source, ResolutionSource::Classifier);
    }

    #[test]
    fn test_low_confidence_classifier_loses_to_rules() {
        let model = Arc::new(FixedModel::new("despedida", 0.2));
        let resolver =
            IntentResolver::with_model(taxonomy(), tokenizer(), ResolverThresholds::default(), model);
        let result = resolver.resolve("hola");
        assert_eq!(result.intent, "saludo");
        assert_eq!(result.source, ResolutionSource::Similarity);
    }

    #[test]
    fn test_low_confidence_classifier_kept_when_rules_find_nothing() {
        let model = Arc::new(FixedModel::new("despedida", 0.2));
        let resolver =
            IntentResolver::with_model(taxonomy(), tokenizer(), ResolverThresholds::default(), model);
        let result = resolver.resolve("gracias");
        assert_eq!(result.intent, "despedida");
        assert!((result.confidence - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_tie_favors_classifier() {
        let thresholds = ResolverThresholds {
            classifier_min_confidence: 0.8,
            ..ResolverThresholds::default()
        };
        let model = Arc::new(FixedModel::new("despedida", 0.7));
        let resolver = IntentResolver::with_model(taxonomy(), tokenizer(), thresholds, model);
        // keyword hit at 0.7 ties the held classifier result
        let result = resolver.resolve("fotocopias");
        assert_eq!(result.intent, "despedida");
        assert_eq!(result.source, ResolutionSource::Classifier);
    }

    #[test]
    fn test_failing_classifier_falls_back() {
        let model = Arc::new(FixedModel::failing());
        let resolver =
            IntentResolver::with_model(taxonomy(), tokenizer(), ResolverThresholds::default(), model);
        assert_eq!(resolver.resolve("hola").intent, "saludo");
        assert_eq!(resolver.resolve("gracias"), IntentResult::unknown());
    }

    #[test]
    fn test_missing_artifact_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = IntentResolver::load(
            taxonomy(),
            tokenizer(),
            ResolverThresholds::default(),
            Some(&dir.path().join("nope.bin")),
        );
        assert!(!resolver.model_loaded());
        let info = resolver.model_info();
        assert_eq!(info.kind, ModelKind::RuleBased);
        assert_eq!(info.labels, vec!["saludo", "horario"]);
    }

    #[test]
    fn test_loaded_artifact_reports_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let tok = tokenizer();
        ClassifierArtifact::train(&taxonomy(), tok.as_ref())
            .unwrap()
            .save(&path)
            .unwrap();

        let resolver =
            IntentResolver::load(taxonomy(), tok, ResolverThresholds::default(), Some(&path));
        assert!(resolver.model_loaded());
        let info = resolver.model_info();
        assert_eq!(info.kind, ModelKind::MachineLearning);
        assert_eq!(info.labels, vec!["horario", "saludo"]);
        assert_eq!(resolver.resolve("hola").intent, "saludo");
    }
}
