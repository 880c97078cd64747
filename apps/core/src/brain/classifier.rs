//! Trained intent classifier artifact.
//!
//! A TF-IDF vectorizer (unigrams + bigrams) followed by a nearest-centroid
//! classifier whose cosine scores are turned into a probability distribution
//! with a softmax. The whole pipeline plus its metadata is persisted as a single
//! `bincode` blob.

use super::intent::IntentTaxonomy;
use super::normalizer::{normalize, Tokenizer};
use crate::error::{AppError, Result};
use bincode::Options;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info};

/// Format version written into every artifact. Artifacts with another version are rejected.
pub const ARTIFACT_FORMAT_VERSION: &str = "1.0";

const MAX_FEATURES: usize = 1000;
const MAX_DOCUMENT_FREQUENCY: f32 = 0.8;
const SOFTMAX_SHARPNESS: f32 = 10.0;
const MAX_ARTIFACT_BYTES: u64 = 64 * 1024 * 1024;

/// Encoding used for artifacts. The size limit rejects corrupt length prefixes before allocating.
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_ARTIFACT_BYTES)
}

/// Minimal interface the resolver needs from a trained model.
pub trait IntentModel: Send + Sync {
    /// Most probable label for already-tokenized text
    fn predict(&self, text: &str) -> Result<String>;

    /// Probability for every label, in label order
    fn predict_proba(&self, text: &str) -> Result<Vec<(String, f32)>>;

    /// Label set the model was trained on
    fn labels(&self) -> &[String];
}

/// TF-IDF vectorizer over unigrams and bigrams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfIdfVectorizer {
    fn terms(document: &str) -> Vec<String> {
        let words: Vec<&str> = document.split_whitespace().collect();
        let mut terms: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        terms.extend(words.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
        terms
    }

    /// Fit vocabulary and IDF weights on a corpus
    pub fn fit(documents: &[String]) -> Self {
        let n_documents = documents.len();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut corpus_frequency: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms = Self::terms(doc);
            for term in &terms {
                *corpus_frequency.entry(term.clone()).or_insert(0) += 1;
            }
            let unique: HashSet<String> = terms.into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        // max_df only makes sense with a handful of documents
        let mut candidates: Vec<(String, usize)> = corpus_frequency
            .into_iter()
            .filter(|(term, _)| {
                n_documents < 5
                    || (document_frequency[term] as f32 / n_documents as f32)
                        <= MAX_DOCUMENT_FREQUENCY
            })
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        candidates.truncate(MAX_FEATURES);

        let mut kept: Vec<String> = candidates.into_iter().map(|(term, _)| term).collect();
        kept.sort();

        let vocabulary: HashMap<String, usize> = kept
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();

        let mut idf = vec![0.0; vocabulary.len()];
        for (term, &idx) in &vocabulary {
            let df = document_frequency.get(term).copied().unwrap_or(0);
            // Smoothed IDF = ln((N + 1) / (df + 1)) + 1
            idf[idx] = ((n_documents as f32 + 1.0) / (df as f32 + 1.0)).ln() + 1.0;
        }

        Self { vocabulary, idf }
    }

    /// L2-normalized TF-IDF vector. All zeros when no term is in the vocabulary.
    pub fn transform(&self, document: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.vocabulary.len()];
        for term in Self::terms(document) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                vector[idx] += 1.0;
            }
        }
        for (idx, value) in vector.iter_mut().enumerate() {
            *value *= self.idf[idx];
        }
        l2_normalize(&mut vector);
        vector
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

/// One normalized centroid per label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidClassifier {
    labels: Vec<String>,
    centroids: Vec<Vec<f32>>,
}

impl CentroidClassifier {
    fn fit(vectors: &[Vec<f32>], labels: &[String], dimensions: usize) -> Self {
        let mut sums: BTreeMap<&str, (Vec<f32>, usize)> = BTreeMap::new();
        for (vector, label) in vectors.iter().zip(labels) {
            let entry = sums
                .entry(label.as_str())
                .or_insert_with(|| (vec![0.0; dimensions], 0));
            for (acc, value) in entry.0.iter_mut().zip(vector) {
                *acc += value;
            }
            entry.1 += 1;
        }

        let mut out_labels = Vec::with_capacity(sums.len());
        let mut centroids = Vec::with_capacity(sums.len());
        for (label, (mut sum, count)) in sums {
            for value in sum.iter_mut() {
                *value /= count as f32;
            }
            l2_normalize(&mut sum);
            out_labels.push(label.to_string());
            centroids.push(sum);
        }

        Self {
            labels: out_labels,
            centroids,
        }
    }

    fn probabilities(&self, vector: &[f32]) -> Result<Vec<f32>> {
        if self.centroids.is_empty() {
            return Err(AppError::Classifier("classifier has no labels".to_string()));
        }

        let mut scores = Vec::with_capacity(self.centroids.len());
        for centroid in &self.centroids {
            if centroid.len() != vector.len() {
                return Err(AppError::Classifier(format!(
                    "feature size mismatch: centroid {} vs input {}",
                    centroid.len(),
                    vector.len()
                )));
            }
            let cosine: f32 = centroid.iter().zip(vector).map(|(a, b)| a * b).sum();
            scores.push(cosine * SOFTMAX_SHARPNESS);
        }

        let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        Ok(exps.into_iter().map(|e| e / total).collect())
    }
}

/// Vectorizer + classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    vectorizer: TfIdfVectorizer,
    classifier: CentroidClassifier,
}

impl Pipeline {
    fn fit(documents: &[String], labels: &[String]) -> Self {
        let vectorizer = TfIdfVectorizer::fit(documents);
        let vectors: Vec<Vec<f32>> = documents.iter().map(|d| vectorizer.transform(d)).collect();
        let classifier = CentroidClassifier::fit(&vectors, labels, vectorizer.vocabulary_size());
        Self {
            vectorizer,
            classifier,
        }
    }

    fn best(&self, text: &str) -> Result<(String, f32)> {
        let probabilities = self
            .classifier
            .probabilities(&self.vectorizer.transform(text))?;
        probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(idx, p)| (self.classifier.labels[idx].clone(), *p))
            .ok_or_else(|| AppError::Classifier("empty probability distribution".to_string()))
    }
}

/// Persisted model plus metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub version: String,
    pub accuracy: f32,
    pub intent_labels: Vec<String>,
    pub training_samples: usize,
    pub trained_at: DateTime<Utc>,
    pipeline: Pipeline,
}

impl ClassifierArtifact {
    /// Train on `(label, preprocessed text)` samples
    pub fn fit(samples: &[(String, String)]) -> Result<Self> {
        if samples.len() < 2 {
            return Err(AppError::Validation(
                "not enough data to train the classifier".to_string(),
            ));
        }

        let (labels, documents): (Vec<String>, Vec<String>) = samples.iter().cloned().unzip();
        let accuracy = estimate_accuracy(&documents, &labels);
        let pipeline = Pipeline::fit(&documents, &labels);

        let mut intent_labels: Vec<String> = labels.clone();
        intent_labels.sort();
        intent_labels.dedup();

        info!(
            "Trained classifier on {} samples, {} labels, {} features (accuracy {:.3})",
            samples.len(),
            intent_labels.len(),
            pipeline.vectorizer.vocabulary_size(),
            accuracy
        );

        Ok(Self {
            version: ARTIFACT_FORMAT_VERSION.to_string(),
            accuracy,
            intent_labels,
            training_samples: samples.len(),
            trained_at: Utc::now(),
            pipeline,
        })
    }

    /// Train on every taxonomy pattern, preprocessed the same way utterances are at resolution time
    pub fn train(taxonomy: &IntentTaxonomy, tokenizer: &dyn Tokenizer) -> Result<Self> {
        let samples: Vec<(String, String)> = taxonomy
            .patterns()
            .map(|(tag, pattern)| {
                let text = tokenizer.tokenize(&normalize(pattern)).join(" ");
                (tag.to_string(), text)
            })
            .collect();
        debug!(
            "Prepared {} training samples from {} intents",
            taxonomy.sample_count(),
            taxonomy.intents.len()
        );
        Self::fit(&samples)
    }

    /// Write the artifact as a bincode blob
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        codec().serialize_into(writer, self)?;
        info!("Classifier artifact saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Read and validate an artifact
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let artifact: ClassifierArtifact = codec().deserialize_from(reader)?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<()> {
        if self.version != ARTIFACT_FORMAT_VERSION {
            return Err(AppError::Artifact(format!(
                "unsupported artifact version {} (expected {})",
                self.version, ARTIFACT_FORMAT_VERSION
            )));
        }
        let dims = self.pipeline.vectorizer.vocabulary_size();
        if self.pipeline.vectorizer.idf.len() != dims
            || self.pipeline.classifier.centroids.iter().any(|c| c.len() != dims)
            || self.pipeline.classifier.labels.len() != self.pipeline.classifier.centroids.len()
        {
            return Err(AppError::Artifact("inconsistent pipeline dimensions".to_string()));
        }
        Ok(())
    }
}

impl IntentModel for ClassifierArtifact {
    fn predict(&self, text: &str) -> Result<String> {
        self.pipeline.best(text).map(|(label, _)| label)
    }

    fn predict_proba(&self, text: &str) -> Result<Vec<(String, f32)>> {
        let probabilities = self
            .pipeline
            .classifier
            .probabilities(&self.pipeline.vectorizer.transform(text))?;
        Ok(self
            .pipeline
            .classifier
            .labels
            .iter()
            .cloned()
            .zip(probabilities)
            .collect())
    }

    fn labels(&self) -> &[String] {
        &self.intent_labels
    }
}

/// Hold out every fifth sample when there are enough of them, otherwise score on the training set.
fn estimate_accuracy(documents: &[String], labels: &[String]) -> f32 {
    let (train_idx, test_idx): (Vec<usize>, Vec<usize>) = if documents.len() >= 10 {
        (0..documents.len()).partition(|i| i % 5 != 4)
    } else {
        ((0..documents.len()).collect(), (0..documents.len()).collect())
    };

    let pick = |idx: &[usize], from: &[String]| -> Vec<String> {
        idx.iter().map(|&i| from[i].clone()).collect()
    };
    let pipeline = Pipeline::fit(&pick(&train_idx, documents), &pick(&train_idx, labels));

    let correct = test_idx
        .iter()
        .filter(|&&i| {
            pipeline
                .best(&documents[i])
                .map(|(label, _)| label == labels[i])
                .unwrap_or(false)
        })
        .count();

    correct as f32 / test_idx.len() as f32
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<(String, String)> {
        [
            ("saludo", "hola"),
            ("saludo", "bueno día"),
            ("saludo", "hola qué tal"),
            ("horario", "armar horario"),
            ("horario", "ver horario"),
            ("horario", "crear horario semestre"),
            ("valorados", "comprar valorado"),
            ("valorados", "fotocopia valorado"),
        ]
        .iter()
        .map(|(l, t)| (l.to_string(), t.to_string()))
        .collect()
    }

    #[test]
    fn test_fit_and_predict() {
        let artifact = ClassifierArtifact::fit(&samples()).unwrap();
        assert_eq!(artifact.predict("armar mi horario").unwrap(), "horario");
        assert_eq!(artifact.predict("hola").unwrap(), "saludo");
        assert_eq!(
            artifact.intent_labels,
            vec!["horario", "saludo", "valorados"]
        );
        assert_eq!(artifact.training_samples, 8);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let artifact = ClassifierArtifact::fit(&samples()).unwrap();
        let proba = artifact.predict_proba("comprar valorado").unwrap();
        let total: f32 = proba.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-4);
        let best = proba
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .unwrap();
        assert_eq!(best.0, "valorados");
    }

    #[test]
    fn test_unseen_text_is_uniform() {
        let artifact = ClassifierArtifact::fit(&samples()).unwrap();
        let proba = artifact.predict_proba("zzz qqq").unwrap();
        for (_, p) in proba {
            assert!((p - 1.0 / 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_too_few_samples() {
        let one = vec![("saludo".to_string(), "hola".to_string())];
        assert!(ClassifierArtifact::fit(&one).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intent_classifier.bin");
        let artifact = ClassifierArtifact::fit(&samples()).unwrap();
        artifact.save(&path).unwrap();

        let loaded = ClassifierArtifact::load(&path).unwrap();
        assert_eq!(loaded.version, ARTIFACT_FORMAT_VERSION);
        assert_eq!(loaded.intent_labels, artifact.intent_labels);
        assert_eq!(loaded.predict("ver horario").unwrap(), "horario");
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.bin");
        std::fs::write(&path, b"not a model").unwrap();
        assert!(ClassifierArtifact::load(&path).is_err());
        assert!(ClassifierArtifact::load(dir.path().join("missing.bin")).is_err());
    }
}
