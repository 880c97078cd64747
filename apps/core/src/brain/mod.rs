//! # Brain Module
//!
//! Non-LLM understanding of student utterances.
//!
//! ## Components
//! - `normalizer`: normalization, tokenizers, Jaccard similarity
//! - `intent`: taxonomy document and classification results
//! - `classifier`: trained TF-IDF + centroid artifact
//! - `keywords`: fixed keyword table (last resort)
//! - `entities`: subjects, classroom codes, actions, numbers
//! - `resolver`: the classification cascade

pub mod classifier;
pub mod entities;
pub mod intent;
pub mod keywords;
pub mod normalizer;
pub mod resolver;

pub use classifier::{ClassifierArtifact, IntentModel};
pub use entities::{detect_subject, extract_entities, Entities};
pub use intent::{IntentResult, IntentTaxonomy, ResolutionSource, UNKNOWN_INTENT};
pub use keywords::KeywordClassifier;
pub use normalizer::{normalize, similarity, LemmaTokenizer, Tokenizer, TokenizerKind, WhitespaceTokenizer};
pub use resolver::{IntentResolver, ModelInfo, ModelKind, ResolutionStrategy};
