//! Keyword-table intent classification.
//!
//! Last tier of the cascade: a fixed, ordered table of intent → substrings.
//! The first intent with any keyword contained in the normalized utterance wins
//! with a fixed confidence.

use super::intent::{IntentResult, ResolutionSource};

/// Confidence assigned to every keyword hit
pub const KEYWORD_CONFIDENCE: f32 = 0.7;

/// Ordered keyword table. Order matters: earlier intents win.
const KEYWORD_TABLE: &[(&str, &[&str])] = &[
    (
        "valorados",
        &["valorados", "segunda", "instancia", "2da", "fotocopias"],
    ),
    ("aulas", &["aula", "salon", "donde", "ubicacion"]),
    (
        "recomendacion_docente",
        &["profesor", "docente", "recomienda", "mejor"],
    ),
    ("algebra", &["algebra", "matematicas"]),
    ("calculo", &["calculo", "derivadas", "integrales"]),
    ("ingles", &["ingles", "english"]),
    ("fisica", &["fisica"]),
    ("programacion", &["programacion", "coding", "programar"]),
    ("horario", &["horario", "armar", "crear", "ver", "mostrar"]),
];

/// Keyword classifier over a static table
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    table: Vec<(String, Vec<String>)>,
    confidence: f32,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordClassifier {
    /// Create a classifier with the built-in table
    pub fn new() -> Self {
        Self::with_confidence(KEYWORD_CONFIDENCE)
    }

    /// Built-in table with a custom hit confidence
    pub fn with_confidence(confidence: f32) -> Self {
        let table = KEYWORD_TABLE
            .iter()
            .map(|(intent, keywords)| {
                (
                    intent.to_string(),
                    keywords.iter().map(|k| k.to_string()).collect(),
                )
            })
            .collect();
        Self { table, confidence }
    }

    /// First matching intent, or `None` when no keyword occurs in the text
    pub fn classify(&self, normalized: &str) -> Option<IntentResult> {
        self.table
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k.as_str())))
            .map(|(intent, _)| {
                IntentResult::new(intent.as_str(), self.confidence, ResolutionSource::Keyword)
            })
    }
}
