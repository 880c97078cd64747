//! Text normalization, tokenization and token-set similarity.
//!
//! Tokenization goes through the [`Tokenizer`] trait. The backend is picked once
//! when the resolver is built (see [`TokenizerKind`]) and never re-probed per call.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

// NOTE: expect() is acceptable here: the patterns are literals and a failure is a build bug.
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("Invalid regex: non-word characters"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));

/// Spanish function words dropped by the lemmatizing tokenizer
const STOPWORDS_ES: &[&str] = &[
    "a", "al", "algo", "algunas", "algunos", "ante", "antes", "como", "con", "contra", "cual",
    "cuando", "de", "del", "desde", "donde", "dónde", "durante", "e", "el", "él", "ella",
    "ellas", "ellos", "en", "entre", "era", "es", "esa", "esas", "ese", "eso", "esos", "esta",
    "está", "estas", "este", "esto", "estos", "estoy", "fue", "ha", "hay", "la", "las", "le",
    "les", "lo", "los", "me", "mi", "mis", "mucho", "muy", "más", "mas", "nada", "ni", "no",
    "nos", "o", "os", "otra", "otro", "para", "pero", "poco", "por", "porque", "que", "qué",
    "quien", "se", "sea", "ser", "si", "sí", "sin", "sobre", "son", "su", "sus", "también",
    "te", "tengo", "ti", "tu", "tus", "tú", "u", "un", "una", "uno", "unos", "unas", "y", "ya",
    "yo",
];

/// Irregular or frequent forms mapped straight to their lemma
const LEMMA_TABLE: &[(&str, &str)] = &[
    ("quiero", "querer"),
    ("quieres", "querer"),
    ("quisiera", "querer"),
    ("puedo", "poder"),
    ("puedes", "poder"),
    ("puede", "poder"),
    ("necesito", "necesitar"),
    ("necesitas", "necesitar"),
    ("busco", "buscar"),
    ("recomiendas", "recomendar"),
    ("recomienda", "recomendar"),
    ("recomiéndame", "recomendar"),
    ("recomiendame", "recomendar"),
    ("ayúdame", "ayudar"),
    ("ayudame", "ayudar"),
    ("dime", "decir"),
    ("muéstrame", "mostrar"),
    ("muestrame", "mostrar"),
    ("estás", "estar"),
    ("buenos", "bueno"),
    ("buenas", "bueno"),
    ("días", "día"),
    ("dias", "día"),
];

/// Lowercase, strip non-word characters, collapse whitespace and trim.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

/// Splits text into content tokens, preserving order.
pub trait Tokenizer: Send + Sync {
    /// Tokenize text. The result may be empty.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

/// Naive backend: whitespace splitting only.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn name(&self) -> &'static str {
        "whitespace"
    }
}

/// Lemmatizing backend for Spanish: strips punctuation around tokens, drops stop
/// words and punctuation-only tokens, then reduces each token to a lemma with a lookup table and plural stripping.
pub struct LemmaTokenizer {
    stopwords: HashSet<String>,
    lemmas: HashMap<String, String>,
}

impl fmt::Debug for LemmaTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LemmaTokenizer")
            .field("stopwords", &self.stopwords.len())
            .field("lemmas", &self.lemmas.len())
            .finish()
    }
}

impl Default for LemmaTokenizer {
    fn default() -> Self {
        Self::spanish()
    }
}

impl LemmaTokenizer {
    /// Create a tokenizer with the built-in Spanish lexicon
    pub fn spanish() -> Self {
        Self {
            stopwords: STOPWORDS_ES.iter().map(|s| s.to_string()).collect(),
            lemmas: LEMMA_TABLE
                .iter()
                .map(|(form, lemma)| (form.to_string(), lemma.to_string()))
                .collect(),
        }
    }

    /// Strip leading and trailing punctuation ("¡hola!" -> "hola"). Punctuation-only tokens become empty.
    fn trim_punctuation(token: &str) -> &str {
        token.trim_matches(|c: char| !c.is_alphanumeric())
    }

    fn lemmatize(&self, token: &str) -> String {
        if let Some(lemma) = self.lemmas.get(token) {
            return lemma.clone();
        }
        if token.chars().all(|c| c.is_numeric()) {
            return token.to_string();
        }

        let len = token.chars().count();
        if token.ends_with("iones") || token.ends_with("ores") {
            return token[..token.len() - 2].to_string();
        }
        if len > 5
            && ["les", "res", "nes", "des"]
                .iter()
                .any(|suffix| token.ends_with(suffix))
        {
            return token[..token.len() - 2].to_string();
        }
        if len > 3 && token.ends_with('s') {
            let before = token[..token.len() - 1].chars().last();
            if matches!(before, Some('a' | 'e' | 'i' | 'o' | 'u')) {
                return token[..token.len() - 1].to_string();
            }
        }
        token.to_string()
    }
}

impl Tokenizer for LemmaTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(Self::trim_punctuation)
            .filter(|token| !token.is_empty())
            .filter(|token| !self.stopwords.contains(*token))
            .map(|token| self.lemmatize(token))
            .collect()
    }

    fn name(&self) -> &'static str {
        "lemma"
    }
}

/// Which tokenizer backend to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    #[default]
    Lemma,
    Whitespace,
}

impl TokenizerKind {
    /// Build the selected backend
    pub fn build(self) -> Arc<dyn Tokenizer> {
        match self {
            TokenizerKind::Lemma => Arc::new(LemmaTokenizer::spanish()),
            TokenizerKind::Whitespace => Arc::new(WhitespaceTokenizer),
        }
    }
}

impl FromStr for TokenizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lemma" => Ok(TokenizerKind::Lemma),
            "whitespace" => Ok(TokenizerKind::Whitespace),
            other => Err(format!("unknown tokenizer '{}'", other)),
        }
    }
}

/// Token-set Jaccard index. Returns 0.0 when either side has no tokens.
pub fn similarity(tokenizer: &dyn Tokenizer, a: &str, b: &str) -> f32 {
    let tokens_a: HashSet<String> = tokenizer.tokenize(a).into_iter().collect();
    let tokens_b: HashSet<String> = tokenizer.tokenize(b).into_iter().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    intersection as f32 / union as f32
}
