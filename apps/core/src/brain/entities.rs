//! Lightweight entity extraction: subjects, classroom codes, actions and numbers.

use crate::models::SubjectEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static CLASSROOM_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}[A-Z]?\b").expect("Invalid regex: classroom code"));
static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").expect("Invalid regex: integer"));

const SUBJECT_KEYWORDS: &[&str] = &["algebra", "calculo", "ingles", "fisica", "programacion"];
const ACTION_KEYWORDS: &[&str] = &[
    "armar", "crear", "ver", "mostrar", "quitar", "eliminar", "agregar", "añadir",
];

/// Entities found in an utterance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    pub subjects: Vec<String>,
    /// Three-digit codes with an optional letter suffix, upper-cased
    pub classrooms: Vec<String>,
    pub actions: Vec<String>,
    pub numbers: Vec<u64>,
}

impl Entities {
    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }
}

/// Extract entities from raw text. Keyword matches are substring matches on the lowercased text.
pub fn extract_entities(text: &str) -> Entities {
    let lower = text.to_lowercase();
    let upper = text.to_uppercase();

    let pick = |keywords: &[&str]| -> Vec<String> {
        keywords
            .iter()
            .filter(|k| lower.contains(*k))
            .map(|k| k.to_string())
            .collect()
    };

    Entities {
        subjects: pick(SUBJECT_KEYWORDS),
        classrooms: CLASSROOM_CODE
            .find_iter(&upper)
            .map(|m| m.as_str().to_string())
            .collect(),
        actions: pick(ACTION_KEYWORDS),
        // Integers too large for u64 are not useful as ordinals or room numbers
        numbers: INTEGER
            .find_iter(text)
            .filter_map(|m| m.as_str().parse().ok())
            .collect(),
    }
}

/// First catalog entry with an alias contained in the lowercased text, in catalog order.
pub fn detect_subject<'a>(catalog: &'a [SubjectEntry], text: &str) -> Option<&'a SubjectEntry> {
    let lower = text.to_lowercase();
    catalog.iter().find(|entry| {
        entry
            .aliases
            .iter()
            .any(|alias| lower.contains(&alias.to_lowercase()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_catalog;

    #[test]
    fn test_extract_entities() {
        let entities = extract_entities("Quiero agregar Física en el aula 691b a las 9");
        assert_eq!(entities.subjects, Vec::<String>::new()); // accented form is not a keyword
        assert_eq!(entities.classrooms, vec!["691B"]);
        assert_eq!(entities.actions, vec!["agregar"]);
        assert_eq!(entities.numbers, vec![9]);
    }

    #[test]
    fn test_extract_subjects_and_actions() {
        let entities = extract_entities("armar horario con calculo y programacion, luego ver");
        assert_eq!(entities.subjects, vec!["calculo", "programacion"]);
        assert!(entities.has_action("armar"));
        assert!(entities.has_action("ver"));
        assert!(!entities.has_action("quitar"));
    }

    #[test]
    fn test_detect_subject_uses_aliases() {
        let catalog = default_catalog();
        let entry = detect_subject(&catalog, "Armar horario con CÁLCULO").unwrap();
        assert_eq!(entry.key, "calculo_1");
        assert_eq!(entry.display_name, "Cálculo I");
        assert!(detect_subject(&catalog, "quiero historia").is_none());
    }
}
