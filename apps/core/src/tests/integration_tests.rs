//! Integration Tests
//!
//! The full assistant built from the bundled data files: resolve, reply,
//! schedule access and classifier artifact handling.

use crate::assistant::{train_artifact, Assistant};
use crate::brain::{ModelKind, ResolutionSource};
use crate::config::AssistantConfig;
use crate::error::AppError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn data_path(file: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(file)
}

fn config(model_path: Option<PathBuf>) -> AssistantConfig {
    AssistantConfig {
        intents_path: data_path("intents.json"),
        knowledge_path: data_path("umss_info.json"),
        model_path,
        ..AssistantConfig::default()
    }
}

fn rule_based_assistant() -> Assistant {
    Assistant::from_config(&config(None)).unwrap()
}

#[cfg(test)]
mod conversation_tests {
    use super::*;

    #[test]
    fn test_greeting() {
        let assistant = rule_based_assistant();
        let reply = assistant.respond("hola", "u1");
        assert_eq!(reply.intent.intent, "saludo");
        assert!(reply.text.starts_with("¡Hola!"));
    }

    #[test]
    fn test_keyword_fallback_end_to_end() {
        let assistant = rule_based_assistant();
        let intent = assistant.resolve_intent("fotocopias");
        assert_eq!(intent.intent, "valorados");
        assert_eq!(intent.confidence, 0.7);

        let reply = assistant.respond("fotocopias", "u1");
        assert!(reply.text.contains("Dónde conseguir valorados"));
    }

    #[test]
    fn test_full_schedule_conversation() {
        let assistant = rule_based_assistant();

        let offer = assistant.respond("Quiero armar horario con álgebra", "ana");
        assert!(offer.text.contains("Horarios disponibles para Álgebra I"));

        let out_of_range = assistant.respond("5", "ana");
        assert!(out_of_range.text.contains("entre 1 y 3"));

        let committed = assistant.respond("1", "ana");
        assert!(committed.text.contains("¡Materia agregada exitosamente!"));

        let offer = assistant.respond("armar horario con programación", "ana");
        assert!(offer.text.contains("❌ **Opción 2**: Tiene conflictos"));
        let rejected = assistant.respond("opción 2", "ana");
        assert!(rejected.text.contains("tiene conflictos de horario"));
        let committed = assistant.respond("opción 1", "ana");
        assert!(committed.text.contains("Tienes 2 materias"));

        let schedule = assistant.get_schedule("ana");
        assert_eq!(schedule.subject_count(), 2);
        assert!(schedule.subjects.contains_key("Introducción a la Programación"));

        let view = assistant.respond("ver mi horario", "ana");
        assert!(view.text.contains("📚 **Total de materias:** 2"));

        assert!(assistant.get_schedule("otro").is_empty());
        assert!(assistant.clear_schedule("ana"));
        assert!(assistant.get_schedule("ana").is_empty());
    }

    #[test]
    fn test_clear_keeps_pending_selection() {
        let assistant = rule_based_assistant();
        assistant.respond("armar horario con cálculo", "u1");
        assert!(assistant.clear_schedule("u1"));
        assert!(assistant.store().has_pending("u1"));
        let reply = assistant.respond("2", "u1");
        assert!(reply.text.contains("Ing. Lucía Fernández"));
    }

    #[test]
    fn test_unknown_utterance_gets_clarification() {
        let assistant = rule_based_assistant();
        let reply = assistant.respond("qwerty", "u1");
        assert!(reply.intent.is_unknown());
        assert!(reply.text.starts_with("No estoy seguro"));
    }

    #[test]
    fn test_assistant_is_shared_across_threads() {
        let assistant = Arc::new(rule_based_assistant());
        std::thread::scope(|scope| {
            for user in ["a", "b", "c", "d"] {
                let assistant = assistant.clone();
                scope.spawn(move || {
                    assistant.respond("armar horario con física", user);
                    assistant.respond("2", user);
                });
            }
        });
        for user in ["a", "b", "c", "d"] {
            let schedule = assistant.get_schedule(user);
            assert_eq!(schedule.subjects["Física General"].teacher, "Lic. Patricia Soliz");
        }
    }
}

#[cfg(test)]
mod artifact_tests {
    use super::*;

    #[test]
    fn test_train_save_and_serve() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("models").join("intent_classifier.bin");

        let artifact = train_artifact(&config(None), &model_path).unwrap();
        assert!(model_path.exists());
        assert_eq!(artifact.version, "1.0");

        let assistant = Assistant::from_config(&config(Some(model_path))).unwrap();
        let info = assistant.model_info();
        assert_eq!(info.kind, ModelKind::MachineLearning);
        assert_eq!(info.accuracy, artifact.accuracy);
        assert_eq!(info.labels, artifact.intent_labels);

        let intent = assistant.resolve_intent("hola");
        assert_eq!(intent.intent, "saludo");
        assert_eq!(intent.source, ResolutionSource::Classifier);
    }

    #[test]
    fn test_corrupt_artifact_degrades_to_rules() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("intent_classifier.bin");
        std::fs::write(&model_path, [0xFFu8; 64]).unwrap();

        let assistant = Assistant::from_config(&config(Some(model_path))).unwrap();
        assert_eq!(assistant.model_info().kind, ModelKind::RuleBased);
        assert_eq!(assistant.resolve_intent("hola").intent, "saludo");
    }

    #[test]
    fn test_missing_documents_are_errors() {
        let mut broken = config(None);
        broken.knowledge_path = data_path("missing.json");
        let err = Assistant::from_config(&broken).err().unwrap();
        assert!(matches!(err, AppError::Io(_)));
    }
}
