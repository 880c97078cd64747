//! The assistant facade: one object owning the resolver, knowledge base,
//! schedule store and reply generator.

use crate::brain::classifier::ClassifierArtifact;
use crate::brain::intent::{IntentResult, IntentTaxonomy};
use crate::brain::resolver::{IntentResolver, ModelInfo};
use crate::config::AssistantConfig;
use crate::dialogue::ResponseGenerator;
use crate::error::Result;
use crate::knowledge::KnowledgeBase;
use crate::schedule::{Schedule, ScheduleStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// A resolved intent together with the reply text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub intent: IntentResult,
    pub text: String,
}

pub struct Assistant {
    resolver: IntentResolver,
    responder: ResponseGenerator,
    store: Arc<ScheduleStore>,
}

impl Assistant {
    /// Assemble from already-loaded parts
    pub fn new(
        taxonomy: Arc<IntentTaxonomy>,
        knowledge: Arc<KnowledgeBase>,
        resolver: IntentResolver,
    ) -> Self {
        let store = Arc::new(ScheduleStore::new());
        let responder = ResponseGenerator::new(taxonomy, knowledge, store.clone());
        Self {
            resolver,
            responder,
            store,
        }
    }

    /// Load documents and the optional classifier artifact named by `config`.
    ///
    /// Missing or unreadable documents are errors; a missing artifact only
    /// degrades to rule-based resolution.
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        config.validate()?;
        let taxonomy = Arc::new(IntentTaxonomy::from_file(&config.intents_path)?);
        let knowledge = Arc::new(KnowledgeBase::from_file(&config.knowledge_path)?);
        let resolver = IntentResolver::load(
            taxonomy.clone(),
            config.tokenizer.build(),
            config.thresholds,
            config.model_path.as_deref(),
        );
        info!("Assistant ready ({:?})", resolver);
        Ok(Self::new(taxonomy, knowledge, resolver))
    }

    pub fn resolve_intent(&self, utterance: &str) -> IntentResult {
        self.resolver.resolve(utterance)
    }

    pub fn generate_reply(&self, intent: &str, utterance: &str, user_id: &str) -> String {
        self.responder.generate(intent, utterance, user_id)
    }

    /// Resolve and reply in one step
    #[instrument(skip(self, utterance))]
    pub fn respond(&self, utterance: &str, user_id: &str) -> Reply {
        let intent = self.resolve_intent(utterance);
        let text = self.generate_reply(&intent.intent, utterance, user_id);
        Reply { intent, text }
    }

    pub fn get_schedule(&self, user_id: &str) -> Schedule {
        self.store.get_schedule(user_id)
    }

    pub fn clear_schedule(&self, user_id: &str) -> bool {
        self.store.clear_schedule(user_id)
    }

    pub fn model_info(&self) -> ModelInfo {
        self.resolver.model_info()
    }

    pub fn store(&self) -> &Arc<ScheduleStore> {
        &self.store
    }
}

/// Train a classifier artifact from the configured taxonomy and write it to `output`.
pub fn train_artifact(config: &AssistantConfig, output: &std::path::Path) -> Result<ClassifierArtifact> {
    let taxonomy = IntentTaxonomy::from_file(&config.intents_path)?;
    let tokenizer = config.tokenizer.build();
    let artifact = ClassifierArtifact::train(&taxonomy, tokenizer.as_ref())?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    artifact.save(output)?;
    Ok(artifact)
}
