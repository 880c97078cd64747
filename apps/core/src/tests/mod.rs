//! Test Module
//!
//! Cross-module test suite for the assistant core.
//!
//! ## Test Categories
//! - `brain_tests`: normalization, similarity properties, cascade resolution
//! - `schedule_tests`: conflict properties, atomic adds, dual-index consistency
//! - `dialogue_tests`: offers, ordinal selection, reply routing
//! - `integration_tests`: full assistant from the bundled data files

pub mod dialogue_tests;
pub mod integration_tests;

use crate::brain::intent::IntentTaxonomy;
use crate::knowledge::KnowledgeBase;
use std::sync::Arc;

pub(crate) const INTENTS_JSON: &str = include_str!("../../data/intents.json");
pub(crate) const KNOWLEDGE_JSON: &str = include_str!("../../data/umss_info.json");

pub(crate) fn bundled_taxonomy() -> Arc<IntentTaxonomy> {
    Arc::new(IntentTaxonomy::from_json_str(INTENTS_JSON).unwrap())
}

pub(crate) fn bundled_knowledge() -> Arc<KnowledgeBase> {
    Arc::new(KnowledgeBase::from_json_str(KNOWLEDGE_JSON).unwrap())
}
