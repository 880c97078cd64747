//! Campus knowledge base: teachers per subject, rooms, valorados and office hours.
//!
//! Loaded once from the knowledge JSON document and consumed read-only.

use crate::brain::entities::detect_subject;
use crate::error::{AppError, Result};
use crate::models::{
    KnowledgeDocument, RoomLocation, SubjectEntry, TeacherOffer, ValoradoPlace,
};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;
use validator::Validate;

/// A teacher found by name, with the subject key it was listed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherMatch<'a> {
    pub subject_key: &'a str,
    pub teacher: &'a TeacherOffer,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    document: KnowledgeDocument,
}

impl KnowledgeBase {
    pub fn new(document: KnowledgeDocument) -> Result<Self> {
        for entry in &document.catalog {
            entry.validate()?;
        }
        for (subject, teachers) in &document.teachers {
            for teacher in teachers {
                teacher.validate().map_err(|e| {
                    AppError::Validation(format!("teacher listed under {}: {}", subject, e))
                })?;
            }
        }
        Ok(Self { document })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Self::new(serde_json::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let kb = Self::from_json_str(&content)?;
        info!(
            "Loaded knowledge base from {} ({} subjects, {} valorados places)",
            path.as_ref().display(),
            kb.document.teachers.len(),
            kb.document.valorados.len()
        );
        Ok(kb)
    }

    /// Teachers offering a subject; empty when the key is unknown
    pub fn teachers_for(&self, subject_key: &str) -> &[TeacherOffer] {
        self.document
            .teachers
            .get(subject_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Find which building and floor a room code belongs to (case-insensitive)
    pub fn locate_room(&self, room: &str) -> Option<RoomLocation> {
        self.document.rooms.iter().find_map(|(building, floors)| {
            floors.iter().find_map(|(floor, rooms)| {
                rooms
                    .iter()
                    .find(|r| r.eq_ignore_ascii_case(room))
                    .map(|r| RoomLocation {
                        room: r.clone(),
                        building: building.clone(),
                        floor: floor.clone(),
                    })
            })
        })
    }

    pub fn valorados(&self) -> &[ValoradoPlace] {
        &self.document.valorados
    }

    pub fn office_hours(&self) -> &BTreeMap<String, String> {
        &self.document.office_hours
    }

    /// Teachers whose name contains `query`, case-insensitive
    pub fn search_teacher(&self, query: &str) -> Vec<TeacherMatch<'_>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.document
            .teachers
            .iter()
            .flat_map(|(subject_key, teachers)| {
                teachers.iter().map(move |teacher| TeacherMatch {
                    subject_key: subject_key.as_str(),
                    teacher,
                })
            })
            .filter(|m| m.teacher.name.to_lowercase().contains(&query))
            .collect()
    }

    pub fn catalog(&self) -> &[SubjectEntry] {
        &self.document.catalog
    }

    /// First catalog subject mentioned in free text
    pub fn detect_subject(&self, text: &str) -> Option<&SubjectEntry> {
        detect_subject(&self.document.catalog, text)
    }

    pub fn subject_by_intent(&self, intent: &str) -> Option<&SubjectEntry> {
        self.document.catalog.iter().find(|s| s.intent == intent)
    }

    pub fn subject_by_key(&self, key: &str) -> Option<&SubjectEntry> {
        self.document.catalog.iter().find(|s| s.key == key)
    }
}
