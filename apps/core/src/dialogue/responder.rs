//! Reply generation: routes a resolved intent to the schedule flow, subject
//! information, knowledge lookups or a template reply.

use super::selection::{handle_selection, offer_options};
use crate::brain::entities::extract_entities;
use crate::brain::intent::IntentTaxonomy;
use crate::knowledge::KnowledgeBase;
use crate::models::SubjectEntry;
use crate::schedule::{format_readable, ScheduleStore};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::debug;

const SCHEDULE_INTENT: &str = "horario";
const OFFICE_HOURS_INTENT: &str = "horarios_atencion";
const VIEW_SCHEDULE_PHRASES: &[&str] = &["mi horario", "ver horario", "mostrar horario"];
const REMOVE_WORDS: &[&str] = &["quitar", "eliminar", "borrar"];
const OFFER_WORDS: &[&str] = &["horario", "armar", "agregar"];
const BUILD_ACTIONS: &[&str] = &["armar", "crear", "agregar", "añadir"];
/// Words too short or too generic to search teacher names with
const MIN_NAME_QUERY_LEN: usize = 4;

const CLARIFICATION: &str = "No estoy seguro de cómo ayudarte con eso. ¿Podrías ser más específico? Puedo ayudarte con horarios, materias, ubicaciones y más.";

fn mentions_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

pub struct ResponseGenerator {
    taxonomy: Arc<IntentTaxonomy>,
    knowledge: Arc<KnowledgeBase>,
    store: Arc<ScheduleStore>,
}

impl ResponseGenerator {
    pub fn new(
        taxonomy: Arc<IntentTaxonomy>,
        knowledge: Arc<KnowledgeBase>,
        store: Arc<ScheduleStore>,
    ) -> Self {
        Self {
            taxonomy,
            knowledge,
            store,
        }
    }

    /// Produce the reply for an utterance already resolved to `intent`.
    pub fn generate(&self, intent: &str, utterance: &str, user_id: &str) -> String {
        debug!(intent, user_id, "Generating reply");

        if let Some(reply) = handle_selection(&self.store, user_id, utterance) {
            return reply;
        }

        let lower = utterance.to_lowercase();

        // "horario de atención" is about offices, not the user's schedule
        if intent == SCHEDULE_INTENT
            || (lower.contains(SCHEDULE_INTENT) && intent != OFFICE_HOURS_INTENT)
        {
            return self.schedule_reply(utterance, &lower, user_id);
        }

        if let Some(subject) = self.knowledge.subject_by_intent(intent) {
            return if mentions_any(&lower, OFFER_WORDS) {
                self.offer_subject(subject, user_id)
            } else {
                self.subject_info(subject)
            };
        }

        if mentions_any(&lower, VIEW_SCHEDULE_PHRASES) {
            return self.store.format_display(user_id);
        }

        if let Some(templates) = self.taxonomy.responses_for(intent) {
            let base = templates
                .choose(&mut rand::thread_rng())
                .cloned()
                .unwrap_or_default();
            return match intent {
                "aulas" => self.classroom_reply(utterance, &base),
                "recomendacion_docente" => self.teacher_reply(utterance, &base),
                "valorados" => self.valorados_reply(&base),
                OFFICE_HOURS_INTENT => self.office_hours_reply(&base),
                _ => base,
            };
        }

        CLARIFICATION.to_string()
    }

    fn schedule_reply(&self, utterance: &str, lower: &str, user_id: &str) -> String {
        if mentions_any(lower, REMOVE_WORDS) {
            return self.remove_reply(utterance, user_id);
        }

        // "agregar álgebra a mi horario" is a build request even though it says "mi horario"
        let entities = extract_entities(utterance);
        if BUILD_ACTIONS.iter().any(|a| entities.has_action(a)) {
            return match self.knowledge.detect_subject(utterance) {
                Some(subject) => self.offer_subject(subject, user_id),
                None => self.build_menu(),
            };
        }

        if mentions_any(lower, VIEW_SCHEDULE_PHRASES) {
            return self.store.format_display(user_id);
        }

        "🗓️ **Gestión de Horarios**\n\n\
         Te puedo ayudar a:\n\
         • **Ver tu horario actual**: Di \"ver mi horario\"\n\
         • **Armar horario con materias**: Di \"armar horario con [materia]\"\n\
         • **Agregar materias**: Di \"agregar [materia] a mi horario\"\n\
         • **Quitar materias**: Di \"quitar [materia] de mi horario\"\n\n\
         ¿Qué te gustaría hacer?"
            .to_string()
    }

    fn build_menu(&self) -> String {
        let mut response =
            String::from("🗓️ **Armar Horario**\n\n¿Con qué materia quieres armar tu horario?\n\n📚 **Materias disponibles:**\n");
        for subject in self.knowledge.catalog() {
            response.push_str(&format!("• {}\n", subject.display_name));
        }
        response.push_str(
            "\nSolo di \"armar horario con [materia]\" y te mostraré las opciones disponibles.",
        );
        response
    }

    fn remove_reply(&self, utterance: &str, user_id: &str) -> String {
        let Some(subject) = self.knowledge.detect_subject(utterance) else {
            return "¿Qué materia quieres quitar? Di \"quitar [materia] de mi horario\".".to_string();
        };

        if self.store.remove_subject(user_id, &subject.display_name) {
            let remaining = self.store.get_schedule(user_id).subject_count();
            format!(
                "🗑️ **{}** fue quitada de tu horario.\n\n📊 Te quedan {} materia{}.",
                subject.display_name,
                remaining,
                if remaining == 1 { "" } else { "s" }
            )
        } else {
            format!("No tienes {} en tu horario.", subject.display_name)
        }
    }

    fn offer_subject(&self, subject: &SubjectEntry, user_id: &str) -> String {
        let options = self.knowledge.teachers_for(&subject.key);
        if options.is_empty() {
            return format!(
                "Aún no tengo información de horarios para {}. ¿Te puedo ayudar con otra materia?",
                subject.display_name
            );
        }
        offer_options(&self.store, user_id, subject, options)
    }

    fn subject_info(&self, subject: &SubjectEntry) -> String {
        let teachers = self.knowledge.teachers_for(&subject.key);
        if teachers.is_empty() {
            return format!("No tengo información disponible sobre {}.", subject.display_name);
        }

        let mut response = format!(
            "📚 **{}**\n\n👨‍🏫 **Docentes disponibles:**\n",
            subject.display_name
        );
        for (i, teacher) in teachers.iter().enumerate() {
            response.push_str(&format!("\n**{}. {}**\n", i + 1, teacher.name));
            response.push_str(&format!("💡 {}\n", teacher.recommendation));
            let blocks: Vec<String> = teacher.time_blocks.iter().map(|b| format_readable(b)).collect();
            response.push_str(&format!("🕒 Horarios: {}\n", blocks.join(", ")));
            if !teacher.classrooms.is_empty() {
                response.push_str(&format!("📍 Aulas: {}\n", teacher.classroom_label()));
            }
        }
        response.push_str(&format!(
            "\n¿Te gustaría que te ayude a armar tu horario con {}? Solo di \"armar horario con {}\"",
            subject.display_name, subject.intent
        ));
        response
    }

    fn classroom_reply(&self, utterance: &str, base: &str) -> String {
        let entities = extract_entities(utterance);
        let room = entities
            .classrooms
            .first()
            .cloned()
            .or_else(|| entities.numbers.first().map(|n| n.to_string()));

        let Some(room) = room else {
            return base.to_string();
        };

        match self.knowledge.locate_room(&room) {
            Some(location) => format!(
                "🏛️ **Ubicación del Aula {}**\n\n📍 {}\n\n{}",
                location.room,
                location.describe(),
                base
            ),
            None => format!(
                "🏛️ **Aula {}**\n\n{}\n\n📍 No encontré la ubicación específica del aula {}. Te recomiendo preguntar en secretaría.",
                room, base, room
            ),
        }
    }

    fn teacher_reply(&self, utterance: &str, base: &str) -> String {
        if let Some(subject) = self.knowledge.detect_subject(utterance) {
            let teachers = self.knowledge.teachers_for(&subject.key);
            if !teachers.is_empty() {
                let mut response =
                    format!("👨‍🏫 **Recomendaciones para {}:**\n\n", subject.display_name);
                for teacher in teachers {
                    response.push_str(&format!(
                        "• **{}** - {}\n",
                        teacher.name, teacher.recommendation
                    ));
                }
                response.push_str(&format!("\n{}", base));
                return response;
            }
        }

        // No subject mentioned: try the words of the utterance as teacher names
        let lower = utterance.to_lowercase();
        let mut found: Vec<(String, String, String)> = Vec::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= MIN_NAME_QUERY_LEN)
        {
            for hit in self.knowledge.search_teacher(word) {
                let subject = self
                    .knowledge
                    .subject_by_key(hit.subject_key)
                    .map(|s| s.display_name.clone())
                    .unwrap_or_else(|| hit.subject_key.to_string());
                let entry = (
                    hit.teacher.name.clone(),
                    subject,
                    hit.teacher.recommendation.clone(),
                );
                if !found.contains(&entry) {
                    found.push(entry);
                }
            }
        }

        if found.is_empty() {
            return base.to_string();
        }

        let mut response = String::from("👨‍🏫 **Docentes encontrados:**\n\n");
        for (name, subject, recommendation) in found {
            response.push_str(&format!("• **{}** ({}) - {}\n", name, subject, recommendation));
        }
        response.push_str(&format!("\n{}", base));
        response
    }

    fn valorados_reply(&self, base: &str) -> String {
        let places = self.knowledge.valorados();
        if places.is_empty() {
            return base.to_string();
        }

        let mut response = String::from("📄 **Dónde conseguir valorados:**\n\n");
        for place in places {
            response.push_str(&format!("🏪 **{}**\n", place.name));
            response.push_str(&format!("📍 {}\n", place.location));
            response.push_str(&format!("🕒 Horario: {}\n", place.hours));
            if let Some(contact) = &place.contact {
                response.push_str(&format!("📞 Contacto: {}\n", contact));
            }
            response.push('\n');
        }
        response.push_str("💡 **Consejos adicionales:**\n");
        response.push_str("• Pregunta por material específico de tu materia\n");
        response.push_str("• Algunos profesores tienen sus propias fotocopiadoras recomendadas\n");
        response.push_str("• Consulta con estudiantes de semestres superiores");
        response
    }

    fn office_hours_reply(&self, base: &str) -> String {
        let hours = self.knowledge.office_hours();
        if hours.is_empty() {
            return base.to_string();
        }

        let mut response = String::from("🕒 **Horarios de atención:**\n\n");
        for (office, schedule) in hours {
            response.push_str(&format!("• **{}**: {}\n", office.replace('_', " "), schedule));
        }
        response.push_str(&format!("\n{}", base));
        response
    }
}
