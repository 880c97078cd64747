//! Numbered option selection.
//!
//! Flow: no pending selection → options presented (numbered listing recorded as
//! pending) → the user answers with an ordinal → committed, or rejected and
//! still pending (out of range, conflicts).

use crate::models::{SubjectEntry, TeacherOffer};
use crate::schedule::{format_readable, CommitOutcome, PendingSelection, ScheduleStore};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Ordinal phrasings, tried in order on the trimmed lowercase input
static ORDINAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bopci[oó]n\s*(\d+)",
        r"\bopci[oó]n\s*n[uú]mero\s*(\d+)",
        r"^(\d+)$",
        r"\bla\s*(\d+)",
        r"\bn[uú]mero\s*(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid regex: ordinal pattern"))
    .collect()
});

/// The option number a reply refers to, if it is an ordinal phrase.
///
/// Numbers too large to index anything come back as `usize::MAX` so the bounds
/// check reports them instead of the text falling through to normal routing.
pub fn parse_ordinal(input: &str) -> Option<usize> {
    let text = input.trim().to_lowercase();
    ORDINAL_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(&text)
            .map(|caps| caps[1].parse::<usize>().unwrap_or(usize::MAX))
    })
}

fn readable_blocks(blocks: &[String]) -> String {
    blocks
        .iter()
        .map(|b| format_readable(b))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Record the subject's options as the user's pending selection and render them.
pub fn offer_options(store: &ScheduleStore, user_id: &str, subject: &SubjectEntry, options: &[TeacherOffer]) -> String {
    store.set_pending(
        user_id,
        PendingSelection {
            subject_name: subject.display_name.clone(),
            options: options.to_vec(),
        },
    );

    let mut response = format!("🗓️ **Horarios disponibles para {}:**\n\n", subject.display_name);
    for (i, option) in options.iter().enumerate() {
        response.push_str(&format!("**Opción {}:**\n", i + 1));
        response.push_str(&format!("👨‍🏫 {}\n", option.name));
        response.push_str(&format!("🕒 {}\n", readable_blocks(&option.time_blocks)));
        if !option.classrooms.is_empty() {
            response.push_str(&format!("📍 Aulas: {}\n", option.classroom_label()));
        }
        response.push_str(&format!("💡 {}\n\n", option.recommendation));
    }

    if !store.get_schedule(user_id).is_empty() {
        let ranked = store.rank_alternatives(user_id, options);
        let conflicts: HashMap<usize, Vec<&str>> = ranked
            .iter()
            .map(|r| (r.index, r.conflicts.iter().map(|(_, c)| c.as_str()).collect()))
            .collect();

        response.push_str("🔍 **Verificando conflictos con tu horario actual...**\n\n");
        for i in 0..options.len() {
            match conflicts.get(&i) {
                Some(found) if !found.is_empty() => {
                    response.push_str(&format!("❌ **Opción {}**: Tiene conflictos\n", i + 1));
                    for conflict in found {
                        response.push_str(&format!("   • Choca con: {}\n", conflict));
                    }
                }
                _ => response.push_str(&format!(
                    "✅ **Opción {}**: Sin conflictos - ¡Disponible!\n",
                    i + 1
                )),
            }
            response.push('\n');
        }

        if let Some(best) = ranked.first().filter(|r| !r.has_conflicts()) {
            if ranked.iter().any(|r| r.has_conflicts()) {
                response.push_str(&format!(
                    "💡 Te sugiero la **Opción {}**, que encaja con tu horario.\n\n",
                    best.index + 1
                ));
            }
        }
    }

    response.push_str("Para seleccionar una opción, simplemente escribe:\n");
    for n in 1..=options.len() {
        response.push_str(&format!("• **'opción {}'** o **'{}'**\n", n, n));
    }
    response
}

/// Handle a reply while a selection is pending. `None` means the reply is not
/// an ordinal (or nothing is pending) and should be routed normally.
pub fn handle_selection(store: &ScheduleStore, user_id: &str, input: &str) -> Option<String> {
    if !store.has_pending(user_id) {
        return None;
    }
    let choice = parse_ordinal(input)?;
    Some(render_outcome(store.commit_pending(user_id, choice)))
}

fn render_outcome(outcome: CommitOutcome) -> String {
    match outcome {
        // The selection vanished between the check and the commit
        CommitOutcome::NothingPending => {
            "No tengo opciones pendientes para ti. Di \"armar horario con [materia]\" para empezar."
                .to_string()
        }
        CommitOutcome::OutOfRange { available, .. } => format!(
            "❌ Opción inválida. Por favor selecciona un número entre 1 y {}.",
            available
        ),
        CommitOutcome::Conflicts { choice, conflicts } => {
            let mut response = format!(
                "❌ **La Opción {} tiene conflictos de horario:**\n\n",
                choice
            );
            for conflict in conflicts {
                response.push_str(&format!("• Choca con: {}\n", conflict));
            }
            response.push_str("\n¿Quieres seleccionar otra opción?");
            response
        }
        CommitOutcome::AlreadyEnrolled { subject_name } => format!(
            "ℹ️ **{}** ya está en tu horario. Si quieres cambiar de docente, primero di \"quitar {} de mi horario\".",
            subject_name,
            subject_name.to_lowercase()
        ),
        CommitOutcome::Committed {
            subject_name,
            option,
            subject_count,
        } => {
            let mut response = String::from("🎉 **¡Materia agregada exitosamente!**\n\n");
            response.push_str(&format!("📚 **{}** ha sido agregado a tu horario\n", subject_name));
            response.push_str(&format!("👨‍🏫 **Profesor:** {}\n", option.name));
            response.push_str(&format!(
                "🕒 **Horarios:** {}\n",
                readable_blocks(&option.time_blocks)
            ));
            response.push_str(&format!("📍 **Aulas:** {}\n\n", option.classroom_label()));
            response.push_str(&format!(
                "📊 **Tienes {} materia{} en tu horario**\n\n",
                subject_count,
                if subject_count == 1 { "" } else { "s" }
            ));
            response.push_str("¿Quieres ver tu horario completo? Di 'ver mi horario'");
            response
        }
    }
}
