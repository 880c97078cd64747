//! Dialogue Tests
//!
//! Option offers, ordinal selection and the reply routing paths, driven through
//! `ResponseGenerator` with explicit intents.

use super::{bundled_knowledge, bundled_taxonomy};
use crate::dialogue::ResponseGenerator;
use crate::schedule::ScheduleStore;
use std::sync::Arc;

fn setup() -> (ResponseGenerator, Arc<ScheduleStore>) {
    let store = Arc::new(ScheduleStore::new());
    let generator = ResponseGenerator::new(bundled_taxonomy(), bundled_knowledge(), store.clone());
    (generator, store)
}

#[cfg(test)]
mod selection_flow_tests {
    use super::*;

    #[test]
    fn test_offer_then_select_second_of_three() {
        let (generator, store) = setup();

        let offer = generator.generate("horario", "armar horario con álgebra", "u1");
        assert!(offer.contains("Horarios disponibles para Álgebra I"));
        assert!(offer.contains("**Opción 3:**"));
        assert!(offer.contains("Lun 06:45-08:15"));
        assert_eq!(store.pending("u1").unwrap().options.len(), 3);

        let reply = generator.generate("unknown", "2", "u1");
        assert!(reply.contains("¡Materia agregada exitosamente!"));
        assert!(reply.contains("Ing. Marco Antonio Pérez"));
        assert!(reply.contains("Mar 09:45-11:15, Jue 09:45-11:15"));
        assert!(reply.contains("Tienes 1 materia en tu horario"));

        assert!(store.pending("u1").is_none());
        let schedule = store.get_schedule("u1");
        assert_eq!(schedule.subjects["Álgebra I"].teacher, "Ing. Marco Antonio Pérez");
    }

    #[test]
    fn test_out_of_range_then_valid() {
        let (generator, store) = setup();
        generator.generate("horario", "armar horario con álgebra", "u1");

        let reply = generator.generate("unknown", "5", "u1");
        assert_eq!(
            reply,
            "❌ Opción inválida. Por favor selecciona un número entre 1 y 3."
        );
        assert!(store.pending("u1").is_some());
        assert!(store.get_schedule("u1").is_empty());

        let reply = generator.generate("unknown", "opción 1", "u1");
        assert!(reply.contains("Lic. Ana María Rojas"));
        assert!(store.pending("u1").is_none());
        assert_eq!(store.get_schedule("u1").subject_count(), 1);
    }

    #[test]
    fn test_conflicting_option_stays_pending() {
        let (generator, store) = setup();
        generator.generate("horario", "armar horario con álgebra", "u1");
        generator.generate("unknown", "1", "u1"); // Rojas: LU/MI 645-815

        let offer = generator.generate("programacion", "agregar programación", "u1");
        assert!(offer.contains("Verificando conflictos con tu horario actual"));
        assert!(offer.contains("✅ **Opción 1**: Sin conflictos"));
        assert!(offer.contains("❌ **Opción 2**: Tiene conflictos"));
        assert!(offer.contains("Choca con: Álgebra I - Lic. Ana María Rojas (LU 645-815)"));
        assert!(offer.contains("Te sugiero la **Opción 1**"));

        let reply = generator.generate("unknown", "la 2", "u1");
        assert!(reply.starts_with("❌ **La Opción 2 tiene conflictos de horario:**"));
        assert!(store.pending("u1").is_some());
        assert_eq!(store.get_schedule("u1").subject_count(), 1);

        let reply = generator.generate("unknown", "opción número 1", "u1");
        assert!(reply.contains("Tienes 2 materias en tu horario"));
    }

    #[test]
    fn test_non_ordinal_reply_routes_normally() {
        let (generator, store) = setup();
        generator.generate("horario", "armar horario con cálculo", "u1");

        let reply = generator.generate("aulas", "dónde queda el aula 625", "u1");
        assert!(reply.contains("Ubicación del Aula 625"));
        assert!(store.pending("u1").is_some());
    }

    #[test]
    fn test_new_offer_replaces_pending() {
        let (generator, store) = setup();
        generator.generate("horario", "armar horario con álgebra", "u1");
        generator.generate("horario", "armar horario con inglés", "u1");

        let pending = store.pending("u1").unwrap();
        assert_eq!(pending.subject_name, "Inglés I");
        assert_eq!(
            generator.generate("unknown", "2", "u1"),
            "❌ Opción inválida. Por favor selecciona un número entre 1 y 1."
        );
    }

    #[test]
    fn test_selecting_enrolled_subject_again() {
        let (generator, store) = setup();
        generator.generate("horario", "armar horario con álgebra", "u1");
        generator.generate("unknown", "3", "u1");
        generator.generate("horario", "armar horario con álgebra", "u1");

        let reply = generator.generate("unknown", "1", "u1");
        assert!(reply.contains("ya está en tu horario"));
        assert!(store.pending("u1").is_none());
    }

    #[test]
    fn test_ordinal_without_pending_is_not_a_selection() {
        let (generator, _) = setup();
        let reply = generator.generate("unknown", "2", "u1");
        assert!(reply.starts_with("No estoy seguro de cómo ayudarte"));
    }
}

#[cfg(test)]
mod routing_tests {
    use super::*;

    #[test]
    fn test_schedule_help_and_build_menu() {
        let (generator, _) = setup();
        let help = generator.generate("horario", "horario", "u1");
        assert!(help.contains("Gestión de Horarios"));

        let menu = generator.generate("horario", "quiero armar mi horario", "u1");
        assert!(menu.contains("¿Con qué materia quieres armar tu horario?"));
        assert!(menu.contains("• Introducción a la Programación"));
    }

    #[test]
    fn test_view_schedule() {
        let (generator, _) = setup();
        assert_eq!(
            generator.generate("horario", "ver mi horario", "u1"),
            "Tu horario está vacío. ¡Empieza agregando materias!"
        );

        generator.generate("horario", "armar horario con física", "u1");
        generator.generate("unknown", "1", "u1");
        let view = generator.generate("saludo", "mostrar horario", "u1");
        assert!(view.contains("**Martes:**"));
        assert!(view.contains("Física General - 815-945"));
        assert!(view.contains("📍 Aula 617, LAB1"));
    }

    #[test]
    fn test_remove_subject_by_name() {
        let (generator, store) = setup();
        assert_eq!(
            generator.generate("horario", "quitar álgebra de mi horario", "u1"),
            "No tienes Álgebra I en tu horario."
        );

        generator.generate("horario", "armar horario con álgebra", "u1");
        generator.generate("unknown", "1", "u1");
        let reply = generator.generate("horario", "quitar álgebra de mi horario", "u1");
        assert!(reply.contains("**Álgebra I** fue quitada de tu horario"));
        assert!(reply.contains("Te quedan 0 materias"));
        assert!(store.get_schedule("u1").is_empty());

        let reply = generator.generate("horario", "borrar algo de mi horario", "u1");
        assert!(reply.starts_with("¿Qué materia quieres quitar?"));
    }

    #[test]
    fn test_subject_information() {
        let (generator, store) = setup();
        let info = generator.generate("calculo", "información de cálculo", "u1");
        assert!(info.contains("📚 **Cálculo I**"));
        assert!(info.contains("**1. Dr. Jorge Vargas**"));
        assert!(info.contains("🕒 Horarios: Lun 08:15-09:45, Mié 08:15-09:45"));
        assert!(info.contains("Solo di \"armar horario con calculo\""));
        assert!(store.pending("u1").is_none());
    }

    #[test]
    fn test_classroom_lookup() {
        let (generator, _) = setup();
        let found = generator.generate("aulas", "dónde queda el aula 691a", "u1");
        assert!(found.contains("Ubicación del Aula 691A"));
        assert!(found.contains("📍 Edificio principal, piso 2"));

        let missing = generator.generate("aulas", "dónde queda el aula 999", "u1");
        assert!(missing.contains("No encontré la ubicación específica del aula 999"));

        let plain = generator.generate("aulas", "dónde están las aulas", "u1");
        assert_eq!(plain, "Las aulas del ciclo básico están en el edificio principal.");
    }

    #[test]
    fn test_teacher_recommendations() {
        let (generator, _) = setup();
        let by_subject =
            generator.generate("recomendacion_docente", "qué profesor me recomiendas para física", "u1");
        assert!(by_subject.contains("Recomendaciones para Física General"));
        assert!(by_subject.contains("• **Ing. Roberto Céspedes** - Laboratorios bien preparados."));

        let by_name = generator.generate("recomendacion_docente", "qué tal es la profesora Quiroga", "u1");
        assert!(by_name.contains("Docentes encontrados"));
        assert!(by_name.contains("**Lic. Carla Quiroga** (Álgebra I)"));
    }

    #[test]
    fn test_valorados_listing() {
        let (generator, _) = setup();
        let reply = generator.generate("valorados", "dónde compro valorados", "u1");
        assert!(reply.starts_with("📄 **Dónde conseguir valorados:**"));
        assert!(reply.contains("🏪 **Caja de la Facultad**"));
        assert!(reply.contains("📞 Contacto: Interno 210"));
        assert_eq!(reply.matches("📞").count(), 1);
    }

    #[test]
    fn test_office_hours() {
        let (generator, store) = setup();
        let reply = generator.generate("horarios_atencion", "horario de atención de kardex", "u1");
        assert!(reply.contains("Horarios de atención"));
        assert!(reply.contains("• **kardex**: 08:30-12:00"));
        assert!(store.pending("u1").is_none());
    }

    #[test]
    fn test_template_and_clarification() {
        let (generator, _) = setup();
        let greeting = generator.generate("saludo", "hola", "u1");
        let templates = bundled_taxonomy().responses_for("saludo").unwrap().to_vec();
        assert!(templates.contains(&greeting));

        let unknown = generator.generate("unknown", "xyz", "u1");
        assert!(unknown.starts_with("No estoy seguro de cómo ayudarte con eso."));
    }
}
