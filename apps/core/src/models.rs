use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// A teacher offering a subject, as listed in the knowledge document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Validate)]
pub struct TeacherOffer {
    /// Display name of the teacher.
    #[serde(rename = "nombre")]
    #[validate(length(min = 1))]
    pub name: String,
    /// Time blocks in `<day> <start>-<end>` form, e.g. `"LU 645-815"`.
    #[serde(rename = "horarios", default)]
    pub time_blocks: Vec<String>,
    /// Classroom labels used by this offer.
    #[serde(rename = "aulas", default)]
    pub classrooms: Vec<String>,
    /// Free-text recommendation shown to students.
    #[serde(rename = "recomendacion", default)]
    pub recommendation: String,
}

impl TeacherOffer {
    /// Classrooms joined for display and storage.
    pub fn classroom_label(&self) -> String {
        self.classrooms.join(", ")
    }
}

/// A place where valorados (stamped forms, photocopies) can be obtained.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ValoradoPlace {
    #[serde(rename = "lugar")]
    pub name: String,
    #[serde(rename = "ubicacion")]
    pub location: String,
    #[serde(rename = "horario")]
    pub hours: String,
    #[serde(rename = "contacto", default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// Catalog entry linking an intent tag and free-text aliases to a knowledge key.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Validate)]
pub struct SubjectEntry {
    /// Key into the `docentes` section.
    #[serde(rename = "clave")]
    #[validate(length(min = 1))]
    pub key: String,
    /// Name shown to the user and used as the schedule subject name.
    #[serde(rename = "nombre")]
    #[validate(length(min = 1))]
    pub display_name: String,
    /// Intent tag that refers to this subject.
    pub intent: String,
    /// Lowercase aliases matched as substrings.
    #[serde(rename = "alias", default)]
    #[validate(length(min = 1))]
    pub aliases: Vec<String>,
}

impl SubjectEntry {
    fn new(key: &str, display_name: &str, intent: &str, aliases: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            intent: intent.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Built-in subject catalog, used when the knowledge document has no `materias` section.
pub fn default_catalog() -> Vec<SubjectEntry> {
    vec![
        SubjectEntry::new("algebra_1", "Álgebra I", "algebra", &["algebra", "álgebra"]),
        SubjectEntry::new("calculo_1", "Cálculo I", "calculo", &["calculo", "cálculo"]),
        SubjectEntry::new("fisica_general", "Física General", "fisica", &["fisica", "física"]),
        SubjectEntry::new(
            "introduccion_programacion",
            "Introducción a la Programación",
            "programacion",
            &["programacion", "programación"],
        ),
        SubjectEntry::new("ingles_1", "Inglés I", "ingles", &["ingles", "inglés"]),
    ]
}

/// The knowledge document as stored on disk.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct KnowledgeDocument {
    /// Subject key → teachers offering it.
    #[serde(rename = "docentes", default)]
    pub teachers: BTreeMap<String, Vec<TeacherOffer>>,
    /// Building → floor or wing → room codes.
    #[serde(rename = "aulas", default)]
    pub rooms: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    #[serde(rename = "valorados", default)]
    pub valorados: Vec<ValoradoPlace>,
    /// Office → opening hours.
    #[serde(rename = "horarios_atencion", default)]
    pub office_hours: BTreeMap<String, String>,
    #[serde(rename = "materias", default = "default_catalog")]
    pub catalog: Vec<SubjectEntry>,
}

/// Where a classroom is.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RoomLocation {
    pub room: String,
    pub building: String,
    pub floor: String,
}

impl RoomLocation {
    /// Human-readable location, e.g. `"Edificio principal, piso 2"`.
    pub fn describe(&self) -> String {
        let floor = match self.floor.strip_prefix("piso_") {
            Some(number) => format!("piso {}", number),
            None => humanize(&self.floor),
        };
        format!("{}, {}", humanize(&self.building), floor)
    }
}

/// `"edificio_principal"` → `"Edificio principal"`
fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teacher_offer_field_names() {
        let offer: TeacherOffer = serde_json::from_str(
            r#"{"nombre": "Lic. Ana Rojas", "horarios": ["LU 645-815"], "aulas": ["691A", "692B"], "recomendacion": "Clara"}"#,
        )
        .unwrap();
        assert_eq!(offer.name, "Lic. Ana Rojas");
        assert_eq!(offer.time_blocks, vec!["LU 645-815"]);
        assert_eq!(offer.classroom_label(), "691A, 692B");
        assert!(offer.validate().is_ok());
    }

    #[test]
    fn test_catalog_defaults_when_absent() {
        let doc: KnowledgeDocument = serde_json::from_str(r#"{"docentes": {}}"#).unwrap();
        assert_eq!(doc.catalog.len(), 5);
        assert_eq!(doc.catalog[0].display_name, "Álgebra I");
        assert!(doc.valorados.is_empty());
    }

    #[test]
    fn test_room_location_describe() {
        let location = RoomLocation {
            room: "691A".to_string(),
            building: "edificio_principal".to_string(),
            floor: "piso_2".to_string(),
        };
        assert_eq!(location.describe(), "Edificio principal, piso 2");

        let lab = RoomLocation {
            room: "LAB1".to_string(),
            building: "laboratorios".to_string(),
            floor: "computacion".to_string(),
        };
        assert_eq!(lab.describe(), "Laboratorios, Computacion");
    }
}
