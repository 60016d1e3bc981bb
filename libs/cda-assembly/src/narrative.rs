//! Encounter narrative rendering.
//!
//! Produces both halves of the encounters section from one pass over the
//! encounter list: the human-readable HTML table and the structured
//! encounter activities it references. Row `i` is anchored `#Encounter{i}`
//! (1-based, input order) and the matching activity carries the same anchor
//! as its code's original-text reference, so the counter must stay
//! synchronized between the two emission paths.

use crate::{wire_timestamp, NPI_ROOT};
use cedra_models::{
    CodedValue, EncounterActivity, EncounterRecord, InstanceIdentifier, NullFlavor,
    PerformerEntity, PerformerRecord, PersonName,
};

/// CPT/HCPCS, the code system for encounter type codes.
const ENCOUNTER_TYPE_SYSTEM: &str = "2.16.840.1.113883.6.12";

/// Healthcare provider taxonomy value set (assigned-entity codes).
const PROVIDER_TAXONOMY_SYSTEM: &str = "2.16.840.1.114222.4.11.1066";

/// Output of one rendering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEncounters {
    /// Raw HTML table markup for the section narrative.
    pub narrative: String,
    /// Structured activities, in the same order as the table rows.
    pub activities: Vec<EncounterActivity>,
}

/// Render the narrative table and structured activities for an ordered
/// encounter list. Callers omit the section entirely for an empty list;
/// this function never sees that case in practice but renders a header-only
/// table for it all the same.
pub fn render_encounters(encounters: &[EncounterRecord]) -> RenderedEncounters {
    let mut narrative = String::from("<table>");
    narrative.push_str("<tr><th>Doctor</th><th>Stage</th><th>Encounter Date</th></tr>");

    let mut activities = Vec::with_capacity(encounters.len());
    for (index, encounter) in encounters.iter().enumerate() {
        let anchor = format!("#Encounter{}", index + 1);
        activities.push(encounter_activity(encounter, &anchor));

        narrative.push_str(&format!(
            "<tr ID=\"{}\"><td>{}{}</td><td>{}</td><td>{}</td></tr>",
            anchor,
            encounter.performer.given_name,
            encounter.performer.family_name,
            encounter.stage,
            encounter.effective_time,
        ));
    }

    narrative.push_str("</table>");
    RenderedEncounters {
        narrative,
        activities,
    }
}

fn encounter_activity(encounter: &EncounterRecord, anchor: &str) -> EncounterActivity {
    let mut code = CodedValue::new(&encounter.encounter_type_code, ENCOUNTER_TYPE_SYSTEM);
    code.original_text_reference = Some(anchor.to_string());

    EncounterActivity {
        id: InstanceIdentifier::root(&encounter.id),
        code,
        effective_time: wire_timestamp(encounter.effective_time),
        performer: performer_entity(&encounter.performer),
    }
}

/// The assigned-entity representation of a performer: NPI-rooted id
/// (unknown flavor when no NPI was supplied), taxonomy code, address and
/// the person's name.
fn performer_entity(performer: &PerformerRecord) -> PerformerEntity {
    let id = match &performer.npi {
        Some(npi) => InstanceIdentifier {
            root: Some(NPI_ROOT.to_string()),
            extension: Some(npi.clone()),
            null_flavor: None,
        },
        None => InstanceIdentifier {
            root: Some(NPI_ROOT.to_string()),
            extension: None,
            null_flavor: Some(NullFlavor::Unknown),
        },
    };

    PerformerEntity {
        id,
        code: CodedValue::new(&performer.provider_taxonomy_code, PROVIDER_TAXONOMY_SYSTEM),
        address: crate::contact::format_address(&performer.address),
        name: PersonName {
            given: performer.given_name.clone(),
            family: performer.family_name.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cedra_models::PostalAddress;
    use chrono::{TimeZone, Utc};

    fn performer() -> PerformerRecord {
        PerformerRecord {
            given_name: "Helga".to_string(),
            family_name: "Medico".to_string(),
            npi: Some("1234567".to_string()),
            provider_taxonomy_code: "101YP2500X".to_string(),
            address: PostalAddress {
                city: "Wilmington".to_string(),
                state: "AZ".to_string(),
                postal_code: "09675".to_string(),
                street_lines: vec!["38 Smith St".to_string(), "Unit 6".to_string()],
            },
        }
    }

    fn encounter(id: &str, stage: &str, day: u32) -> EncounterRecord {
        EncounterRecord {
            id: id.to_string(),
            effective_time: Utc.with_ymd_and_hms(2020, 1, day, 10, 0, 0).unwrap(),
            encounter_type_code: "99204".to_string(),
            stage: stage.to_string(),
            performer: performer(),
        }
    }

    #[test]
    fn one_row_per_encounter_with_sequential_anchors() {
        let encounters = vec![
            encounter("e1", "new", 10),
            encounter("e2", "pre-op", 11),
            encounter("e3", "post-op", 12),
        ];
        let rendered = render_encounters(&encounters);

        assert_eq!(rendered.activities.len(), 3);
        assert_eq!(rendered.narrative.matches("<tr ID=").count(), 3);
        for i in 1..=3 {
            let anchor = format!("#Encounter{}", i);
            assert!(rendered.narrative.contains(&format!("<tr ID=\"{}\">", anchor)));
            assert_eq!(
                rendered.activities[i - 1].code.original_text_reference.as_deref(),
                Some(anchor.as_str())
            );
        }
    }

    #[test]
    fn row_cells_hold_name_stage_and_time() {
        let enc = encounter("e1", "new", 10);
        let time_text = enc.effective_time.to_string();
        let rendered = render_encounters(&[enc]);

        // Given and family name are concatenated without a separator.
        assert!(rendered.narrative.contains("<td>HelgaMedico</td>"));
        assert!(rendered.narrative.contains("<td>new</td>"));
        assert!(rendered.narrative.contains(&format!("<td>{}</td>", time_text)));
    }

    #[test]
    fn activity_carries_wire_time_and_type_code() {
        let rendered = render_encounters(&[encounter("e1", "new", 10)]);
        let activity = &rendered.activities[0];

        assert_eq!(activity.effective_time, "20200110100000");
        assert_eq!(activity.code.code.as_deref(), Some("99204"));
        assert_eq!(
            activity.code.code_system.as_deref(),
            Some("2.16.840.1.113883.6.12")
        );
        assert_eq!(activity.id.root.as_deref(), Some("e1"));
    }

    #[test]
    fn performer_without_npi_gets_unknown_flavor() {
        let mut record = performer();
        record.npi = None;
        let entity = performer_entity(&record);

        assert_eq!(entity.id.root.as_deref(), Some(NPI_ROOT));
        assert!(entity.id.extension.is_none());
        assert_eq!(entity.id.null_flavor, Some(NullFlavor::Unknown));
        assert_eq!(entity.name.given, "Helga");
    }

    #[test]
    fn empty_list_renders_header_only_table() {
        let rendered = render_encounters(&[]);
        assert!(rendered.activities.is_empty());
        assert_eq!(
            rendered.narrative,
            "<table><tr><th>Doctor</th><th>Stage</th><th>Encounter Date</th></tr></table>"
        );
    }
}
