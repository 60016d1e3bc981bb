//! Document assembly orchestration.

use crate::contact::{format_address, format_telecoms};
use crate::error::{BuildError, Result};
use crate::narrative::render_encounters;
use crate::sections::{SectionKind, LOINC_SYSTEM, LOINC_SYSTEM_NAME};
use crate::{wire_timestamp, NPI_ROOT};
use cedra_models::{
    Author, ClinicalDocument, ClinicalSection, CodedValue, Custodian, DocumentHeader,
    EncounterRecord, EncountersSection, InstanceIdentifier, NullFlavor, OrganizationElement,
    OrganizationRecord, PatientRecord, PersonName, RecordTarget, ServiceEvent,
};
use chrono::{DateTime, NaiveDate, Utc};

const DOC_TYPE_ID_ROOT: &str = "2.16.840.1.113883.1.3";
const DOC_TYPE_ID_EXTENSION: &str = "POCD_HD000040";
const CCD_TEMPLATE_ROOTS: [&str; 2] = [
    "2.16.840.1.113883.10.20.22.1.1",
    "2.16.840.1.113883.10.20.22.1.2",
];
const CCD_TEMPLATE_EXTENSION: &str = "2015-08-01";
const CONFIDENTIALITY_SYSTEM: &str = "2.16.840.1.113883.5.25";
const ADMINISTRATIVE_GENDER_SYSTEM: &str = "2.16.840.1.113883.5.1";
const AUTHOR_TAXONOMY_SYSTEM: &str = "2.16.840.1.113883.6.10.1";
const AUTHOR_TAXONOMY_SYSTEM_NAME: &str = "Healthcare Provider Taxonomy (HIPAA)";

/// Assemble a complete document tree from one organization and one patient
/// record.
///
/// `created_at` is the document creation instant; it is used consistently
/// for the header effective time, the author time and the service-event
/// high bound, so one build always carries one internally consistent
/// timestamp. Given identical inputs and the same `created_at`, the output
/// is identical.
pub fn assemble(
    organization: &OrganizationRecord,
    patient: &PatientRecord,
    created_at: DateTime<Utc>,
) -> Result<ClinicalDocument> {
    let creation_time = wire_timestamp(created_at);

    Ok(ClinicalDocument {
        header: build_header(&patient.id, &creation_time),
        record_target: build_record_target(patient)?,
        author: build_author(organization, &creation_time),
        custodian: build_custodian(organization)?,
        service_event: build_service_event(&patient.encounters, &creation_time),
        sections: build_sections(patient),
    })
}

fn build_header(patient_id: &str, creation_time: &str) -> DocumentHeader {
    DocumentHeader {
        type_id: InstanceIdentifier {
            root: Some(DOC_TYPE_ID_ROOT.to_string()),
            extension: Some(DOC_TYPE_ID_EXTENSION.to_string()),
            null_flavor: None,
        },
        template_ids: CCD_TEMPLATE_ROOTS
            .iter()
            .map(|root| InstanceIdentifier {
                root: Some(root.to_string()),
                extension: Some(CCD_TEMPLATE_EXTENSION.to_string()),
                null_flavor: None,
            })
            .collect(),
        id: InstanceIdentifier::root(patient_id),
        code: CodedValue::new("34133-9", LOINC_SYSTEM)
            .with_names(LOINC_SYSTEM_NAME, "Summarization of Episode Note"),
        title: "Patient Encounters".to_string(),
        effective_time: creation_time.to_string(),
        confidentiality: CodedValue::new("N", CONFIDENTIALITY_SYSTEM)
            .with_names("Confidentiality", "Normal"),
        language_code: "en-US".to_string(),
    }
}

fn build_record_target(patient: &PatientRecord) -> Result<RecordTarget> {
    let gender = match patient.gender.as_str() {
        "M" | "F" => CodedValue::new(&patient.gender, ADMINISTRATIVE_GENDER_SYSTEM),
        other => return Err(BuildError::InvalidGender(other.to_string())),
    };

    let birth_date = NaiveDate::parse_from_str(&patient.date_of_birth, "%Y%m%d")
        .map_err(|_| BuildError::InvalidBirthDate(patient.date_of_birth.clone()))?;

    Ok(RecordTarget {
        id: InstanceIdentifier::root(&patient.id),
        address: format_address(&patient.address),
        telecoms: format_telecoms(patient.email.as_deref(), patient.telephone.as_deref()),
        name: PersonName {
            given: patient.given_name.clone(),
            family: patient.family_name.clone(),
        },
        gender,
        birth_time: birth_date.format("%Y%m%d").to_string(),
        // Race and ethnicity are never derived from input in this document
        // family; both are always "unknown".
        race: CodedValue::null(NullFlavor::Unknown),
        ethnicity: CodedValue::null(NullFlavor::Unknown),
    })
}

fn build_author(organization: &OrganizationRecord, creation_time: &str) -> Author {
    Author {
        time: creation_time.to_string(),
        // No assigned person or device: the first id is "not applicable",
        // the second an unknown NPI placeholder.
        ids: vec![
            InstanceIdentifier::null(NullFlavor::NotApplicable),
            InstanceIdentifier {
                root: Some(NPI_ROOT.to_string()),
                extension: None,
                null_flavor: Some(NullFlavor::Unknown),
            },
        ],
        code: CodedValue::new(&organization.provider_taxonomy_code, AUTHOR_TAXONOMY_SYSTEM)
            .with_system_name(AUTHOR_TAXONOMY_SYSTEM_NAME),
        telecoms: format_telecoms(
            organization.email.as_deref(),
            organization.telephone.as_deref(),
        ),
        address: format_address(&organization.address),
        organization: OrganizationElement {
            name: organization.name.clone(),
            address: format_address(&organization.address),
        },
    }
}

fn build_custodian(organization: &OrganizationRecord) -> Result<Custodian> {
    // The custodian organization takes exactly one contact point; email
    // wins over telephone when both are present.
    let telecom = format_telecoms(
        organization.email.as_deref(),
        organization.telephone.as_deref(),
    )
    .into_iter()
    .next()
    .ok_or(BuildError::MissingContact)?;

    Ok(Custodian {
        id: InstanceIdentifier {
            root: Some(NPI_ROOT.to_string()),
            extension: None,
            null_flavor: Some(NullFlavor::Unknown),
        },
        name: organization.name.clone(),
        telecom,
        address: format_address(&organization.address),
    })
}

fn build_service_event(encounters: &[EncounterRecord], creation_time: &str) -> ServiceEvent {
    let low = earliest_encounter_time(encounters)
        .map(wire_timestamp)
        .unwrap_or_else(|| creation_time.to_string());

    ServiceEvent {
        low,
        high: creation_time.to_string(),
    }
}

/// Linear scan for the earliest effective time; on ties the first-seen
/// minimum wins.
fn earliest_encounter_time(encounters: &[EncounterRecord]) -> Option<DateTime<Utc>> {
    let mut earliest: Option<DateTime<Utc>> = None;
    for encounter in encounters {
        match earliest {
            None => earliest = Some(encounter.effective_time),
            Some(current) if current > encounter.effective_time => {
                earliest = Some(encounter.effective_time)
            }
            Some(_) => {}
        }
    }
    earliest
}

fn build_sections(patient: &PatientRecord) -> Vec<ClinicalSection> {
    let mut sections: Vec<ClinicalSection> = SectionKind::ALL
        .iter()
        .map(|kind| ClinicalSection::Placeholder(kind.placeholder()))
        .collect();

    if !patient.encounters.is_empty() {
        let rendered = render_encounters(&patient.encounters);
        sections.push(ClinicalSection::Encounters(EncountersSection {
            code: CodedValue::new("46240-8", LOINC_SYSTEM)
                .with_names(LOINC_SYSTEM_NAME, "Encounters"),
            title: "Encounters Section".to_string(),
            narrative: rendered.narrative,
            activities: rendered.activities,
        }));
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use cedra_models::{PerformerRecord, PostalAddress};
    use chrono::TimeZone;

    fn organization() -> OrganizationRecord {
        OrganizationRecord {
            name: "myFakeCompany".to_string(),
            address: PostalAddress {
                city: "Long Island".to_string(),
                state: "WA".to_string(),
                postal_code: "12345".to_string(),
                street_lines: vec!["11 Bowery St".to_string()],
            },
            email: Some("fakeTesting@testing.fake".to_string()),
            telephone: Some("1-234-567-8910".to_string()),
            provider_taxonomy_code: "FakeCodeFromValueset".to_string(),
        }
    }

    fn patient(encounters: Vec<EncounterRecord>) -> PatientRecord {
        PatientRecord {
            id: "Patient0".to_string(),
            given_name: "Federico".to_string(),
            family_name: "Aufderhar".to_string(),
            date_of_birth: "19531029".to_string(),
            gender: "M".to_string(),
            address: PostalAddress {
                city: "Boston".to_string(),
                state: "CA".to_string(),
                postal_code: "16545".to_string(),
                street_lines: vec!["123 Main St".to_string(), "4D".to_string()],
            },
            email: Some("testpatient1@test.com".to_string()),
            telephone: Some("1 234-567-8910".to_string()),
            encounters,
        }
    }

    fn encounter(id: &str, time: DateTime<Utc>) -> EncounterRecord {
        EncounterRecord {
            id: id.to_string(),
            effective_time: time,
            encounter_type_code: "99204".to_string(),
            stage: "new".to_string(),
            performer: PerformerRecord {
                given_name: "Helga".to_string(),
                family_name: "Medico".to_string(),
                npi: Some("1234567".to_string()),
                provider_taxonomy_code: "101YP2500X".to_string(),
                address: PostalAddress {
                    city: "Wilmington".to_string(),
                    state: "AZ".to_string(),
                    postal_code: "09675".to_string(),
                    street_lines: vec!["38 Smith St".to_string()],
                },
            },
        }
    }

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn accepts_both_gender_codes() {
        for gender in ["M", "F"] {
            let mut record = patient(Vec::new());
            record.gender = gender.to_string();
            let doc = assemble(&organization(), &record, created_at()).expect(gender);
            assert_eq!(doc.record_target.gender.code.as_deref(), Some(gender));
            assert_eq!(
                doc.record_target.gender.code_system.as_deref(),
                Some(ADMINISTRATIVE_GENDER_SYSTEM)
            );
        }
    }

    #[test]
    fn rejects_gender_outside_m_f() {
        for gender in ["X", "", "male"] {
            let mut record = patient(Vec::new());
            record.gender = gender.to_string();
            let err = assemble(&organization(), &record, created_at()).unwrap_err();
            assert!(matches!(err, BuildError::InvalidGender(_)), "{:?}", err);
        }
    }

    #[test]
    fn rejects_unparseable_birth_date() {
        for dob in ["1953-10-29", "19531329", "root"] {
            let mut record = patient(Vec::new());
            record.date_of_birth = dob.to_string();
            let err = assemble(&organization(), &record, created_at()).unwrap_err();
            assert!(matches!(err, BuildError::InvalidBirthDate(_)), "{:?}", err);
        }
    }

    #[test]
    fn custodian_requires_a_contact_point() {
        let mut org = organization();
        org.email = None;
        org.telephone = None;
        let err = assemble(&org, &patient(Vec::new()), created_at()).unwrap_err();
        assert!(matches!(err, BuildError::MissingContact));
    }

    #[test]
    fn custodian_prefers_email_over_telephone() {
        let doc = assemble(&organization(), &patient(Vec::new()), created_at()).unwrap();
        assert_eq!(doc.custodian.telecom.value, "fakeTesting@testing.fake");

        let mut org = organization();
        org.email = None;
        let doc = assemble(&org, &patient(Vec::new()), created_at()).unwrap();
        assert_eq!(doc.custodian.telecom.value, "1-234-567-8910");
    }

    #[test]
    fn no_encounters_yields_six_sections_and_creation_low_bound() {
        let doc = assemble(&organization(), &patient(Vec::new()), created_at()).unwrap();
        assert_eq!(doc.sections.len(), 6);
        assert!(doc
            .sections
            .iter()
            .all(|s| matches!(s, ClinicalSection::Placeholder(_))));
        assert_eq!(doc.service_event.low, "20210601120000");
        assert_eq!(doc.service_event.high, "20210601120000");
    }

    #[test]
    fn earliest_encounter_becomes_low_bound() {
        let encounters = vec![
            encounter("e1", Utc.with_ymd_and_hms(2020, 11, 27, 0, 0, 0).unwrap()),
            encounter("e2", Utc.with_ymd_and_hms(2020, 1, 10, 0, 0, 0).unwrap()),
            encounter("e3", Utc.with_ymd_and_hms(2021, 4, 1, 0, 0, 0).unwrap()),
        ];
        let doc = assemble(&organization(), &patient(encounters), created_at()).unwrap();
        assert_eq!(doc.service_event.low, "20200110000000");
        assert_eq!(doc.service_event.high, "20210601120000");
    }

    #[test]
    fn earliest_scan_first_minimum_wins_on_ties() {
        let tie = Utc.with_ymd_and_hms(2020, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(
            earliest_encounter_time(&[encounter("a", tie), encounter("b", tie)]),
            Some(tie)
        );
        assert_eq!(earliest_encounter_time(&[]), None);
        assert_eq!(
            earliest_encounter_time(&[encounter("only", tie)]),
            Some(tie)
        );
    }

    #[test]
    fn encounters_section_appended_after_fixed_six() {
        let encounters = vec![encounter(
            "e1",
            Utc.with_ymd_and_hms(2020, 1, 10, 0, 0, 0).unwrap(),
        )];
        let doc = assemble(&organization(), &patient(encounters), created_at()).unwrap();
        assert_eq!(doc.sections.len(), 7);
        match &doc.sections[6] {
            ClinicalSection::Encounters(section) => {
                assert_eq!(section.code.code.as_deref(), Some("46240-8"));
                assert_eq!(section.activities.len(), 1);
            }
            other => panic!("expected encounters section, got {:?}", other),
        }
    }

    #[test]
    fn header_carries_fixed_identifiers() {
        let doc = assemble(&organization(), &patient(Vec::new()), created_at()).unwrap();
        let header = &doc.header;
        assert_eq!(header.type_id.extension.as_deref(), Some("POCD_HD000040"));
        assert_eq!(header.template_ids.len(), 2);
        assert_eq!(
            header.template_ids[0].root.as_deref(),
            Some("2.16.840.1.113883.10.20.22.1.1")
        );
        assert_eq!(
            header.template_ids[1].extension.as_deref(),
            Some("2015-08-01")
        );
        assert_eq!(header.code.code.as_deref(), Some("34133-9"));
        assert_eq!(header.title, "Patient Encounters");
        assert_eq!(header.id.root.as_deref(), Some("Patient0"));
        assert_eq!(header.language_code, "en-US");
        assert_eq!(header.effective_time, "20210601120000");
    }

    #[test]
    fn author_shares_creation_time_and_organization() {
        let doc = assemble(&organization(), &patient(Vec::new()), created_at()).unwrap();
        assert_eq!(doc.author.time, doc.header.effective_time);
        assert_eq!(doc.author.organization.name, "myFakeCompany");
        assert_eq!(
            doc.author.ids[0].null_flavor,
            Some(NullFlavor::NotApplicable)
        );
        assert_eq!(doc.author.ids[1].root.as_deref(), Some(NPI_ROOT));
        assert_eq!(
            doc.author.code.code.as_deref(),
            Some("FakeCodeFromValueset")
        );
    }
}
