//! Intake records for a single document build.
//!
//! These are the wire form callers hand to the assembler (typically parsed
//! from JSON). All of them are plain data; required-field enforcement is
//! the caller's job except gender and date-of-birth, which the assembler
//! validates itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Postal address as supplied by the caller.
///
/// Only the first two street lines are ever emitted into the document;
/// extras are silently dropped by the formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub city: String,

    pub state: String,

    pub postal_code: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub street_lines: Vec<String>,
}

/// The organization acting as both document author and custodian.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRecord {
    pub name: String,

    pub address: PostalAddress,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,

    /// Required; drawn from the HIPAA provider-taxonomy value set.
    pub provider_taxonomy_code: String,
}

/// The clinician who performed an encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformerRecord {
    pub given_name: String,

    pub family_name: String,

    /// National provider identifier. Emitted with an "unknown" null flavor
    /// when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npi: Option<String>,

    /// Required; drawn from the HIPAA provider-taxonomy value set.
    pub provider_taxonomy_code: String,

    pub address: PostalAddress,
}

/// One patient encounter. Owns its performer by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterRecord {
    /// Unique within a document.
    pub id: String,

    pub effective_time: DateTime<Utc>,

    /// Required code from the CPT/HCPCS encounter-type value set.
    pub encounter_type_code: String,

    /// Free-text stage label ("new", "pre-op", ...).
    pub stage: String,

    pub performer: PerformerRecord,
}

/// The patient a document is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: String,

    pub given_name: String,

    pub family_name: String,

    /// Calendar date in YYYYMMDD form; validated by the assembler.
    pub date_of_birth: String,

    /// "M" or "F"; validated by the assembler.
    pub gender: String,

    pub address: PostalAddress,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encounters: Vec<EncounterRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_record_parses_without_encounters() {
        let json = r#"
        {
            "id": "Patient0",
            "givenName": "Federico",
            "familyName": "Aufderhar",
            "dateOfBirth": "19531029",
            "gender": "M",
            "address": {
                "city": "Boston",
                "state": "CA",
                "postalCode": "16545",
                "streetLines": ["123 Main St", "4D"]
            },
            "email": "testpatient1@test.com"
        }
        "#;

        let record: PatientRecord = serde_json::from_str(json).expect("parse failed");
        assert_eq!(record.id, "Patient0");
        assert!(record.encounters.is_empty());
        assert!(record.telephone.is_none());
        assert_eq!(record.address.street_lines.len(), 2);
    }

    #[test]
    fn encounter_record_parses_utc_timestamp() {
        let json = r#"
        {
            "id": "enc-1",
            "effectiveTime": "2020-01-10T09:30:00Z",
            "encounterTypeCode": "99204",
            "stage": "new",
            "performer": {
                "givenName": "Helga",
                "familyName": "Medico",
                "npi": "1234567",
                "providerTaxonomyCode": "101YP2500X",
                "address": {
                    "city": "Wilmington",
                    "state": "AZ",
                    "postalCode": "09675",
                    "streetLines": ["38 Smith St", "Unit 6"]
                }
            }
        }
        "#;

        let record: EncounterRecord = serde_json::from_str(json).expect("parse failed");
        assert_eq!(record.effective_time.to_rfc3339(), "2020-01-10T09:30:00+00:00");
        assert_eq!(record.performer.npi.as_deref(), Some("1234567"));
    }
}
