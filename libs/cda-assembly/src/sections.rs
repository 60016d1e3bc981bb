//! Fixed clinical section templates.
//!
//! Six sections are always present, in this order, and never carry
//! clinical entries in this document family - each holds a "no data"
//! narrative instead. Their codes, titles and null-flavor policy are
//! mandated by the CCD templates and must appear verbatim.

use cedra_models::{CodedValue, PlaceholderSection};

pub const LOINC_SYSTEM: &str = "2.16.840.1.113883.6.1";
pub const LOINC_SYSTEM_NAME: &str = "LOINC";

/// The six fixed section kinds, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Allergies,
    Medications,
    Problems,
    Results,
    SocialHistory,
    VitalSigns,
}

/// Constant template for one fixed section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionTemplate {
    pub loinc: &'static str,
    pub display_name: &'static str,
    pub title: &'static str,
    pub empty_narrative: &'static str,
    /// Whether the section carries the "no information" null flavor.
    /// Social History is the one section that does not: its absence of
    /// data is represented by narrative text alone.
    pub no_information: bool,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Allergies,
        SectionKind::Medications,
        SectionKind::Problems,
        SectionKind::Results,
        SectionKind::SocialHistory,
        SectionKind::VitalSigns,
    ];

    pub fn template(self) -> &'static SectionTemplate {
        match self {
            SectionKind::Allergies => &SectionTemplate {
                loinc: "48765-2",
                display_name: "Allergies, adverse reactions, alerts",
                title: "Allergies Section",
                empty_narrative: "No Allergies Data",
                no_information: true,
            },
            SectionKind::Medications => &SectionTemplate {
                loinc: "10160-0",
                display_name: "History of medication use",
                title: "Medications Section",
                empty_narrative: "No Medications Data",
                no_information: true,
            },
            SectionKind::Problems => &SectionTemplate {
                loinc: "11450-4",
                display_name: "Problem list",
                title: "Problem Section",
                empty_narrative: "No Problems Data",
                no_information: true,
            },
            SectionKind::Results => &SectionTemplate {
                loinc: "30954-2",
                display_name: "Relevant diagnostic tests and/or laboratory data",
                title: "Results Section",
                empty_narrative: "No Results Data",
                no_information: true,
            },
            SectionKind::SocialHistory => &SectionTemplate {
                loinc: "29762-2",
                display_name: "Social History",
                title: "Social History Section",
                empty_narrative: "No Social History Data",
                no_information: false,
            },
            SectionKind::VitalSigns => &SectionTemplate {
                loinc: "8716-3",
                display_name: "Vital Signs",
                title: "Vital Signs Section",
                empty_narrative: "No Vital Signs Data",
                no_information: true,
            },
        }
    }

    /// Build the placeholder section for this kind.
    pub fn placeholder(self) -> PlaceholderSection {
        let template = self.template();
        PlaceholderSection {
            code: CodedValue::new(template.loinc, LOINC_SYSTEM)
                .with_names(LOINC_SYSTEM_NAME, template.display_name),
            title: template.title.to_string(),
            narrative: template.empty_narrative.to_string(),
            no_information: template.no_information,
        }
    }
}
