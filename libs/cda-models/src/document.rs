//! The closed set of element shapes a CCD is assembled from.
//!
//! Instead of an open-ended clinical-document object model, the engine only
//! models the shapes it actually emits. The serializer carries one rendering
//! rule per shape; anything not representable here cannot appear in the
//! output artifact.

/// HL7 null flavor markers used by this document family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullFlavor {
    /// "NI" - no information.
    NoInformation,
    /// "UNK" - value exists but is unknown.
    Unknown,
    /// "NA" - not applicable.
    NotApplicable,
}

impl NullFlavor {
    pub fn as_str(self) -> &'static str {
        match self {
            NullFlavor::NoInformation => "NI",
            NullFlavor::Unknown => "UNK",
            NullFlavor::NotApplicable => "NA",
        }
    }
}

/// HL7 II - instance identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceIdentifier {
    pub root: Option<String>,
    pub extension: Option<String>,
    pub null_flavor: Option<NullFlavor>,
}

impl InstanceIdentifier {
    pub fn root(root: impl Into<String>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    pub fn null(flavor: NullFlavor) -> Self {
        Self {
            null_flavor: Some(flavor),
            ..Self::default()
        }
    }
}

/// A coded value (HL7 CE/CD). Covers plain codes, null-flavored codes and
/// codes carrying an original-text reference into the narrative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodedValue {
    pub code: Option<String>,
    pub code_system: Option<String>,
    pub code_system_name: Option<String>,
    pub display_name: Option<String>,
    pub null_flavor: Option<NullFlavor>,
    /// Anchor id (e.g. "#Encounter1") emitted as
    /// `<originalText><reference value="..."/></originalText>`.
    pub original_text_reference: Option<String>,
}

impl CodedValue {
    pub fn new(code: impl Into<String>, code_system: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            code_system: Some(code_system.into()),
            ..Self::default()
        }
    }

    pub fn null(flavor: NullFlavor) -> Self {
        Self {
            null_flavor: Some(flavor),
            ..Self::default()
        }
    }

    pub fn with_names(
        mut self,
        code_system_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        self.code_system_name = Some(code_system_name.into());
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_system_name(mut self, code_system_name: impl Into<String>) -> Self {
        self.code_system_name = Some(code_system_name.into());
        self
    }
}

/// Telecom use codes emitted by this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelecomUse {
    /// "H" - home.
    Home,
    /// "HP" - home, primary.
    HomePrimary,
}

impl TelecomUse {
    pub fn as_str(self) -> &'static str {
        match self {
            TelecomUse::Home => "H",
            TelecomUse::HomePrimary => "HP",
        }
    }
}

/// A single telecom entry (email or telephone).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPoint {
    pub value: String,
    pub use_: TelecomUse,
}

/// HL7 AD as this engine emits it: country is always "USA", street lines
/// are capped at two by the formatter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressElement {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub street_lines: Vec<String>,
}

/// HL7 PN with the two name parts this engine uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    pub given: String,
    pub family: String,
}

/// Fixed header block of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeader {
    pub type_id: InstanceIdentifier,
    pub template_ids: Vec<InstanceIdentifier>,
    pub id: InstanceIdentifier,
    pub code: CodedValue,
    pub title: String,
    /// Creation timestamp, already rendered to the wire form.
    pub effective_time: String,
    pub confidentiality: CodedValue,
    pub language_code: String,
}

/// The patient role the document is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    pub id: InstanceIdentifier,
    pub address: AddressElement,
    pub telecoms: Vec<ContactPoint>,
    pub name: PersonName,
    pub gender: CodedValue,
    /// Birth date in YYYYMMDD wire form.
    pub birth_time: String,
    pub race: CodedValue,
    pub ethnicity: CodedValue,
}

/// Organization element as nested under the author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationElement {
    pub name: String,
    pub address: AddressElement,
}

/// The authoring organization entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Author time, same wire form as the header effective time.
    pub time: String,
    pub ids: Vec<InstanceIdentifier>,
    pub code: CodedValue,
    pub telecoms: Vec<ContactPoint>,
    pub address: AddressElement,
    pub organization: OrganizationElement,
}

/// The custodian organization. Carries exactly one contact point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Custodian {
    pub id: InstanceIdentifier,
    pub name: String,
    pub telecom: ContactPoint,
    pub address: AddressElement,
}

/// The care-provision service event interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEvent {
    pub low: String,
    pub high: String,
}

/// A fixed section that never carries clinical entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSection {
    pub code: CodedValue,
    pub title: String,
    /// Plain "no data" narrative text.
    pub narrative: String,
    pub no_information: bool,
}

/// The performer entity nested inside an encounter activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformerEntity {
    pub id: InstanceIdentifier,
    pub code: CodedValue,
    pub address: AddressElement,
    pub name: PersonName,
}

/// One structured encounter entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterActivity {
    pub id: InstanceIdentifier,
    pub code: CodedValue,
    /// Effective time in YYYYMMDDHHMMSS wire form.
    pub effective_time: String,
    pub performer: PerformerEntity,
}

/// The encounters section: narrative table plus the entries it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncountersSection {
    pub code: CodedValue,
    pub title: String,
    /// Raw HTML table markup. Written as an ordinary text node and restored
    /// by the serializer's unescape pass.
    pub narrative: String,
    pub activities: Vec<EncounterActivity>,
}

/// A section of the structured body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClinicalSection {
    Placeholder(PlaceholderSection),
    Encounters(EncountersSection),
}

/// The fully assembled document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicalDocument {
    pub header: DocumentHeader,
    pub record_target: RecordTarget,
    pub author: Author,
    pub custodian: Custodian,
    pub service_event: ServiceEvent,
    pub sections: Vec<ClinicalSection>,
}
