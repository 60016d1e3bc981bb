//! Data model for the cedra CCD assembly engine.
//!
//! Two layers live here:
//! - [`records`]: the normalized intake records a caller supplies for a
//!   single document build (patient, organization, performers, encounters).
//! - [`document`]: the closed set of element shapes the assembled document
//!   is made of. The serializer knows one rendering rule per shape, so this
//!   enum/struct set is the complete vocabulary of the output artifact.
//!
//! No validation happens in this crate - just data representation. Gender
//! and birth-date checks belong to the assembly layer.

pub mod document;
pub mod records;

pub use document::{
    AddressElement, Author, ClinicalDocument, ClinicalSection, CodedValue, ContactPoint,
    Custodian, DocumentHeader, EncounterActivity, EncountersSection, InstanceIdentifier,
    NullFlavor, OrganizationElement, PerformerEntity, PersonName, PlaceholderSection,
    RecordTarget, ServiceEvent, TelecomUse,
};
pub use records::{
    EncounterRecord, OrganizationRecord, PatientRecord, PerformerRecord, PostalAddress,
};
