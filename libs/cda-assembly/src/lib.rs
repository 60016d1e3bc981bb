//! CCD document assembly.
//!
//! Turns one set of intake records (organization + patient with nested
//! encounters) into a [`cedra_models::ClinicalDocument`] tree conforming to
//! the CCD template family. The transformation is pure and deterministic:
//! the creation timestamp is an explicit parameter, all failures are
//! validation errors, and no partial tree is ever returned.
//!
//! The serializer for the resulting tree lives in `cedra-format`.

use chrono::{DateTime, Utc};

mod assembler;
mod contact;
mod error;
mod narrative;
mod sections;

pub use assembler::assemble;
pub use contact::{format_address, format_telecoms};
pub use error::{BuildError, Result};
pub use narrative::{render_encounters, RenderedEncounters};
pub use sections::{SectionKind, SectionTemplate};

/// Root OID for US national provider identifiers.
pub const NPI_ROOT: &str = "2.16.840.1.113883.4.6";

/// Render an instant to the document's timestamp wire form (whole-second
/// precision, UTC).
pub fn wire_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%d%H%M%S").to_string()
}
