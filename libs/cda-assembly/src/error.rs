use thiserror::Error;

/// Errors returned by the assembly crate.
///
/// All three are fail-fast validation errors: the document is not built and
/// nothing is partially emitted.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid administrative gender code '{0}' (expected M or F)")]
    InvalidGender(String),

    #[error("invalid date of birth '{0}' (expected YYYYMMDD)")]
    InvalidBirthDate(String),

    #[error("custodian organization needs at least one of email or telephone")]
    MissingContact,
}

pub type Result<T> = std::result::Result<T, BuildError>;
