//! Postal address and telecom formatting.

use cedra_models::{AddressElement, ContactPoint, PostalAddress, TelecomUse};

/// Normalize a postal address into its document representation.
///
/// Country is always "USA". Only the first two street lines are emitted;
/// anything beyond that is dropped. Empty fields are omitted rather than
/// written as empty elements.
pub fn format_address(address: &PostalAddress) -> AddressElement {
    AddressElement {
        country: Some("USA".to_string()),
        state: non_empty(&address.state),
        city: non_empty(&address.city),
        postal_code: non_empty(&address.postal_code),
        street_lines: address
            .street_lines
            .iter()
            .filter(|line| !line.is_empty())
            .take(2)
            .cloned()
            .collect(),
    }
}

/// Normalize email and telephone into an ordered contact point list:
/// email first (home), then telephone (home, primary). Returns an empty
/// list when both are absent - callers that require at least one contact
/// point enforce that themselves.
pub fn format_telecoms(email: Option<&str>, telephone: Option<&str>) -> Vec<ContactPoint> {
    let mut telecoms = Vec::new();
    if let Some(email) = email {
        telecoms.push(ContactPoint {
            value: email.to_string(),
            use_: TelecomUse::Home,
        });
    }
    if let Some(telephone) = telephone {
        telecoms.push(ContactPoint {
            value: telephone.to_string(),
            use_: TelecomUse::HomePrimary,
        });
    }
    telecoms
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
