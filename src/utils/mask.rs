//! Privacy mask for client identities
//!
//! Whenever a client-originated message is shown to a group, the client's
//! display name is reduced to a short, fixed-shape prefix. The mask is only
//! applied on the client-to-group path; group authors are never masked.

/// Marker appended to every masked identity.
pub const REDACTION_MARKER: &str = "[redacted]";

/// Number of display-name characters kept in the masked identity.
const VISIBLE_CHARS: usize = 3;

/// Derive the masked display identity from a client's display name.
///
/// Keeps the first three characters of the name, pads with `*` when the
/// name is shorter, and appends the redaction marker. Pure and
/// deterministic.
pub fn mask(display_name: &str) -> String {
    let mut prefix: String = display_name.chars().take(VISIBLE_CHARS).collect();
    while prefix.chars().count() < VISIBLE_CHARS {
        prefix.push('*');
    }
    format!("{}{}", prefix, REDACTION_MARKER)
}
