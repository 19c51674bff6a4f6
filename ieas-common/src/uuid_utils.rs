//! UUID utilities

use uuid::{Uuid, Variant};

/// True when `s` is a version-4 UUID written in canonical form
///
/// Canonical form is lowercase, hyphenated, without braces or a `urn:`
/// prefix; anything else is rejected even if it parses.
pub fn is_canonical_v4(s: &str) -> bool {
    match Uuid::parse_str(s) {
        Ok(id) => {
            id.get_version_num() == 4
                && id.get_variant() == Variant::RFC4122
                && id.hyphenated().to_string() == s
        }
        Err(_) => false,
    }
}

/// True when `s` parses as any UUID
pub fn is_uuid(s: &str) -> bool {
    Uuid::parse_str(s).is_ok()
}
