//! Library folder naming rules
//!
//! A default folder is named after a calendar year: exactly four ASCII
//! digits, first digit `1` or `2` (years 1000 through 2999).

pub const MIN_YEAR: i32 = 1000;
pub const MAX_YEAR: i32 = 2999;

/// Year represented by a default folder name, if it is one
pub fn parse_year_folder(name: &str) -> Option<i32> {
    let bytes = name.as_bytes();
    if bytes.len() != 4 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if !matches!(bytes[0], b'1' | b'2') {
        return None;
    }
    name.parse().ok()
}

/// Folder name used for a year's default folder
///
/// `None` outside [`MIN_YEAR`]..=[`MAX_YEAR`], where the name would not
/// parse back as a default folder.
pub fn year_folder_name(year: i32) -> Option<String> {
    (MIN_YEAR..=MAX_YEAR)
        .contains(&year)
        .then(|| year.to_string())
}
