//! Validation of caller-supplied values that end up inside request URLs.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Longest value accepted as a single URL path segment.
const MAX_SEGMENT_LENGTH: usize = 255;

lazy_static! {
    /// Characters that would change the meaning of a URL if placed in a path segment.
    static ref UNSAFE_SEGMENT_CHARS: Regex = Regex::new(r"[/?#%\\\s]").unwrap();
}

/// Validates that a value can be used verbatim as one URL path segment,
/// e.g. a Teams device id in `/teamwork/devices/{id}` or a domain name in
/// the tenant metadata URL.
pub fn validate_path_segment(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        let mut err = ValidationError::new("segment_empty");
        err.message = Some("Value must not be empty".into());
        return Err(err);
    }

    if value.len() > MAX_SEGMENT_LENGTH {
        let mut err = ValidationError::new("segment_length");
        err.message = Some("Value must be at most 255 characters".into());
        return Err(err);
    }

    if UNSAFE_SEGMENT_CHARS.is_match(value) {
        let mut err = ValidationError::new("segment_chars");
        err.message =
            Some("Value must not contain '/', '?', '#', '%', '\\' or whitespace".into());
        return Err(err);
    }

    Ok(())
}
