//! Plate normalization and validation
//!
//! The remote service accepts up to [`MAX_PLATE_LEN`] characters, letters and
//! digits only. Normalization strips all whitespace (the form ignores it) and
//! uppercases the remainder.

use crate::error::{Error, Result};

/// Maximum plate length accepted by the remote service's input field
pub const MAX_PLATE_LEN: usize = 7;

/// Canonicalize a raw plate string.
///
/// Pure and idempotent: `normalize(normalize(x)) == normalize(x)` for any
/// input that normalizes at all.
pub fn normalize(raw: &str) -> Result<String> {
    let plate: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if plate.is_empty() {
        return Err(Error::InvalidPlate("plate is empty".to_string()));
    }

    if plate.chars().count() > MAX_PLATE_LEN {
        return Err(Error::InvalidPlate(format!(
            "plate cannot be longer than {} characters",
            MAX_PLATE_LEN
        )));
    }

    if let Some(c) = plate.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidPlate(format!(
            "invalid character {:?}: only letters and digits are accepted",
            c
        )));
    }

    Ok(plate)
}
