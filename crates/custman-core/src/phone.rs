//! Phone-number normalization.
//!
//! Raw phone strings arrive in whatever shape a person typed them:
//! `"(41) 3456-7890"`, `"0 41 3456 7890"`, `"4134567890"`. Stored phones are
//! always digits only, split into a two-digit area code (DDD) and the
//! subscriber number.

use crate::{Error, Result};

/// Number of leading digits that make up the area code.
pub const AREA_CODE_DIGITS: usize = 2;

/// Strip every character that is not an ASCII digit.
pub fn digits_only(raw: &str) -> String {
  raw.chars().filter(char::is_ascii_digit).collect()
}

/// Split a raw phone string into `(area_code, number)`.
///
/// A single leading `0` (trunk prefix) is dropped after stripping; the next
/// two digits become the area code and everything after them the number.
pub fn parse(raw: &str) -> Result<(String, String)> {
  if raw.is_empty() {
    return Err(Error::InvalidArgument("phone number is required".into()));
  }

  let plain = digits_only(raw);
  let plain = plain.strip_prefix('0').unwrap_or(&plain);

  if plain.len() < AREA_CODE_DIGITS {
    return Err(Error::InvalidArgument(format!(
      "phone number {raw:?} is too short to carry an area code"
    )));
  }

  // `plain` is ASCII digits only, so byte offsets are char boundaries.
  let (ddd, number) = plain.split_at(AREA_CODE_DIGITS);
  Ok((ddd.to_owned(), number.to_owned()))
}
