//! Play date parsing from PlaceExchange filenames
//!
//! Report files are named `<prefix>YYYY-MM-DD...`; rows carry no date of
//! their own.

use adrev_common::{AdrevError, Result};
use chrono::NaiveDate;

pub const DEFAULT_FILENAME_PREFIX: &str = "placeexchange_";

const DATE_LEN: usize = 10;

/// Parse the play date that follows `prefix` in `filename`
///
/// `filename` is the basename, not the full key. The prefix match ignores
/// ASCII case.
pub fn play_date_from_filename(filename: &str, prefix: &str) -> Result<NaiveDate> {
    let starts_with_prefix = filename
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false);
    if !starts_with_prefix {
        return Err(AdrevError::decode(format!(
            "{} does not start with {}",
            filename, prefix
        )));
    }

    let date = filename
        .get(prefix.len()..prefix.len() + DATE_LEN)
        .ok_or_else(|| {
            AdrevError::decode(format!("{} is too short to carry a play date", filename))
        })?;

    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
        AdrevError::decode(format!("invalid play date {:?} in {}: {}", date, filename, e))
    })
}
