//! Record decoder trait

use adrev_common::{AdrevError, Result};

use crate::storage::SourceObject;

/// Outcome of decoding one object
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<R> {
    /// Rows that passed the feed's acceptance rule
    pub records: Vec<R>,
    /// Rows that failed the acceptance rule
    pub rejected: usize,
    /// Rows that could not be mapped onto the layout
    pub malformed: usize,
}

impl<R> Default for Decoded<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: 0,
            malformed: 0,
        }
    }
}

/// Turns downloaded bytes into feed records
///
/// Returning `Err` means the whole object is unusable (wrong encoding,
/// unreadable workbook, bad filename). Problems with individual rows are
/// counted in [`Decoded`] instead.
pub trait RecordDecoder: Send + Sync {
    type Record: Send + Sync;

    fn decode(&self, object: &SourceObject, data: &[u8]) -> Result<Decoded<Self::Record>>;
}

/// Borrow object bytes as UTF-8 text
pub fn utf8<'a>(object: &SourceObject, data: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(data)
        .map_err(|e| AdrevError::decode(format!("{} is not valid UTF-8: {}", object.key, e)))
}
