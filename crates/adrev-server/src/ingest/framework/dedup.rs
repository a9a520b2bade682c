//! Dedup filter: decides whether a listed object still needs ingesting

use crate::storage::SourceObject;

use super::types::Watermark;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept,
    AlreadyProcessed,
    UnsupportedExtension,
}

/// Watermark membership plus an optional extension allowlist
#[derive(Debug, Clone, Default)]
pub struct DedupFilter {
    /// Lowercase extensions without the dot; empty means any extension
    extensions: Vec<String>,
}

impl DedupFilter {
    /// Admit any object not yet in the watermark
    pub fn any_extension() -> Self {
        Self::default()
    }

    /// Admit only objects whose extension is in `extensions` (case-insensitive)
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn admit(&self, watermark: &Watermark, object: &SourceObject) -> Admission {
        if watermark.contains(&object.key) {
            return Admission::AlreadyProcessed;
        }

        if !self.extensions.is_empty() {
            let allowed = object
                .extension()
                .map(|ext| self.extensions.iter().any(|e| *e == ext))
                .unwrap_or(false);
            if !allowed {
                return Admission::UnsupportedExtension;
            }
        }

        Admission::Accept
    }
}
