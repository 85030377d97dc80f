//! Source lifecycle states.

use std::fmt;

/// Processing state of one dataset.
///
/// States advance strictly in declaration order; no state may be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceState {
    /// Document loaded, paths unset.
    Constructed,
    /// Metadata checked, paths assigned.
    Validated,
    /// Label map attached.
    LabelMapped,
    /// Intermediate file written.
    Transformed,
    /// Clean file written.
    Cleaned,
}

impl SourceState {
    /// The state that must follow this one, if any.
    pub fn next(self) -> Option<SourceState> {
        match self {
            SourceState::Constructed => Some(SourceState::Validated),
            SourceState::Validated => Some(SourceState::LabelMapped),
            SourceState::LabelMapped => Some(SourceState::Transformed),
            SourceState::Transformed => Some(SourceState::Cleaned),
            SourceState::Cleaned => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceState::Constructed => "constructed",
            SourceState::Validated => "validated",
            SourceState::LabelMapped => "label-mapped",
            SourceState::Transformed => "transformed",
            SourceState::Cleaned => "cleaned",
        }
    }
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
