use serde::Serialize;
use thiserror::Error;

use crate::tree::SourceRange;

/// A single source-level edit: replace byte range `[start..end)` with the
/// replacement text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edit {
    /// Byte offset, inclusive.
    pub start: usize,
    /// Byte offset, exclusive.
    pub end: usize,
    /// Replacement text (empty string = deletion).
    pub replacement: String,
}

impl Edit {
    pub fn replace(range: SourceRange, replacement: impl Into<String>) -> Self {
        Self {
            start: range.start,
            end: range.end,
            replacement: replacement.into(),
        }
    }

    pub fn delete(range: SourceRange) -> Self {
        Self::replace(range, "")
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            replacement: text.into(),
        }
    }
}

/// Two edits in one pass claimed intersecting ranges. This is a contract
/// violation by the producing rules; the affected unit's correction step is
/// abandoned while its findings remain reportable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("overlapping edits: {first_start}..{first_end} and {second_start}..{second_end}")]
pub struct OverlappingEditsError {
    pub first_start: usize,
    pub first_end: usize,
    pub second_start: usize,
    pub second_end: usize,
}

/// A validated set of non-overlapping edits, sorted by start offset.
///
/// Edits may be supplied in any order; construction sorts them (stable, so
/// insertions at the same offset keep submission order) and rejects any two
/// whose ranges intersect. Adjacent edits (one ending where the next starts)
/// are legal.
#[derive(Debug)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    pub fn from_vec(mut raw: Vec<Edit>) -> Result<Self, OverlappingEditsError> {
        raw.sort_by_key(|e| e.start);

        for pair in raw.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(OverlappingEditsError {
                    first_start: pair[0].start,
                    first_end: pair[0].end,
                    second_start: pair[1].start,
                    second_end: pair[1].end,
                });
            }
        }

        Ok(Self { edits: raw })
    }

    /// Apply the edits to the source, returning the corrected text.
    ///
    /// Single O(n) left-to-right pass: copy the unedited span before each
    /// edit, substitute its replacement, and resume after its range.
    pub fn apply(&self, source: &str) -> String {
        let mut result = String::with_capacity(source.len());
        let mut cursor = 0;

        for e in &self.edits {
            if e.start > cursor {
                result.push_str(&source[cursor..e.start]);
            }
            result.push_str(&e.replacement);
            cursor = e.end;
        }

        if cursor < source.len() {
            result.push_str(&source[cursor..]);
        }

        result
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }
}
