use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::finding::Location;
use crate::tree::SourceRange;

/// One analysis unit's source text plus a line-start index for fast
/// offset-to-location conversion.
#[derive(Debug)]
pub struct SourceBuffer {
    pub path: PathBuf,
    content: String,
    /// Byte offsets where each line starts (0-indexed into content)
    line_starts: Vec<usize>,
}

impl SourceBuffer {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let line_starts = compute_line_starts(&content);
        Ok(Self {
            path: path.to_path_buf(),
            content,
            line_starts,
        })
    }

    /// Create a SourceBuffer from a string, using the given path for display purposes.
    pub fn from_string(path: impl Into<PathBuf>, content: String) -> Self {
        let line_starts = compute_line_starts(&content);
        Self {
            path: path.into(),
            content,
            line_starts,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The text covered by a node's source range.
    pub fn text(&self, range: SourceRange) -> &str {
        &self.content[range.start..range.end]
    }

    /// The byte at an offset, if any. Used to probe single-character tokens
    /// (e.g. an opening parenthesis) adjacent to a node range.
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.content.as_bytes().get(offset).copied()
    }

    /// Convert a byte offset into a (1-indexed line, 0-indexed column) pair.
    /// Column is a character offset (UTF-8 codepoint count) within the line.
    pub fn offset_to_line_col(&self, byte_offset: usize) -> (usize, usize) {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_bytes = &self.content.as_bytes()[self.line_starts[line_idx]..byte_offset];
        // Counting non-continuation bytes equals the number of UTF-8
        // character starts within the line prefix.
        let col = line_bytes.iter().filter(|&&b| (b & 0xC0) != 0x80).count();
        (line_idx + 1, col)
    }

    pub fn location(&self, byte_offset: usize) -> Location {
        let (line, column) = self.offset_to_line_col(byte_offset);
        Location { line, column }
    }

    /// The 1-indexed line number an offset falls on.
    pub fn line_of(&self, byte_offset: usize) -> usize {
        self.offset_to_line_col(byte_offset).0
    }

    /// The leading whitespace of the line containing `byte_offset`.
    pub fn line_indent(&self, byte_offset: usize) -> &str {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let start = self.line_starts[line_idx];
        let rest = &self.content[start..];
        let end = rest
            .char_indices()
            .find(|(_, c)| *c != ' ' && *c != '\t')
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        &rest[..end]
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().unwrap_or("<non-utf8 path>")
    }
}

fn compute_line_starts(content: &str) -> Vec<usize> {
    let bytes = content.as_bytes();
    let mut starts = vec![0];
    for (i, &byte) in bytes.iter().enumerate() {
        if byte == b'\n' && i + 1 < bytes.len() {
            starts.push(i + 1);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(s: &str) -> SourceBuffer {
        SourceBuffer::from_string("test.src", s.to_string())
    }

    #[test]
    fn line_starts_single_line() {
        let sb = source("hello");
        assert_eq!(sb.line_starts, vec![0]);
    }

    #[test]
    fn line_starts_multiple_lines() {
        // "abc\ndef\nghi"
        // 0123 4567 89..
        let sb = source("abc\ndef\nghi");
        assert_eq!(sb.line_starts, vec![0, 4, 8]);
    }

    #[test]
    fn line_starts_trailing_newline() {
        // no line start after the last \n since there's no content
        let sb = source("abc\n");
        assert_eq!(sb.line_starts, vec![0]);
    }

    #[test]
    fn offset_to_line_col_first_char() {
        let sb = source("abc\ndef\nghi");
        assert_eq!(sb.offset_to_line_col(0), (1, 0));
    }

    #[test]
    fn offset_to_line_col_mid_first_line() {
        let sb = source("abc\ndef\nghi");
        assert_eq!(sb.offset_to_line_col(2), (1, 2));
    }

    #[test]
    fn offset_to_line_col_second_line_start() {
        let sb = source("abc\ndef\nghi");
        assert_eq!(sb.offset_to_line_col(4), (2, 0));
    }

    #[test]
    fn offset_to_line_col_multibyte() {
        // 'é' is two bytes; column counts characters, not bytes
        let sb = source("aé b");
        assert_eq!(sb.offset_to_line_col(3), (1, 2));
    }

    #[test]
    fn text_slices_by_range() {
        let sb = source("create :user");
        assert_eq!(sb.text(SourceRange::new(0, 6)), "create");
        assert_eq!(sb.text(SourceRange::new(7, 12)), ":user");
    }

    #[test]
    fn byte_at_probes() {
        let sb = source("create(:user)");
        assert_eq!(sb.byte_at(6), Some(b'('));
        assert_eq!(sb.byte_at(13), None);
    }

    #[test]
    fn line_indent_of_indented_line() {
        let sb = source("describe do\n  3.times { x }\nend");
        // offset 14 is inside "3.times"
        assert_eq!(sb.line_indent(14), "  ");
        assert_eq!(sb.line_indent(0), "");
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("unit.src");
        std::fs::write(&file, "x = 1\n").unwrap();
        let sb = SourceBuffer::from_path(&file).unwrap();
        assert_eq!(sb.as_str(), "x = 1\n");
        assert_eq!(sb.path, file);
    }

    #[test]
    fn from_path_nonexistent() {
        let result = SourceBuffer::from_path(Path::new("/nonexistent/unit.src"));
        assert!(result.is_err());
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn line_starts_first_is_zero(content in "[ -~\n]{0,300}") {
                let starts = compute_line_starts(&content);
                prop_assert_eq!(starts[0], 0, "first line start must be 0");
            }

            #[test]
            fn line_starts_are_strictly_increasing(content in "[ -~\n]{0,300}") {
                let starts = compute_line_starts(&content);
                for pair in starts.windows(2) {
                    prop_assert!(pair[0] < pair[1],
                        "line starts not strictly increasing: {} >= {}", pair[0], pair[1]);
                }
            }

            #[test]
            fn line_starts_follow_newlines(content in "[ -~\n]{0,300}") {
                let starts = compute_line_starts(&content);
                let bytes = content.as_bytes();
                for &start in &starts[1..] {
                    prop_assert!(start > 0 && bytes[start - 1] == b'\n',
                        "line start {} is not preceded by newline", start);
                }
            }

            #[test]
            fn offset_to_line_col_is_monotonic(content in "[ -~\n]{1,300}") {
                let sb = SourceBuffer::from_string("t", content.clone());
                let mut prev = (0usize, 0usize);
                for offset in 0..content.len() {
                    let cur = sb.offset_to_line_col(offset);
                    prop_assert!(cur >= prev,
                        "monotonicity violated at offset {}: {:?} < {:?}", offset, cur, prev);
                    prev = cur;
                }
            }

            #[test]
            fn offset_to_line_col_line_in_range(content in "[ -~\n]{1,300}") {
                let sb = SourceBuffer::from_string("t", content.clone());
                let num_lines = sb.line_starts.len();
                for offset in 0..content.len() {
                    let (line, _col) = sb.offset_to_line_col(offset);
                    prop_assert!(line >= 1 && line <= num_lines,
                        "line {} out of range [1, {}] for offset {}", line, num_lines, offset);
                }
            }
        }
    }
}
