//! Source file management.
//!
//! The [`SourceMap`] owns the text of every file loaded for a
//! compilation. Each [`SourceFile`] keeps a precomputed table of line
//! start offsets so any byte offset can be converted to a 1-based
//! (line, column) pair for diagnostics.

use super::{FileId, Span};

/// A single source file: name, content, and line-start table
///
/// The line table stores the byte offset of the first byte of every
/// line; lookups binary-search it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File identifier within the owning [`SourceMap`]
    id: FileId,
    /// Display name used in diagnostics (usually the path)
    name: String,
    /// Full UTF-8 content
    content: String,
    /// Byte offset of the start of each line
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create a new source file and compute its line table
    pub fn new(id: FileId, name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let mut line_starts = vec![0];
        for (i, b) in content.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            id,
            name: name.into(),
            content,
            line_starts,
        }
    }

    /// File identifier
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Display name for diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full file content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of lines in the file
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset to a 1-based (line, column) pair
    ///
    /// Columns count bytes from the line start. Offsets past the end of
    /// the file map to the last position.
    ///
    /// # Examples
    ///
    /// ```
    /// use subc_util::span::{FileId, SourceFile};
    ///
    /// let file = SourceFile::new(FileId(0), "demo.sb", "var x = 1\nprint(x)\n");
    /// assert_eq!(file.offset_to_line_col(0), (1, 1));
    /// assert_eq!(file.offset_to_line_col(10), (2, 1));
    /// ```
    pub fn offset_to_line_col(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.content.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let column = offset - self.line_starts[line];
        (line as u32 + 1, column as u32 + 1)
    }

    /// The text of a 1-based line, without its terminator
    pub fn line_at(&self, line: u32) -> Option<&str> {
        let idx = line.checked_sub(1)? as usize;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&next| next - 1)
            .unwrap_or(self.content.len());
        Some(&self.content[start..end])
    }
}

/// All source files loaded for one compilation
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    /// Create an empty source map
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Add a file and return its id
    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<String>) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile::new(id, name, content));
        id
    }

    /// Look up a file by id
    pub fn get(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.index())
    }

    /// Number of loaded files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Render a span as `name:line:col` for diagnostics
    pub fn format_span(&self, span: Span) -> Option<String> {
        let file = self.get(span.file_id)?;
        Some(format!("{}:{}:{}", file.name(), span.line, span.column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_table() {
        let file = SourceFile::new(FileId(0), "t.sb", "ab\ncd\n\nef");
        assert_eq!(file.line_count(), 4);
        assert_eq!(file.offset_to_line_col(0), (1, 1));
        assert_eq!(file.offset_to_line_col(1), (1, 2));
        assert_eq!(file.offset_to_line_col(3), (2, 1));
        assert_eq!(file.offset_to_line_col(6), (3, 1));
        assert_eq!(file.offset_to_line_col(7), (4, 1));
    }

    #[test]
    fn test_offset_past_end() {
        let file = SourceFile::new(FileId(0), "t.sb", "ab");
        assert_eq!(file.offset_to_line_col(100), (1, 3));
    }

    #[test]
    fn test_line_at() {
        let file = SourceFile::new(FileId(0), "t.sb", "first\nsecond\nthird");
        assert_eq!(file.line_at(1), Some("first"));
        assert_eq!(file.line_at(2), Some("second"));
        assert_eq!(file.line_at(3), Some("third"));
        assert_eq!(file.line_at(4), None);
        assert_eq!(file.line_at(0), None);
    }

    #[test]
    fn test_source_map() {
        let mut map = SourceMap::new();
        let a = map.add_file("a.sb", "print(1)");
        let b = map.add_file("b.sb", "print(2)");
        assert_ne!(a, b);
        assert_eq!(map.file_count(), 2);
        assert_eq!(map.get(a).unwrap().name(), "a.sb");

        let span = Span::with_file(0, 5, b, 1, 1);
        assert_eq!(map.format_span(span).unwrap(), "b.sb:1:1");
    }
}
