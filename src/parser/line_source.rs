//! Line source abstractions for the tag reader.
//!
//! This module provides the [LineSource] trait and the in-memory
//! implementation [InMemoryLineSource].

use std::fs;
use std::io;
use std::path::Path;

// =#========================================================================#=
// LINE SOURCE (Trait)
// =#========================================================================T=
/// Trait defining the interface for different line sources used by TagReader.
///
/// recPhyloXML is read one line at a time, so a source only has to hand out
/// lines in order and count them:
/// - In-memory strings (`String` / `&str`)
/// - Buffered reading from files (`BufReader<File>`)
pub trait LineSource {
    /// Get the next line and advance (consume it).
    ///
    /// The returned line has its line terminator (`\n` or `\r\n`) removed.
    ///
    /// # Returns
    /// * `Ok(Some(String))` - The next line if available
    /// * `Ok(None)` - If at end of data (EOF)
    ///
    /// # Errors
    /// Returns an error if the underlying reader fails.
    fn next_line(&mut self) -> io::Result<Option<String>>;

    /// Returns the number of lines consumed so far.
    ///
    /// After a successful call to [next_line](LineSource::next_line), this is
    /// the 1-based number of the line just returned.
    fn line_number(&self) -> usize;
}

/// Strip a trailing `\n` or `\r\n` in place.
pub(crate) fn trim_line_end(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}

// =#========================================================================#=
// IN MEMORY LINE SOURCE
// =#========================================================================$=
/// An in-memory line source that owns its data.
///
/// Fastest option for files that fit entirely in memory, and the natural
/// choice when parsing from a string.
pub struct InMemoryLineSource {
    /// The owned text being read
    input: String,
    /// Current byte offset into `input`
    pos: usize,
    /// Number of lines handed out
    line: usize,
}

impl InMemoryLineSource {
    /// Creates a new in-memory line source from a string.
    ///
    /// # Arguments
    /// * `text` - The text to read
    pub fn from_string(text: impl Into<String>) -> Self {
        Self {
            input: text.into(),
            pos: 0,
            line: 0,
        }
    }

    /// Reads the whole file into memory.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid UTF-8.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<InMemoryLineSource> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::from_string(contents))
    }
}

impl LineSource for InMemoryLineSource {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        if self.pos >= self.input.len() {
            return Ok(None);
        }

        let rest = &self.input[self.pos..];
        let (mut line, consumed) = match rest.find('\n') {
            Some(i) => (rest[..=i].to_string(), i + 1),
            None => (rest.to_string(), rest.len()),
        };
        self.pos += consumed;
        self.line += 1;

        trim_line_end(&mut line);
        Ok(Some(line))
    }

    fn line_number(&self) -> usize {
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_and_numbers() {
        let mut source = InMemoryLineSource::from_string("a\r\nb\n\nc");
        assert_eq!(source.next_line().unwrap().as_deref(), Some("a"));
        assert_eq!(source.line_number(), 1);
        assert_eq!(source.next_line().unwrap().as_deref(), Some("b"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("c"));
        assert_eq!(source.line_number(), 4);
        assert_eq!(source.next_line().unwrap(), None);
        assert_eq!(source.line_number(), 4);
    }

    #[test]
    fn test_empty_input() {
        let mut source = InMemoryLineSource::from_string("");
        assert_eq!(source.next_line().unwrap(), None);
        assert_eq!(source.line_number(), 0);
    }
}
