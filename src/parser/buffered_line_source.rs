//! Buffered reader implementation of line source.
//!
//! This module provides [BufferedLineSource], which wraps any [BufRead]
//! (typically a [BufReader] over a [File]) for streaming I/O. Use this for
//! large files where loading everything into memory would be impractical.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::parser::line_source::{LineSource, trim_line_end};

// =#========================================================================#=
// BUFFERED LINE SOURCE
// =#========================================================================$=
/// A buffered line source for streaming large files.
pub struct BufferedLineSource<R: BufRead> {
    /// Underlying reader, handles getting chunks from the file
    reader: R,
    /// Reused buffer for the current line
    buffer: String,
    /// Number of lines handed out
    line: usize,
}

impl<R: BufRead> BufferedLineSource<R> {
    /// Default capacity for the line buffer.
    const LINE_BUFFER_CAPACITY: usize = 256;

    /// Wraps an existing buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::with_capacity(Self::LINE_BUFFER_CAPACITY),
            line: 0,
        }
    }
}

impl BufferedLineSource<BufReader<File>> {
    /// Creates a new buffered line source from a file path.
    ///
    /// # Arguments
    /// * `path` - Path to the file (accepting `&str`, `String`, `Path`, or `PathBuf`)
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LineSource for BufferedLineSource<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buffer.clear();
        let read = self.reader.read_line(&mut self.buffer)?;
        if read == 0 {
            return Ok(None);
        }
        self.line += 1;

        let mut line = std::mem::take(&mut self.buffer);
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
    use std::io::Cursor;

    #[test]
    fn test_reads_from_cursor() {
        let mut source = BufferedLineSource::new(Cursor::new("<a>\n  <b/>\r\n"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("<a>"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("  <b/>"));
        assert_eq!(source.next_line().unwrap(), None);
        assert_eq!(source.line_number(), 2);
    }
}
