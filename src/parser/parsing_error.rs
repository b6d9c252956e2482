//! Error types for recPhyloXML parsing.
//!
//! This module provides [ParsingError] and [ParsingErrorType] for representing
//! and reporting errors that occur while reading recPhyloXML files.

use crate::parser::line_source::LineSource;
use crate::parser::tag_reader::TagReader;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Maximum number of characters of the offending line kept as context
const DEFAULT_CONTEXT_LENGTH: usize = 80;

// =#========================================================================#=
// PARSING ERROR TYPE
// =#========================================================================$=
/// Error types that can occur during recPhyloXML parsing.
#[derive(Error, PartialEq, Debug, Clone)]
pub enum ParsingErrorType {
    #[error("IO error - {0}")]
    IoError(String),
    #[error("Unexpected end of file")]
    UnexpectedEOF,
    #[error("Malformed tag - {0}")]
    MalformedTag(String),
    #[error("Unknown reconciliation event \"{0}\"")]
    UnknownEvent(String),
    #[error("Clade without any reconciliation event")]
    EmptyEventList,
    #[error("Could not find species \"{0}\" in species tree")]
    SpeciesNotFound(String),
    #[error("Malformed species tree - {0}")]
    MalformedSpeciesTree(String),
    #[error("Invalid tree structure - {0}")]
    InvalidTreeStructure(String),
}

// =#========================================================================#=
// PARSING ERROR
// =#========================================================================$=
/// Parsing error with contextual information (line number and line content).
#[derive(Debug)]
pub struct ParsingError {
    kind: ParsingErrorType,
    line: usize,
    context: String,
}

impl ParsingError {
    /// Create a ParsingError from an error type and reader state
    pub fn from_reader<S: LineSource>(kind: ParsingErrorType, reader: &TagReader<S>) -> Self {
        Self::at_line(kind, reader.line_number(), reader.current_line())
    }

    /// Create a ParsingError for a given line number and line content
    pub fn at_line(kind: ParsingErrorType, line: usize, content: &str) -> Self {
        Self {
            kind,
            line,
            context: content.trim().chars().take(DEFAULT_CONTEXT_LENGTH).collect(),
        }
    }

    /// Convenience constructor for UnexpectedEOF
    pub fn unexpected_eof<S: LineSource>(reader: &TagReader<S>) -> Self {
        Self {
            kind: ParsingErrorType::UnexpectedEOF,
            line: reader.line_number(),
            context: String::new(),
        }
    }

    /// Convenience constructor for MalformedTag
    pub fn malformed_tag(line: usize, content: &str, msg: String) -> Self {
        Self::at_line(ParsingErrorType::MalformedTag(msg), line, content)
    }

    /// Convenience constructor for UnknownEvent
    pub fn unknown_event<S: LineSource>(reader: &TagReader<S>, tag_name: &str) -> Self {
        Self::from_reader(ParsingErrorType::UnknownEvent(tag_name.to_string()), reader)
    }

    /// Convenience constructor for EmptyEventList
    pub fn empty_event_list<S: LineSource>(reader: &TagReader<S>) -> Self {
        Self::from_reader(ParsingErrorType::EmptyEventList, reader)
    }

    /// Create a ParsingError without reader context (for post-pass errors)
    pub fn without_context(kind: ParsingErrorType) -> Self {
        Self {
            kind,
            line: 0,
            context: String::new(),
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> &ParsingErrorType {
        &self.kind
    }

    /// Get the (1-based) line where the error occurred, 0 if unknown
    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if self.line > 0 {
            write!(f, " at line {}", self.line)?;
        }

        if !self.context.is_empty() {
            write!(f, "\n  Context: {}", self.context)?;
        }

        Ok(())
    }
}

impl Error for ParsingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<std::io::Error> for ParsingError {
    fn from(err: std::io::Error) -> Self {
        ParsingError::without_context(ParsingErrorType::IoError(err.to_string()))
    }
}
