//! Line-oriented tag reader for recPhyloXML.
//!
//! This module provides [Tag], the interpretation of a single line, and
//! [TagReader], which pulls lines from a [LineSource] and interprets them one
//! at a time. It is not a general XML parser: every line is assumed to hold at
//! most one element start (optionally followed by inline text and the matching
//! end tag), and attribute values never span lines.

use std::collections::BTreeMap;

use crate::parser::line_source::{InMemoryLineSource, LineSource};
use crate::parser::parsing_error::ParsingError;

// =#========================================================================#=
// TAG
// =#========================================================================$=
/// Interpretation of one physical line.
///
/// A line without a recognizable `<name ...>` yields a *text-only* tag: empty
/// `name` and the trimmed line as `value`.
///
/// # Example
/// ```
/// use recphylo::parser::tag_reader::Tag;
///
/// let tag = Tag::interpret("  <leaf speciesLocation=\"S1\" geneName=\"G1\"></leaf>", 1).unwrap();
/// assert_eq!(tag.name, "leaf");
/// assert!(!tag.closing);
/// assert_eq!(tag.attribute("speciesLocation"), Some("S1"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tag {
    /// Tag name without the leading `/` of a closing tag
    pub name: String,
    /// Whether this is a closing tag (`</name>`)
    pub closing: bool,
    /// Whether the tag closes itself (`<name/>`)
    pub self_closing: bool,
    /// Attributes in the order-independent form `name -> value`
    pub attributes: BTreeMap<String, String>,
    /// Text between the end of the tag and the next `<` on the same line
    pub value: String,
}

impl Tag {
    /// Interprets one line.
    ///
    /// # Arguments
    /// * `line` - The line content, without line terminator
    /// * `line_number` - 1-based line number, used for error reporting only
    ///
    /// # Errors
    /// Returns a `MalformedTag` error if an attribute lacks `=` or a quoted
    /// value (`"..."` or `'...'`) is not terminated on the same line.
    pub fn interpret(line: &str, line_number: usize) -> Result<Tag, ParsingError> {
        let bytes = line.as_bytes();

        let Some(open) = line.find('<') else {
            return Ok(Tag::text_only(line));
        };

        let mut start = open + 1;
        // Comments and doctype declarations carry no data
        if bytes.get(start) == Some(&b'!') {
            return Ok(Tag::text_only(line));
        }
        let closing = bytes.get(start) == Some(&b'/');
        if closing {
            start += 1;
        }

        // Name ends at the first space or '>', whichever comes first
        let Some(gt) = line[start..].find('>').map(|i| i + start) else {
            return Ok(Tag::text_only(line));
        };
        let name_end = match line[start..gt].find([' ', '\t']) {
            Some(i) => start + i,
            None => gt,
        };
        let mut name = &line[start..name_end];
        let mut self_closing = false;
        if let Some(stripped) = name.strip_suffix('/') {
            name = stripped;
            self_closing = true;
        }

        let mut tag = Tag {
            name: name.to_string(),
            closing,
            self_closing,
            ..Default::default()
        };

        let after = tag.read_attributes(line, name_end, line_number)?;
        if after < line.len() {
            let rest = &line[after..];
            let end = rest.find('<').unwrap_or(rest.len());
            tag.value = rest[..end].trim().to_string();
        }

        Ok(tag)
    }

    /// Returns the value of the given attribute, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Returns whether this is a text-only line (no tag).
    pub fn is_text(&self) -> bool {
        self.name.is_empty()
    }

    /// Returns whether this is the opening tag `<name ...>`.
    pub fn is_opening(&self, name: &str) -> bool {
        !self.closing && self.name == name
    }

    /// Returns whether this is the closing tag `</name>`.
    pub fn is_closing(&self, name: &str) -> bool {
        self.closing && self.name == name
    }

    fn text_only(line: &str) -> Tag {
        Tag {
            value: line.trim().to_string(),
            ..Default::default()
        }
    }

    /// Reads attributes starting at byte `pos` and returns the position
    /// right after the terminating `>`.
    fn read_attributes(
        &mut self,
        line: &str,
        mut pos: usize,
        line_number: usize,
    ) -> Result<usize, ParsingError> {
        let bytes = line.as_bytes();
        let malformed = |msg: &str| ParsingError::malformed_tag(line_number, line, msg.to_string());

        loop {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            match bytes.get(pos) {
                None => return Err(malformed("tag not closed by '>'")),
                Some(b'>') => return Ok(pos + 1),
                Some(b'/') | Some(b'?') if bytes.get(pos + 1) == Some(&b'>') => {
                    if bytes[pos] == b'/' {
                        self.self_closing = true;
                    }
                    return Ok(pos + 2);
                }
                _ => {}
            }

            // ==== Attribute name
            let name_start = pos;
            while pos < bytes.len() && bytes[pos] != b'=' {
                if bytes[pos] == b'>' || bytes[pos].is_ascii_whitespace() {
                    return Err(malformed(&format!(
                        "attribute \"{}\" without '='",
                        &line[name_start..pos]
                    )));
                }
                pos += 1;
            }
            if pos >= bytes.len() {
                return Err(malformed(&format!(
                    "attribute \"{}\" without '='",
                    &line[name_start..]
                )));
            }
            let key = line[name_start..pos].to_string();
            pos += 1;

            // ==== Attribute value
            let value = if let Some(&quote @ (b'"' | b'\'')) = bytes.get(pos) {
                let value_start = pos + 1;
                let Some(len) = line[value_start..].find(quote as char) else {
                    return Err(malformed(&format!(
                        "unterminated quoted value of attribute \"{}\"",
                        key
                    )));
                };
                pos = value_start + len + 1;
                &line[value_start..value_start + len]
            } else {
                let value_start = pos;
                while pos < bytes.len() && bytes[pos] != b'>' && !bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                if pos >= bytes.len() {
                    return Err(malformed(&format!(
                        "unterminated value of attribute \"{}\"",
                        key
                    )));
                }
                &line[value_start..pos]
            };

            self.attributes.insert(key, value.to_string());
        }
    }
}

// =#========================================================================#=
// TAG READER
// =#========================================================================$=
/// Reads a [LineSource] one [Tag] at a time.
///
/// Keeps the most recently read line for error context. No lookahead and no
/// buffering across lines.
pub struct TagReader<S: LineSource> {
    source: S,
    current_line: String,
}

impl TagReader<InMemoryLineSource> {
    /// Creates a new `TagReader` over an in-memory copy of the given text.
    pub fn from_string(input: &str) -> Self {
        Self::new(InMemoryLineSource::from_string(input))
    }
}

impl<S: LineSource> TagReader<S> {
    /// Creates a new `TagReader` from a line source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            current_line: String::new(),
        }
    }

    /// Reads and interprets the next line.
    ///
    /// # Returns
    /// * `Ok(Some(Tag))` - Interpretation of the next line
    /// * `Ok(None)` - At end of input
    ///
    /// # Errors
    /// Returns an `IoError` if reading fails, or a `MalformedTag` error if
    /// the line has broken attribute syntax.
    pub fn next_tag(&mut self) -> Result<Option<Tag>, ParsingError> {
        match self.source.next_line()? {
            None => {
                self.current_line.clear();
                Ok(None)
            }
            Some(line) => {
                self.current_line = line;
                Tag::interpret(&self.current_line, self.source.line_number()).map(Some)
            }
        }
    }

    /// Reads the next tag, treating end of input as an error.
    ///
    /// # Errors
    /// Same as [next_tag](TagReader::next_tag), plus `UnexpectedEOF`.
    pub fn expect_tag(&mut self) -> Result<Tag, ParsingError> {
        match self.next_tag()? {
            Some(tag) => Ok(tag),
            None => Err(ParsingError::unexpected_eof(self)),
        }
    }

    /// Consumes lines until one opens a tag named in `targets`.
    ///
    /// # Arguments
    /// * `targets` - Tag names to stop at (opening tags only)
    ///
    /// # Returns
    /// * `Ok(Some(name))` - The target that matched; the matching line is consumed
    /// * `Ok(None)` - End of input reached without a match
    pub fn skip_to_any(&mut self, targets: &[&str]) -> Result<Option<String>, ParsingError> {
        while let Some(tag) = self.next_tag()? {
            if !tag.closing && targets.contains(&tag.name.as_str()) {
                return Ok(Some(tag.name));
            }
        }
        Ok(None)
    }

    /// Consumes lines until one opens the tag `target`.
    ///
    /// # Returns
    /// `true` if the tag was found, `false` if input ended first.
    pub fn skip_to(&mut self, target: &str) -> Result<bool, ParsingError> {
        Ok(self.skip_to_any(&[target])?.is_some())
    }

    /// Consumes lines until one opens `target`, but stops after the closing
    /// tag of `enclosing`.
    ///
    /// # Returns
    /// `true` if `target` was found inside the enclosing block, `false` if the
    /// block (or input) ended first.
    pub fn skip_to_within(&mut self, target: &str, enclosing: &str) -> Result<bool, ParsingError> {
        while let Some(tag) = self.next_tag()? {
            if tag.is_opening(target) {
                return Ok(true);
            }
            if tag.is_closing(enclosing) {
                return Ok(false);
            }
        }
        Ok(false)
    }

    /// Returns the 1-based number of the most recently read line.
    pub fn line_number(&self) -> usize {
        self.source.line_number()
    }

    /// Returns the content of the most recently read line.
    pub fn current_line(&self) -> &str {
        &self.current_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parsing_error::ParsingErrorType;

    #[test]
    fn test_closing_tag() {
        let tag = Tag::interpret("  </clade>", 3).unwrap();
        assert_eq!(tag.name, "clade");
        assert!(tag.closing);
        assert!(tag.attributes.is_empty());
        assert!(tag.value.is_empty());
    }

    #[test]
    fn test_inline_value() {
        let tag = Tag::interpret("<name>  G1_a </name>", 1).unwrap();
        assert_eq!(tag.name, "name");
        assert_eq!(tag.value, "G1_a");
    }

    #[test]
    fn test_unquoted_attribute() {
        let tag = Tag::interpret("<phylogeny rooted=true>", 1).unwrap();
        assert_eq!(tag.name, "phylogeny");
        assert_eq!(tag.attribute("rooted"), Some("true"));
    }

    #[test]
    fn test_quoted_value_with_spaces_and_angle() {
        let tag = Tag::interpret(r#"<leaf geneName="a b>c" speciesLocation="x"/>"#, 1).unwrap();
        assert_eq!(tag.attribute("geneName"), Some("a b>c"));
        assert_eq!(tag.attribute("speciesLocation"), Some("x"));
        assert!(tag.self_closing);
    }

    #[test]
    fn test_single_quoted_value() {
        let tag = Tag::interpret(r#"<leaf geneName='say "hi"' speciesLocation="S1"></leaf>"#, 1).unwrap();
        assert_eq!(tag.attribute("geneName"), Some(r#"say "hi""#));
        assert_eq!(tag.attribute("speciesLocation"), Some("S1"));
    }

    #[test]
    fn test_text_only_line() {
        let tag = Tag::interpret("   continued name ", 1).unwrap();
        assert!(tag.is_text());
        assert_eq!(tag.value, "continued name");
    }

    #[test]
    fn test_xml_declaration() {
        let tag = Tag::interpret(r#"<?xml version="1.0" encoding="UTF-8"?>"#, 1).unwrap();
        assert_eq!(tag.name, "?xml");
        assert_eq!(tag.attribute("version"), Some("1.0"));
    }

    #[test]
    fn test_comment_is_text() {
        let tag = Tag::interpret("<!-- generated by ALE, any = sign -->", 1).unwrap();
        assert!(tag.is_text());
    }

    #[test]
    fn test_missing_equals() {
        let err = Tag::interpret("<leaf speciesLocation></leaf>", 7).unwrap_err();
        assert!(matches!(err.kind(), ParsingErrorType::MalformedTag(_)));
        assert_eq!(err.line(), 7);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = Tag::interpret(r#"<leaf speciesLocation="S1></leaf>"#, 2).unwrap_err();
        assert!(matches!(err.kind(), ParsingErrorType::MalformedTag(_)));
    }

    #[test]
    fn test_skip_to_any_reports_match() {
        let mut reader = TagReader::from_string("<recPhylo>\n</spTree>\n<recGeneTree>\n<clade>\n");
        let found = reader.skip_to_any(&["spTree", "recGeneTree"]).unwrap();
        assert_eq!(found.as_deref(), Some("recGeneTree"));
        assert_eq!(reader.line_number(), 3);
        assert!(reader.skip_to("clade").unwrap());
        assert_eq!(reader.skip_to_any(&["clade"]).unwrap(), None);
    }

    #[test]
    fn test_skip_to_within_stops_at_block_end() {
        let mut reader =
            TagReader::from_string("<phylogeny>\n</phylogeny>\n</recGeneTree>\n<clade>\n");
        assert!(!reader.skip_to_within("clade", "recGeneTree").unwrap());
        assert!(reader.skip_to("clade").unwrap());
    }
}
