//! recPhyloXML reader and writer for reconciled gene trees.
//!
//! A recPhyloXML document holds at most one species tree (`spTree`) and any
//! number of reconciled gene trees (`recGeneTree`). This module provides
//! [`RecPhyloXmlParser`] to read such documents into a [`RecPhylo`] and
//! [`RecPhyloXmlWriter`] to write them back.
//!
//! # Quick API
//! For simple use cases with default settings:
//! * [`parse_file`] - parses a file, returns a [`RecPhylo`]
//! * [`parse_str`] - parses a string, returns a [`RecPhylo`]
//! * [`write_file`] - writes a [`RecPhylo`] to a file
//!
//! # Full API
//! For more control, configure a [`RecPhyloXmlParser`] and provide a
//! [`TagReader`], or build single trees with [`CladeBuilder`].
//!
//! # Format
//! The reader is line-oriented: every line holds at most one tag (plus an
//! optional inline value and closing tag). A gene tree looks like this:
//! ```text
//! <recGeneTree>
//!   <phylogeny rooted="true">
//!     <clade>
//!       <name>A</name>
//!       <eventsRec>
//!         <speciationLoss speciesLocation="S0" timeSlice="3"></speciationLoss>
//!         <duplication speciesLocation="S1" timeSlice="2"></duplication>
//!       </eventsRec>
//!       <clade>
//!         ...
//!       </clade>
//!     </clade>
//!   </phylogeny>
//! </recGeneTree>
//! ```
//! Each event line of an `eventsRec` block becomes one node; the nodes of a
//! clade form a chain, the last of which carries the nested clades.

mod clade_builder;
mod defs;
mod species_reader;
pub mod writer;

pub use self::clade_builder::{
    BuiltTree, CladeBuilder, CladeDescription, EventLine, EventTag, read_clade, resolve_losses,
};
pub use self::species_reader::read_species_tree;
pub use self::writer::RecPhyloXmlWriter;

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use log::{info, warn};

use crate::model::rec_tree::{NodeId, ReconciledTree};
use crate::model::species_tree::SpeciesTree;
use crate::parser::buffered_line_source::BufferedLineSource;
use crate::parser::line_source::{InMemoryLineSource, LineSource};
use crate::parser::parsing_error::ParsingError;
use crate::parser::tag_reader::TagReader;
use self::defs::{CLADE, REC_GENE_TREE, SP_TREE};

// =#========================================================================#=
// REC PHYLO
// =#========================================================================$=
/// Contents of a recPhyloXML document.
#[derive(Debug, Clone, Default)]
pub struct RecPhylo {
    /// The species tree of the document, or the one given to the parser
    pub species_tree: Option<SpeciesTree>,
    /// All reconciled gene trees, in document order
    pub gene_trees: Vec<ReconciledTree>,
}

impl RecPhylo {
    pub fn new(species_tree: Option<SpeciesTree>, gene_trees: Vec<ReconciledTree>) -> Self {
        RecPhylo {
            species_tree,
            gene_trees,
        }
    }

    pub fn num_gene_trees(&self) -> usize {
        self.gene_trees.len()
    }
}

// =#========================================================================#=
// RECPHYLOXML PARSER
// =#========================================================================$=
/// Configurable parser for recPhyloXML documents.
///
/// By default the species tree is read from the document's `spTree` block.
/// Speciation losses of all gene trees are resolved against it once the
/// whole document has been read, so the `spTree` block may come last.
///
/// # Example
/// ```no_run
/// use recphylo::recphyloxml::RecPhyloXmlParser;
///
/// let rec_phylo = RecPhyloXmlParser::new().parse_file("reconciliations.xml")?;
/// for tree in &rec_phylo.gene_trees {
///     println!("{} duplications", tree.count_duplications());
/// }
/// # Ok::<(), recphylo::parser::ParsingError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RecPhyloXmlParser {
    species_tree: Option<SpeciesTree>,
    read_file_species_tree: bool,
}

impl Default for RecPhyloXmlParser {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Configuration (pub)
// ============================================================================
impl RecPhyloXmlParser {
    pub fn new() -> Self {
        RecPhyloXmlParser {
            species_tree: None,
            read_file_species_tree: true,
        }
    }

    /// Uses the given species tree for loss resolution.
    ///
    /// A species tree found in the document still replaces it, unless
    /// [ignore_file_species_tree](Self::ignore_file_species_tree) is set too.
    pub fn with_species_tree(mut self, species_tree: SpeciesTree) -> Self {
        self.species_tree = Some(species_tree);
        self
    }

    /// Skips `spTree` blocks of the document.
    pub fn ignore_file_species_tree(mut self) -> Self {
        self.read_file_species_tree = false;
        self
    }
}

// ============================================================================
// Parsing (pub)
// ============================================================================
impl RecPhyloXmlParser {
    /// Reads the whole file into memory and parses it.
    ///
    /// # Errors
    /// Returns an `IoError` if the file cannot be read, otherwise any error
    /// of [parse](Self::parse).
    pub fn parse_file<P: AsRef<Path>>(self, path: P) -> Result<RecPhylo, ParsingError> {
        let source = InMemoryLineSource::from_file(path)?;
        self.parse(TagReader::new(source))
    }

    /// Streams a file line by line through a `BufReader`.
    pub fn parse_file_buffered<P: AsRef<Path>>(self, path: P) -> Result<RecPhylo, ParsingError> {
        let source = BufferedLineSource::from_file(path)?;
        self.parse(TagReader::new(source))
    }

    /// Parses a document from any buffered reader.
    pub fn parse_reader<R: BufRead>(self, reader: R) -> Result<RecPhylo, ParsingError> {
        self.parse(TagReader::new(BufferedLineSource::new(reader)))
    }

    pub fn parse_str(self, input: &str) -> Result<RecPhylo, ParsingError> {
        self.parse(TagReader::from_string(input))
    }

    /// Parses all gene trees and the species tree, then resolves losses.
    ///
    /// A `recGeneTree` block without any `clade` is skipped with a warning.
    ///
    /// # Errors
    /// * `IoError` / `UnexpectedEOF` for unreadable or truncated input
    /// * `MalformedTag`, `UnknownEvent`, `EmptyEventList` for broken clades
    /// * `SpeciesNotFound`, `MalformedSpeciesTree`, `InvalidTreeStructure`
    ///   from loss resolution
    pub fn parse<S: LineSource>(self, mut reader: TagReader<S>) -> Result<RecPhylo, ParsingError> {
        let mut species_tree = self.species_tree;
        let mut gene_trees: Vec<ReconciledTree> = Vec::new();
        let mut pending: Vec<Vec<NodeId>> = Vec::new();

        let targets: &[&str] = if self.read_file_species_tree {
            &[REC_GENE_TREE, SP_TREE]
        } else {
            &[REC_GENE_TREE]
        };

        while let Some(block) = reader.skip_to_any(targets)? {
            if !reader.skip_to_within(CLADE, &block)? {
                warn!(
                    "No clade in {} block ending at line {}, skipped",
                    block,
                    reader.line_number()
                );
                continue;
            }

            if block == SP_TREE {
                species_tree = Some(read_species_tree(&mut reader)?);
            } else {
                let description = read_clade(&mut reader)?;
                let built = CladeBuilder::new().build(&description)?;
                info!(
                    "Read gene tree {} with {} nodes",
                    gene_trees.len(),
                    built.tree.num_nodes()
                );
                gene_trees.push(built.tree);
                pending.push(built.pending_losses);
            }
        }

        for (tree, pending_losses) in gene_trees.iter_mut().zip(&pending) {
            resolve_losses(tree, pending_losses, species_tree.as_ref())?;
        }

        info!("Read {} gene trees", gene_trees.len());
        Ok(RecPhylo {
            species_tree,
            gene_trees,
        })
    }
}

// ============================================================================
// QUICK API (pub)
// ============================================================================
/// Parses a recPhyloXML file using default settings.
///
/// # Arguments
/// * `path` - Path to the file (accepting `&str`, `String`, `Path`, or `PathBuf`)
///
/// # Returns
/// The species tree of the file (if any) and all reconciled gene trees,
/// with speciation losses resolved.
///
/// # Errors
/// Returns a [`ParsingError`] if the file cannot be read or is malformed.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<RecPhylo, ParsingError> {
    RecPhyloXmlParser::new().parse_file(path)
}

/// Parses a recPhyloXML document given as string, using default settings.
pub fn parse_str<S: AsRef<str>>(input: S) -> Result<RecPhylo, ParsingError> {
    RecPhyloXmlParser::new().parse_str(input.as_ref())
}

/// Writes a [`RecPhylo`] to a file.
///
/// # Errors
/// Returns an I/O error if the file cannot be created or writing fails.
pub fn write_file<P: AsRef<Path>>(path: P, rec_phylo: &RecPhylo) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = RecPhyloXmlWriter::new(file);
    writer.write_recphylo(rec_phylo)
}

/// Returns a [`RecPhylo`] as recPhyloXML string.
pub fn to_string(rec_phylo: &RecPhylo) -> io::Result<String> {
    let mut writer = RecPhyloXmlWriter::new(Vec::new());
    writer.write_recphylo(rec_phylo)?;
    let bytes = writer.into_inner()?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
