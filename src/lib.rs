//! Recphylo is a library to read and write reconciled gene trees in the
//! recPhyloXML format.
//!
//! A reconciliation maps each node of a gene tree onto a species tree and
//! labels it with an evolutionary event (speciation, duplication, transfer,
//! loss, ...). This crate offers a reader and a writer for recPhyloXML files
//! together with a tree model to work with such reconciliations.
//! Core functionality provided:
//! - recPhyloXML: Read the species tree (`spTree`) and all reconciled gene
//!   trees (`recGeneTree`) of a file; write them back, compressing event
//!   chains into clades as the format intends.
//! - Tree models:
//!   - [ReconciledTree]: Arena of [RecNode](model::RecNode)s with stable ids,
//!     typed per-node event/species/time slice and a clade index.
//!   - [SpeciesTree]: Plain species tree with name lookup.
//!   - See [crate::model] for more details.
//! - Time slices: [subdivide](ReconciledTree::subdivide) makes every
//!   time-slice step explicit with filler nodes,
//!   [contract](ReconciledTree::contract) removes them again.
//! - Queries: ancestry, species/time compatibility, event counts, subtree
//!   cloning and per-species event summaries.
//! - Newick: Export with `name|event|species|timeSlice` labels, see
//!   [crate::newick].
//!
//! Limitations:
//! - The reader expects at most one tag per line, as written by common
//!   reconciliation tools and by this crate.
//! - Loss resolution requires a bifurcating species tree.
//!
//! # Usage patterns
//! Can parse files in two main ways:
//! 1. Several methods provide quick access to the parser with default
//!    settings. See below and [crate::recphyloxml].
//! 2. Configure a [RecPhyloXmlParser](recphyloxml::RecPhyloXmlParser) for
//!    control over the species tree and the line source.
//!
//! ## Example Default Configuration
//!
//! Parse a file and count events:
//! ```no_run
//! use recphylo::parse_recphyloxml_file;
//!
//! let rec_phylo = parse_recphyloxml_file("reconciliations.xml").unwrap();
//! for tree in &rec_phylo.gene_trees {
//!     println!(
//!         "{} duplications, {} transfers, {} losses",
//!         tree.count_duplications(),
//!         tree.count_transfers(),
//!         tree.count_losses()
//!     );
//! }
//! ```
//!
//! ## Example Parser Configuration
//!
//! Use a species tree of your own and stream the file:
//! ```no_run
//! use recphylo::model::SpeciesTree;
//! use recphylo::recphyloxml::RecPhyloXmlParser;
//!
//! let mut species = SpeciesTree::new();
//! let root = species.add_root(Some("S0".to_string()));
//! species.add_child(root, Some("S1".to_string()), None);
//! species.add_child(root, Some("S2".to_string()), None);
//!
//! let rec_phylo = RecPhyloXmlParser::new()
//!     .with_species_tree(species)
//!     .ignore_file_species_tree()
//!     .parse_file_buffered("gene_trees_only.xml")?;
//! println!("Loaded {} gene trees", rec_phylo.num_gene_trees());
//! # Ok::<(), recphylo::parser::ParsingError>(())
//! ```

pub mod model;
pub mod newick;
pub mod parser;
pub mod recphyloxml;

pub use crate::model::{ReconciledTree, SpeciesTree};
pub use crate::recphyloxml::RecPhylo;

use std::io;
use std::path::Path;

use crate::parser::parsing_error::ParsingError;

// ============================================================================
// Quick recPhyloXML API
// ============================================================================
/// Parses a recPhyloXML file using default settings.
///
/// See [`recphyloxml::parse_file`] for full documentation.
pub fn parse_recphyloxml_file<P: AsRef<Path>>(path: P) -> Result<RecPhylo, ParsingError> {
    recphyloxml::parse_file(path)
}

/// Parses a recPhyloXML string using default settings.
///
/// # Example
/// ```
/// use recphylo::parse_recphyloxml_str;
///
/// let input = r#"<recPhylo>
/// <recGeneTree>
/// <phylogeny rooted="true">
/// <clade>
/// <name>G1</name>
/// <eventsRec>
/// <leaf speciesLocation="S1"></leaf>
/// </eventsRec>
/// </clade>
/// </phylogeny>
/// </recGeneTree>
/// </recPhylo>"#;
///
/// let rec_phylo = parse_recphyloxml_str(input)?;
/// let tree = &rec_phylo.gene_trees[0];
/// assert_eq!(tree.num_nodes(), 1);
/// assert_eq!(tree.root().species(), Some("S1"));
/// # Ok::<(), recphylo::parser::ParsingError>(())
/// ```
pub fn parse_recphyloxml_str<S: AsRef<str>>(input: S) -> Result<RecPhylo, ParsingError> {
    recphyloxml::parse_str(input)
}

/// Writes a species tree and gene trees to a recPhyloXML file.
///
/// See [`recphyloxml::write_file`] for full documentation.
pub fn write_recphyloxml_file<P: AsRef<Path>>(path: P, rec_phylo: &RecPhylo) -> io::Result<()> {
    recphyloxml::write_file(path, rec_phylo)
}

/// Returns a species tree and gene trees as recPhyloXML string.
pub fn to_recphyloxml_string(rec_phylo: &RecPhylo) -> io::Result<String> {
    recphyloxml::to_string(rec_phylo)
}
