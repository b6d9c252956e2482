//! Newick export of reconciled gene trees.
//!
//! Reconciled trees are written in a pseudo-Newick format where each node
//! carries its reconciliation in the label: `name|event|species|timeSlice`,
//! e.g. `(a|Extant|S1|0,b|Extant|S2|0)n0|Spe|S0|2;`. Such strings are meant
//! for inspection and for tools that only need the topology; they are not
//! read back by this crate.
//!
//! * [`to_newick`] - returns the Newick string of one tree
//! * [`write_newick_file`] - writes several trees, one per line
//!
//! Species trees have their own plain Newick form, see
//! [SpeciesTree::to_newick](crate::model::SpeciesTree::to_newick).

pub mod writer;

pub use self::writer::{escape_label, to_newick, write_newick_file};
