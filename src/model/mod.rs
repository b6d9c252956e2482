//! Data model for reconciled gene trees and species trees.
//!
//! # Reconciled trees
//! A [ReconciledTree] stores [RecNode]s in an arena, addressed by stable
//! [NodeId]s. Every node carries an [EventKind], the species it maps to, an
//! optional time slice and an optional [CladeId]. The tree keeps
//! * an index from clade id to node ids, updated whenever a clade id changes,
//! * a single [TimeSliceStatus] deciding whether time slices are exposed.
//!
//! Operations on a built tree are grouped as follows:
//! * [queries] - ancestry, paths, compatibility, event counts, cloning, lookups
//! * [time_slices] - `subdivide` / `contract`
//!
//! # Species trees
//! A [SpeciesTree] is a plain rooted tree with name lookup, used to resolve
//! losses while reading and written back out unchanged.

pub mod event;
pub mod queries;
pub mod rec_node;
pub mod rec_tree;
pub mod species_tree;
pub mod time_slices;
pub mod tree_error;

pub use event::EventKind;
pub use queries::EventSummary;
pub use rec_node::RecNode;
pub use rec_tree::{CladeId, DEAD_LINEAGE, EMPTY_CLADE, NodeId, ReconciledTree, TimeSliceStatus};
pub use species_tree::{SpeciesIndex, SpeciesNode, SpeciesTree};
pub use tree_error::TreeError;
