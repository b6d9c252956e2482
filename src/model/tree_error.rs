//! Errors raised by operations on an already built tree.

use crate::model::rec_tree::NodeId;
use thiserror::Error;

/// Errors of the query layer, the time-slice engine and id/name lookups.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Node {node} has no {property}")]
    MissingProperty { node: NodeId, property: &'static str },
    #[error("No node with id {0}")]
    UnknownNode(NodeId),
    #[error("No node with name \"{0}\"")]
    NameNotFound(String),
    #[error("Tree carries no time slices")]
    NoTimeSlices,
    #[error("Invalid tree structure - {0}")]
    InvalidStructure(String),
}
