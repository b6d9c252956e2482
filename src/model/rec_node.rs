//! Node of a reconciled gene tree.

use crate::model::event::EventKind;
use crate::model::rec_tree::{CladeId, NodeId};

// =#========================================================================#=
// REC NODE
// =#========================================================================$=
/// A node of a [ReconciledTree](crate::model::ReconciledTree).
///
/// Holds its links into the arena (parent and ordered children) and a fixed
/// set of optional, typed properties.
///
/// # Invariants
/// - `id` is the node's position in the tree arena and never changes
/// - `parent` is `None` only for the root
/// - the clade id is only changed through the tree, which keeps its clade
///   index in sync
/// - the stored time slice is only exposed through the tree, which hides it
///   while the tree is unsliced
#[derive(Debug, Clone, PartialEq)]
pub struct RecNode {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    name: Option<String>,
    species: Option<String>,
    event: Option<EventKind>,
    time_slice: Option<u32>,
    clade_id: Option<CladeId>,
}

impl RecNode {
    /// Creates a detached node without any properties.
    pub(crate) fn new(id: NodeId) -> Self {
        RecNode {
            id,
            parent: None,
            children: Vec::new(),
            name: None,
            species: None,
            event: None,
            time_slice: None,
            clade_id: None,
        }
    }

    /// Returns the id of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the id of the parent, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the ordered child ids.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns whether this node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the name, or the id as string if no name is set.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.id.to_string(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn species(&self) -> Option<&str> {
        self.species.as_deref()
    }

    pub fn set_species(&mut self, species: impl Into<String>) {
        self.species = Some(species.into());
    }

    pub fn event(&self) -> Option<EventKind> {
        self.event
    }

    pub fn set_event(&mut self, event: EventKind) {
        self.event = Some(event);
    }

    /// Returns whether the event of this node is `event`.
    pub fn has_event(&self, event: EventKind) -> bool {
        self.event == Some(event)
    }

    /// Returns whether this node is a leaf standing for a current gene
    /// (as opposed to a loss, which is also childless).
    pub fn is_real_leaf(&self) -> bool {
        self.has_event(EventKind::Extant)
    }

    pub fn clade_id(&self) -> Option<CladeId> {
        self.clade_id
    }

    /// Sets the time slice stored on this node.
    ///
    /// Whether it is visible depends on the tree's time-slice status.
    pub fn set_time_slice(&mut self, time_slice: u32) {
        self.time_slice = Some(time_slice);
    }

    // ============================================================================
    // Crate-internal access
    // ============================================================================
    pub(crate) fn stored_time_slice(&self) -> Option<u32> {
        self.time_slice
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }

    pub(crate) fn set_clade_raw(&mut self, clade_id: Option<CladeId>) {
        self.clade_id = clade_id;
    }
}
