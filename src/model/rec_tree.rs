//! Provides the reconciled gene tree.
//!
//! * [ReconciledTree] - arena of [RecNode]s addressed by stable [NodeId]s,
//!   with a clade-id index and a tree-wide [TimeSliceStatus]
//! * [NodeId], [CladeId] and the sentinels [EMPTY_CLADE] and [DEAD_LINEAGE]
//!
//! Queries are implemented in [queries](crate::model::queries) and the
//! time-slice engine in [time_slices](crate::model::time_slices).

use std::collections::BTreeMap;

use crate::model::event::EventKind;
use crate::model::rec_node::RecNode;
use crate::model::tree_error::TreeError;

/// Index of a node in a tree (arena). Never reused within a tree.
pub type NodeId = usize;

/// Identifier of a clade (bipartition) a node belongs to.
pub type CladeId = i32;

/// Clade id of synthesized loss nodes: the empty clade.
pub const EMPTY_CLADE: CladeId = -1;

/// Species of a node living in an extinct or unsampled lineage.
pub const DEAD_LINEAGE: &str = "-1";

// =#========================================================================#=
// TIME SLICE STATUS
// =#========================================================================$=
/// Whether time slices of a tree are meaningful.
///
/// Stored once per tree. While [Unsliced](TimeSliceStatus::Unsliced), no node
/// exposes a time slice, even if one is stored on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSliceStatus {
    #[default]
    Unsliced,
    Sliced,
}

// =#========================================================================#=
// RECONCILED TREE
// =#========================================================================$=
/// A gene tree reconciled with a species tree, represented using the arena
/// pattern on [RecNode].
///
/// # Structure
/// - Nodes are stored in a vector and referenced by [NodeId]; removed nodes
///   leave a hole so ids stay stable and are never handed out twice.
/// - The root may change (e.g. when a parent is inserted above it).
/// - Children are ordered.
/// - Every change of a node's clade id goes through
///   [set_clade_id](ReconciledTree::set_clade_id) or
///   [reset_clade_id](ReconciledTree::reset_clade_id), which keep the
///   clade index consistent.
///
/// # Construction
/// Usually built by the recPhyloXML reader. To build by hand, start with
/// [new](ReconciledTree::new) (a single root without properties) and grow it
/// with [add_child](ReconciledTree::add_child) and
/// [insert_parent](ReconciledTree::insert_parent).
/// Test validity with [is_valid](ReconciledTree::is_valid).
#[derive(Debug, Clone)]
pub struct ReconciledTree {
    /// Nodes of this tree (arena pattern), `None` for removed nodes
    nodes: Vec<Option<RecNode>>,

    /// Id of the current root
    root: NodeId,

    /// Whether time slices are exposed
    status: TimeSliceStatus,

    /// Clade id -> ids of nodes carrying it
    clade_index: BTreeMap<CladeId, Vec<NodeId>>,
}

impl Default for ReconciledTree {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// New, Getters / Accessors, etc. (pub)
// ============================================================================
impl ReconciledTree {
    /// Creates a tree consisting of a root (id 0) without any properties.
    pub fn new() -> Self {
        ReconciledTree {
            nodes: vec![Some(RecNode::new(0))],
            root: 0,
            status: TimeSliceStatus::Unsliced,
            clade_index: BTreeMap::new(),
        }
    }

    /// Returns the id of the root.
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Returns a reference to the root node.
    pub fn root(&self) -> &RecNode {
        &self[self.root]
    }

    pub fn time_slice_status(&self) -> TimeSliceStatus {
        self.status
    }

    pub fn is_sliced(&self) -> bool {
        self.status == TimeSliceStatus::Sliced
    }

    pub(crate) fn set_time_slice_status(&mut self, status: TimeSliceStatus) {
        self.status = status;
    }

    /// Returns the number of nodes currently in the tree.
    pub fn num_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Returns the number of leaves (real leaves and losses).
    pub fn num_leaves(&self) -> usize {
        self.live_nodes().filter(|n| n.is_leaf()).count()
    }

    /// Returns whether a node with this id exists.
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id), Some(Some(_)))
    }

    /// Returns a reference to the node with the given id.
    ///
    /// # Errors
    /// Returns [TreeError::UnknownNode] if no such node exists.
    pub fn node(&self, id: NodeId) -> Result<&RecNode, TreeError> {
        match self.nodes.get(id) {
            Some(Some(node)) => Ok(node),
            _ => Err(TreeError::UnknownNode(id)),
        }
    }

    /// Returns a mutable reference to the node with the given id.
    ///
    /// # Errors
    /// Returns [TreeError::UnknownNode] if no such node exists.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut RecNode, TreeError> {
        match self.nodes.get_mut(id) {
            Some(Some(node)) => Ok(node),
            _ => Err(TreeError::UnknownNode(id)),
        }
    }

    /// Returns the parent id of a node (`None` for the root).
    pub fn parent_of(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        Ok(self.node(id)?.parent())
    }

    /// Returns the ordered children of a node.
    pub fn children_of(&self, id: NodeId) -> Result<&[NodeId], TreeError> {
        Ok(self.node(id)?.children())
    }

    /// Returns the time slice of a node as exposed by the tree.
    ///
    /// # Returns
    /// * `Ok(None)` - If the tree is unsliced or the node carries no time slice
    /// * `Ok(Some(ts))` - The node's time slice otherwise
    ///
    /// # Errors
    /// Returns [TreeError::UnknownNode] if no such node exists.
    pub fn time_slice(&self, id: NodeId) -> Result<Option<u32>, TreeError> {
        let node = self.node(id)?;
        match self.status {
            TimeSliceStatus::Unsliced => Ok(None),
            TimeSliceStatus::Sliced => Ok(node.stored_time_slice()),
        }
    }

    /// Returns the ids of all nodes in pre-order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.pre_order_iter().map(|n| n.id()).collect()
    }

    /// Returns all nodes in arena order (not tree order).
    pub(crate) fn live_nodes(&self) -> impl Iterator<Item = &RecNode> {
        self.nodes.iter().flatten()
    }

    // ============================================================================
    // Structural changes (pub)
    // ============================================================================
    /// Adds a new child without properties as last child of `parent`.
    ///
    /// # Returns
    /// The id of the new node.
    pub fn add_child(&mut self, parent: NodeId) -> Result<NodeId, TreeError> {
        self.node(parent)?;
        let id = self.allocate();
        self[id].set_parent(Some(parent));
        self[parent].children_mut().push(id);
        Ok(id)
    }

    /// Inserts a new node without properties between `id` and its parent.
    ///
    /// The new node takes the position of `id` among its parent's children.
    /// If `id` is the root, the new node becomes the root.
    ///
    /// # Returns
    /// The id of the new node.
    pub fn insert_parent(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        let old_parent = self.node(id)?.parent();
        let new_id = self.allocate();

        match old_parent {
            Some(parent) => {
                self.replace_child(parent, id, new_id);
                self[new_id].set_parent(Some(parent));
            }
            None => self.root = new_id,
        }
        self[new_id].children_mut().push(id);
        self[id].set_parent(Some(new_id));

        Ok(new_id)
    }

    /// Removes a node that has exactly one child; the child takes its place.
    ///
    /// The clade id of the removed node is cleared from the index first.
    /// Removing the root makes its child the new root.
    ///
    /// # Errors
    /// * [TreeError::UnknownNode] if no such node exists
    /// * [TreeError::InvalidStructure] if the node does not have exactly one child
    pub fn splice_out(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.node(id)?;
        if node.children().len() != 1 {
            return Err(TreeError::InvalidStructure(format!(
                "cannot splice out node {} with {} children",
                id,
                node.children().len()
            )));
        }
        let child = node.children()[0];
        let parent = node.parent();

        self.reset_clade_id(id)?;
        match parent {
            Some(parent) => self.replace_child(parent, id, child),
            None => self.root = child,
        }
        self[child].set_parent(parent);
        self.nodes[id] = None;

        Ok(())
    }

    // ============================================================================
    // Clade index (pub)
    // ============================================================================
    /// Sets the clade id of a node, keeping the clade index consistent.
    pub fn set_clade_id(&mut self, id: NodeId, clade_id: CladeId) -> Result<(), TreeError> {
        self.reset_clade_id(id)?;
        self[id].set_clade_raw(Some(clade_id));
        self.clade_index.entry(clade_id).or_default().push(id);
        Ok(())
    }

    /// Clears the clade id of a node, keeping the clade index consistent.
    ///
    /// # Returns
    /// The clade id the node carried, if any.
    pub fn reset_clade_id(&mut self, id: NodeId) -> Result<Option<CladeId>, TreeError> {
        let Some(old) = self.node(id)?.clade_id() else {
            return Ok(None);
        };
        self[id].set_clade_raw(None);

        if let Some(ids) = self.clade_index.get_mut(&old) {
            ids.retain(|&other| other != id);
            if ids.is_empty() {
                self.clade_index.remove(&old);
            }
        }
        Ok(Some(old))
    }

    /// Returns the ids of all nodes carrying the given clade id.
    pub fn node_ids_by_clade(&self, clade_id: CladeId) -> &[NodeId] {
        self.clade_index
            .get(&clade_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the number of distinct clade ids in use (including the empty clade).
    pub fn num_clades(&self) -> usize {
        self.clade_index.len()
    }

    // ============================================================================
    // Helpers (private)
    // ============================================================================
    fn allocate(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(RecNode::new(id)));
        id
    }

    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        for child in self[parent].children_mut().iter_mut() {
            if *child == old {
                *child = new;
            }
        }
    }
}

// ============================================================================
// Validation and comparison (pub)
// ============================================================================
impl ReconciledTree {
    /// Validates the tree structure, the node properties and the clade index.
    ///
    /// Checks:
    /// - Root exists and has no parent
    /// - Child and parent references are valid and point back to each other
    /// - Every node is reachable from the root
    /// - Every node has an event, and its number of children fits that event
    /// - The clade index matches the clade ids stored on the nodes
    /// - If sliced, every node except losses carries a time slice
    ///
    /// # Returns
    /// `true` if tree is valid, `false` otherwise
    pub fn is_valid(&self) -> bool {
        match self.node(self.root) {
            Ok(root) if root.is_root() => {}
            _ => return false,
        }

        for node in self.live_nodes() {
            let id = node.id();

            // Check children references
            for &child in node.children() {
                match self.node(child) {
                    Ok(c) if c.parent() == Some(id) => {}
                    _ => return false,
                }
            }

            // Check parent references
            match node.parent() {
                None if id != self.root => return false,
                Some(parent) => match self.node(parent) {
                    Ok(p) if p.children().contains(&id) => {}
                    _ => return false,
                },
                None => {}
            }

            // Check event and arity
            match node.event() {
                Some(event) if event.accepts_children(node.children().len()) => {}
                _ => return false,
            }

            // Check clade index
            if let Some(clade_id) = node.clade_id()
                && !self.node_ids_by_clade(clade_id).contains(&id)
            {
                return false;
            }

            // Check time slices
            if self.is_sliced()
                && !node.has_event(EventKind::Loss)
                && node.stored_time_slice().is_none()
            {
                return false;
            }
        }

        for (&clade_id, ids) in &self.clade_index {
            for &id in ids {
                match self.node(id) {
                    Ok(n) if n.clade_id() == Some(clade_id) => {}
                    _ => return false,
                }
            }
        }

        self.pre_order_iter().count() == self.num_nodes()
    }

    /// Compares two trees ignoring node ids, names and clade ids.
    ///
    /// Two trees have the same reconciliation if they have the same
    /// time-slice status and their roots match, where two nodes match if they
    /// have the same event, species and exposed time slice and their children
    /// match pairwise in order.
    pub fn same_reconciliation(&self, other: &ReconciledTree) -> bool {
        self.status == other.status && self.same_subtree(self.root, other, other.root)
    }

    fn same_subtree(&self, id: NodeId, other: &ReconciledTree, other_id: NodeId) -> bool {
        let a = &self[id];
        let b = &other[other_id];

        if a.event() != b.event()
            || a.species() != b.species()
            || a.children().len() != b.children().len()
        {
            return false;
        }
        if self.is_sliced() && a.stored_time_slice() != b.stored_time_slice() {
            return false;
        }

        a.children()
            .iter()
            .zip(b.children())
            .all(|(&x, &y)| self.same_subtree(x, other, y))
    }
}

impl std::ops::Index<NodeId> for ReconciledTree {
    type Output = RecNode;

    /// # Panics
    /// Panics if no node with this id exists.
    fn index(&self, index: NodeId) -> &Self::Output {
        match self.nodes.get(index) {
            Some(Some(node)) => node,
            _ => panic!("no node with id {index}"),
        }
    }
}

impl std::ops::IndexMut<NodeId> for ReconciledTree {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output {
        match self.nodes.get_mut(index) {
            Some(Some(node)) => node,
            _ => panic!("no node with id {index}"),
        }
    }
}

// ============================================================================
// Printing (pub)
// ============================================================================
impl ReconciledTree {
    /// Returns a one-line description of a node.
    ///
    /// # Example Output
    /// ```text
    /// Node 3 "G1" ; parent 1 ; species S1 ; event Extant ; clade 2 ; time slice 0
    /// ```
    pub fn describe_node(&self, id: NodeId) -> Result<String, TreeError> {
        let node = self.node(id)?;
        let mut desc = format!("Node {}", id);

        if let Some(name) = node.name() {
            desc.push_str(&format!(" \"{}\"", name));
        }
        match node.parent() {
            Some(parent) => desc.push_str(&format!(" ; parent {}", parent)),
            None => desc.push_str(" ; root"),
        }
        match node.species() {
            Some(species) => desc.push_str(&format!(" ; species {}", species)),
            None => desc.push_str(" ; no species"),
        }
        match node.event() {
            Some(event) => desc.push_str(&format!(" ; event {}", event)),
            None => desc.push_str(" ; no event"),
        }
        match node.clade_id() {
            Some(clade_id) => desc.push_str(&format!(" ; clade {}", clade_id)),
            None => desc.push_str(" ; no clade"),
        }
        match self.time_slice(id)? {
            Some(ts) => desc.push_str(&format!(" ; time slice {}", ts)),
            None => desc.push_str(" ; no time slice"),
        }

        Ok(desc)
    }

    /// Prints a visual representation of the tree to the console.
    ///
    /// # Example Output
    /// ```text
    /// Reconciled tree with 5 nodes (unsliced):
    /// Root: node 0
    ///   [0] Speciation S0
    ///     ├─ [1] Extant S1 "G1"
    ///     └─ [2] Duplication S2
    ///         ├─ [3] Extant S2 "G2"
    ///         └─ [4] Loss S2
    /// ```
    pub fn print_tree(&self) {
        let status = match self.status {
            TimeSliceStatus::Sliced => "sliced",
            TimeSliceStatus::Unsliced => "unsliced",
        };
        println!(
            "Reconciled tree with {} nodes ({}):",
            self.num_nodes(),
            status
        );
        println!("Root: node {}", self.root);
        self.print_node(self.root, "", true);
    }

    /// Helper function to recursively print a node and its children.
    fn print_node(&self, id: NodeId, prefix: &str, is_last: bool) {
        let node = &self[id];

        let connector = if prefix.is_empty() {
            ""
        } else if is_last {
            "└─ "
        } else {
            "├─ "
        };

        let event = node
            .event()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "?".to_string());
        let mut line = format!(
            "{}{}[{}] {} {}",
            prefix,
            connector,
            id,
            event,
            node.species().unwrap_or("?")
        );
        if let Some(name) = node.name() {
            line.push_str(&format!(" \"{}\"", name));
        }
        if let Ok(Some(ts)) = self.time_slice(id) {
            line.push_str(&format!(" (ts: {})", ts));
        }
        println!("{}", line);

        let new_prefix = if prefix.is_empty() {
            "  ".to_string()
        } else {
            format!("{}{}  ", prefix, if is_last { " " } else { "│" })
        };
        let children = node.children();
        for (i, &child) in children.iter().enumerate() {
            self.print_node(child, &new_prefix, i + 1 == children.len());
        }
    }
}

// =#========================================================================#=
// ITERATORS
// =#========================================================================$=
impl ReconciledTree {
    /// Returns an iterator over the tree in pre-order (parents before children,
    /// children in order).
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }

    /// Returns an iterator over the tree in post-order (children before parents).
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }

    /// Returns an iterator over the leaves in pre-order.
    pub fn leaves(&self) -> impl Iterator<Item = &RecNode> {
        self.pre_order_iter().filter(|n| n.is_leaf())
    }
}

/// Iterator for pre-order traversal (parents before children).
///
/// Stack-based, so deep (e.g. heavily subdivided) trees do not recurse.
pub struct PreOrderIter<'a> {
    tree: &'a ReconciledTree,
    stack: Vec<NodeId>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a ReconciledTree) -> Self {
        PreOrderIter {
            tree,
            stack: vec![tree.root],
        }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a RecNode;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.tree[id];

        // Push children in reverse, so the first child is processed first
        self.stack.extend(node.children().iter().rev());

        Some(node)
    }
}

/// Iterator for post-order traversal (children before parents).
pub struct PostOrderIter<'a> {
    tree: &'a ReconciledTree,
    stack: Vec<(NodeId, bool)>, // (id, children_visited)
}

impl<'a> PostOrderIter<'a> {
    fn new(tree: &'a ReconciledTree) -> Self {
        PostOrderIter {
            tree,
            stack: vec![(tree.root, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a RecNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((id, children_visited)) = self.stack.pop() {
            let node = &self.tree[id];

            if children_visited || node.is_leaf() {
                return Some(node);
            }

            self.stack.push((id, true));
            for &child in node.children().iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_parent_above_root() {
        let mut tree = ReconciledTree::new();
        let child = tree.add_child(0).unwrap();
        let new_root = tree.insert_parent(0).unwrap();

        assert_eq!(tree.root_id(), new_root);
        assert_eq!(tree.children_of(new_root).unwrap(), &[0]);
        assert_eq!(tree.parent_of(0).unwrap(), Some(new_root));
        assert_eq!(tree.parent_of(child).unwrap(), Some(0));
    }

    #[test]
    fn test_insert_parent_keeps_child_position() {
        let mut tree = ReconciledTree::new();
        let a = tree.add_child(0).unwrap();
        let b = tree.add_child(0).unwrap();
        let p = tree.insert_parent(a).unwrap();

        assert_eq!(tree.children_of(0).unwrap(), &[p, b]);
        assert_eq!(tree.children_of(p).unwrap(), &[a]);
    }

    #[test]
    fn test_splice_out_and_stable_ids() {
        let mut tree = ReconciledTree::new();
        let mid = tree.add_child(0).unwrap();
        let leaf = tree.add_child(mid).unwrap();
        tree.set_clade_id(mid, 4).unwrap();

        tree.splice_out(mid).unwrap();
        assert!(!tree.contains(mid));
        assert_eq!(tree.children_of(0).unwrap(), &[leaf]);
        assert!(tree.node_ids_by_clade(4).is_empty());

        // Ids are never reused
        let next = tree.add_child(0).unwrap();
        assert_eq!(next, 3);
        assert!(matches!(tree.node(mid), Err(TreeError::UnknownNode(1))));
    }

    #[test]
    fn test_splice_out_requires_single_child() {
        let mut tree = ReconciledTree::new();
        assert!(matches!(
            tree.splice_out(0),
            Err(TreeError::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_clade_index_follows_reassignment() {
        let mut tree = ReconciledTree::new();
        let a = tree.add_child(0).unwrap();
        tree.set_clade_id(0, 0).unwrap();
        tree.set_clade_id(a, 0).unwrap();
        assert_eq!(tree.node_ids_by_clade(0), &[0, a]);

        tree.set_clade_id(a, 1).unwrap();
        assert_eq!(tree.node_ids_by_clade(0), &[0]);
        assert_eq!(tree.node_ids_by_clade(1), &[a]);

        assert_eq!(tree.reset_clade_id(0).unwrap(), Some(0));
        assert_eq!(tree.num_clades(), 1);
        assert_eq!(tree.reset_clade_id(0).unwrap(), None);
    }

    #[test]
    fn test_time_slice_hidden_when_unsliced() {
        let mut tree = ReconciledTree::new();
        tree[0].set_time_slice(3);
        assert_eq!(tree.time_slice(0).unwrap(), None);
        tree.set_time_slice_status(TimeSliceStatus::Sliced);
        assert_eq!(tree.time_slice(0).unwrap(), Some(3));
    }

    #[test]
    fn test_post_order() {
        let mut tree = ReconciledTree::new();
        let a = tree.add_child(0).unwrap();
        let b = tree.add_child(0).unwrap();
        let c = tree.add_child(a).unwrap();
        let order: Vec<_> = tree.post_order_iter().map(|n| n.id()).collect();
        assert_eq!(order, vec![c, a, b, 0]);
        let order: Vec<_> = tree.pre_order_iter().map(|n| n.id()).collect();
        assert_eq!(order, vec![0, a, c, b]);
    }
}
