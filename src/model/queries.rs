//! Query layer of [ReconciledTree]: ancestry, paths, compatibility,
//! event counts, subtree cloning and lookups.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::model::event::EventKind;
use crate::model::rec_tree::{NodeId, ReconciledTree, TimeSliceStatus};
use crate::model::tree_error::TreeError;

impl ReconciledTree {
    // ============================================================================
    // Ancestry and paths
    // ============================================================================
    /// Returns whether `ancestor` is a strict ancestor of `descendant`.
    ///
    /// No node is its own ancestor; the root is an ancestor of every other node.
    ///
    /// # Errors
    /// Returns [TreeError::UnknownNode] if either id is unknown.
    pub fn is_ancestor(&self, ancestor: NodeId, descendant: NodeId) -> Result<bool, TreeError> {
        self.node(ancestor)?;
        let mut current = self.node(descendant)?.parent();
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self[id].parent();
        }
        Ok(false)
    }

    /// Returns the ids on the path from `ancestor` down to `descendant`, both
    /// included.
    ///
    /// The path is built by walking up from `descendant`. If `ancestor` is not
    /// actually an ancestor, the walk stops at the root and the returned path
    /// starts at the root instead. Callers that need to tell the two cases
    /// apart should check the first element or use
    /// [is_ancestor](ReconciledTree::is_ancestor).
    ///
    /// # Errors
    /// Returns [TreeError::UnknownNode] if either id is unknown.
    pub fn path_from_ancestor_to_descendant(
        &self,
        ancestor: NodeId,
        descendant: NodeId,
    ) -> Result<Vec<NodeId>, TreeError> {
        self.node(ancestor)?;
        self.node(descendant)?;

        let mut path = vec![descendant];
        let mut current = descendant;
        while current != ancestor {
            match self[current].parent() {
                Some(parent) => {
                    path.push(parent);
                    current = parent;
                }
                None => break,
            }
        }
        path.reverse();
        Ok(path)
    }

    // ============================================================================
    // Compatibility
    // ============================================================================
    /// Returns whether two nodes map to the same species.
    ///
    /// # Errors
    /// * [TreeError::UnknownNode] if either id is unknown
    /// * [TreeError::MissingProperty] if either node has no species
    pub fn have_same_species(&self, x: NodeId, y: NodeId) -> Result<bool, TreeError> {
        let species_of = |id: NodeId| -> Result<&str, TreeError> {
            self.node(id)?.species().ok_or(TreeError::MissingProperty {
                node: id,
                property: "species",
            })
        };
        Ok(species_of(x)? == species_of(y)?)
    }

    /// Returns whether two nodes lie in the same time slice.
    ///
    /// Always `true` for an unsliced tree.
    ///
    /// # Errors
    /// * [TreeError::UnknownNode] if either id is unknown
    /// * [TreeError::MissingProperty] if the tree is sliced and a node has no time slice
    pub fn are_time_compatible(&self, x: NodeId, y: NodeId) -> Result<bool, TreeError> {
        if self.time_slice_status() == TimeSliceStatus::Unsliced {
            self.node(x)?;
            self.node(y)?;
            return Ok(true);
        }
        let slice_of = |id: NodeId| -> Result<u32, TreeError> {
            self.time_slice(id)?.ok_or(TreeError::MissingProperty {
                node: id,
                property: "time slice",
            })
        };
        Ok(slice_of(x)? == slice_of(y)?)
    }

    /// Returns whether two nodes have the same species and compatible time slices.
    pub fn are_compatible(&self, x: NodeId, y: NodeId) -> Result<bool, TreeError> {
        Ok(self.have_same_species(x, y)? && self.are_time_compatible(x, y)?)
    }

    // ============================================================================
    // Event counts
    // ============================================================================
    /// Returns the number of nodes with the given event.
    pub fn count_event(&self, event: EventKind) -> usize {
        self.live_nodes().filter(|n| n.has_event(event)).count()
    }

    pub fn count_duplications(&self) -> usize {
        self.count_event(EventKind::Duplication)
    }

    pub fn count_losses(&self) -> usize {
        self.count_event(EventKind::Loss)
    }

    /// Returns the number of transfers, counted at their reception.
    pub fn count_transfers(&self) -> usize {
        self.live_nodes()
            .filter(|n| n.event().is_some_and(|e| e.is_transfer()))
            .count()
    }

    /// Counts events per species.
    ///
    /// Nodes without species or event are skipped. Filler
    /// [NoEvent](EventKind::NoEvent) nodes are not counted.
    pub fn event_summary_by_species(&self) -> EventSummary {
        let mut summary = EventSummary::default();
        for node in self.live_nodes() {
            if let (Some(species), Some(event)) = (node.species(), node.event())
                && event != EventKind::NoEvent
            {
                summary.add(species, event, 1);
            }
        }
        summary
    }

    // ============================================================================
    // Subtrees and lookups
    // ============================================================================
    /// Deep-copies the subtree rooted at `root` into a new tree.
    ///
    /// The clone carries the same time-slice status. Ids are renumbered in
    /// pre-order starting with 0 at the new root; all node properties are kept
    /// and the clade index is rebuilt.
    pub fn clone_subtree(&self, root: NodeId) -> Result<ReconciledTree, TreeError> {
        self.node(root)?;

        let mut clone = ReconciledTree::new();
        clone.set_time_slice_status(self.time_slice_status());

        // (source id, parent id in clone)
        let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(root, None)];
        while let Some((source, parent)) = stack.pop() {
            let target = match parent {
                Some(parent) => clone.add_child(parent)?,
                None => clone.root_id(),
            };
            self.copy_properties(source, &mut clone, target)?;

            let children = self[source].children();
            stack.extend(children.iter().rev().map(|&child| (child, Some(target))));
        }

        Ok(clone)
    }

    fn copy_properties(
        &self,
        source: NodeId,
        clone: &mut ReconciledTree,
        target: NodeId,
    ) -> Result<(), TreeError> {
        let node = &self[source];
        let copy = clone.node_mut(target)?;
        if let Some(name) = node.name() {
            copy.set_name(name);
        }
        if let Some(species) = node.species() {
            copy.set_species(species);
        }
        if let Some(event) = node.event() {
            copy.set_event(event);
        }
        if let Some(ts) = node.stored_time_slice() {
            copy.set_time_slice(ts);
        }
        if let Some(clade_id) = node.clade_id() {
            clone.set_clade_id(target, clade_id)?;
        }
        Ok(())
    }

    /// Returns the names of all real leaves (extant genes), in pre-order.
    ///
    /// Losses are excluded. Unnamed leaves are reported by their id.
    pub fn real_leaf_names(&self) -> Vec<String> {
        self.leaves()
            .filter(|n| n.is_real_leaf())
            .map(|n| n.display_name())
            .collect()
    }

    /// Returns the id of the first node with the given name, searching
    /// breadth-first from the root.
    ///
    /// # Errors
    /// Returns [TreeError::NameNotFound] if no node has this name.
    pub fn node_id_by_name(&self, name: &str) -> Result<NodeId, TreeError> {
        let mut queue = VecDeque::from([self.root_id()]);
        while let Some(id) = queue.pop_front() {
            let node = &self[id];
            if node.name() == Some(name) {
                return Ok(id);
            }
            queue.extend(node.children());
        }
        Err(TreeError::NameNotFound(name.to_string()))
    }
}

// =#========================================================================#=
// EVENT SUMMARY
// =#========================================================================$=
/// Event counts per species, as produced by
/// [event_summary_by_species](ReconciledTree::event_summary_by_species).
///
/// Summaries of several trees can be combined with [merge](EventSummary::merge).
/// The `Display` implementation renders a table with one row per species.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSummary {
    counts: BTreeMap<String, BTreeMap<EventKind, usize>>,
}

impl EventSummary {
    fn add(&mut self, species: &str, event: EventKind, n: usize) {
        *self
            .counts
            .entry(species.to_string())
            .or_default()
            .entry(event)
            .or_insert(0) += n;
    }

    /// Returns how often `event` occurred in `species`.
    pub fn count(&self, species: &str, event: EventKind) -> usize {
        self.counts
            .get(species)
            .and_then(|c| c.get(&event))
            .copied()
            .unwrap_or(0)
    }

    /// Returns the total number of events counted for `species`.
    pub fn total(&self, species: &str) -> usize {
        self.counts.get(species).map(|c| c.values().sum()).unwrap_or(0)
    }

    /// Returns the species with at least one event, sorted.
    pub fn species(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Adds all counts of `other` to this summary.
    pub fn merge(&mut self, other: &EventSummary) {
        for (species, events) in &other.counts {
            for (&event, &n) in events {
                self.add(species, event, n);
            }
        }
    }
}

impl fmt::Display for EventSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<EventKind> = EventKind::ALL
            .into_iter()
            .filter(|&e| e != EventKind::NoEvent)
            .collect();
        let width = self
            .counts
            .keys()
            .map(String::len)
            .chain(std::iter::once("species".len()))
            .max()
            .unwrap_or(0)
            + 3;

        write!(f, "{:<width$}", "species")?;
        for event in &events {
            let name = event.to_string();
            write!(f, "{:<w$}", name, w = name.len() + 3)?;
        }
        writeln!(f)?;

        for species in self.counts.keys() {
            write!(f, "{:<width$}", species)?;
            for event in &events {
                let w = event.to_string().len() + 3;
                write!(f, "{:<w$}", self.count(species, *event))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
