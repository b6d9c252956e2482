//! Time-slice engine of [ReconciledTree].
//!
//! [subdivide](ReconciledTree::subdivide) inserts filler
//! [NoEvent](EventKind::NoEvent) nodes so that every edge spans exactly one
//! time-slice step; [contract](ReconciledTree::contract) removes them again.

use log::debug;

use crate::model::event::EventKind;
use crate::model::rec_tree::{DEAD_LINEAGE, NodeId, ReconciledTree, TimeSliceStatus};
use crate::model::tree_error::TreeError;

impl ReconciledTree {
    /// Makes every time-slice step explicit.
    ///
    /// For every non-root node with time slice `t` below a parent with time
    /// slice `p`, inserts `p - t - 1` [NoEvent](EventKind::NoEvent) nodes with
    /// time slices `p - 1` down to `t + 1`. Inserted nodes take the species
    /// and clade id of the node below them, except above a
    /// [Reception](EventKind::Reception), where they live in the dead lineage.
    ///
    /// A node without time slice (typically a loss) is first assigned
    /// `p - 1`, clamped at 0, and keeps that value.
    ///
    /// Sets the tree to [Sliced](TimeSliceStatus::Sliced). Subdividing an
    /// already subdivided tree changes nothing.
    ///
    /// # Errors
    /// Returns [TreeError::NoTimeSlices] if the root carries no time slice.
    pub fn subdivide(&mut self) -> Result<(), TreeError> {
        let root = self.root_id();
        let Some(root_slice) = self[root].stored_time_slice() else {
            return Err(TreeError::NoTimeSlices);
        };

        let mut inserted = 0usize;
        // Parents are visited before children, so a parent's slice is always known
        for id in self.node_ids() {
            let Some(parent) = self[id].parent() else {
                continue;
            };
            let parent_slice = self[parent].stored_time_slice().unwrap_or(root_slice);

            let slice = match self[id].stored_time_slice() {
                Some(ts) => ts,
                None => {
                    let ts = parent_slice.saturating_sub(1);
                    self[id].set_time_slice(ts);
                    ts
                }
            };

            if parent_slice.saturating_sub(slice) > 1 {
                inserted += self.fill_gap(id, parent_slice, slice)?;
            }
        }

        debug!("Subdivided tree: inserted {} filler nodes", inserted);
        self.set_time_slice_status(TimeSliceStatus::Sliced);
        Ok(())
    }

    /// Inserts the filler chain above `id`; returns the number of inserted nodes.
    fn fill_gap(
        &mut self,
        id: NodeId,
        parent_slice: u32,
        slice: u32,
    ) -> Result<usize, TreeError> {
        let node = &self[id];
        let species = if node.has_event(EventKind::Reception) {
            Some(DEAD_LINEAGE.to_string())
        } else {
            node.species().map(str::to_string)
        };
        let clade_id = node.clade_id();

        // Each filler goes directly above `id`, so the highest slice comes first
        let mut count = 0;
        for ts in (slice.saturating_add(1)..parent_slice).rev() {
            let filler = self.insert_parent(id)?;
            let filler_node = &mut self[filler];
            filler_node.set_event(EventKind::NoEvent);
            filler_node.set_time_slice(ts);
            if let Some(species) = &species {
                filler_node.set_species(species.clone());
            }
            if let Some(clade_id) = clade_id {
                self.set_clade_id(filler, clade_id)?;
            }
            count += 1;
        }
        Ok(count)
    }

    /// Removes all [NoEvent](EventKind::NoEvent) nodes, connecting each
    /// one's child directly to its parent, and sets the tree to
    /// [Unsliced](TimeSliceStatus::Unsliced).
    ///
    /// Does nothing if the tree is already unsliced.
    pub fn contract(&mut self) -> Result<(), TreeError> {
        if self.time_slice_status() == TimeSliceStatus::Unsliced {
            return Ok(());
        }

        let fillers: Vec<NodeId> = self
            .pre_order_iter()
            .filter(|n| n.has_event(EventKind::NoEvent))
            .map(|n| n.id())
            .collect();
        for &id in &fillers {
            self.splice_out(id)?;
        }

        debug!("Contracted tree: removed {} filler nodes", fillers.len());
        self.set_time_slice_status(TimeSliceStatus::Unsliced);
        Ok(())
    }
}
