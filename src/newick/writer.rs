//! Newick export of reconciled gene trees.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::model::event::EventKind;
use crate::model::rec_tree::{NodeId, ReconciledTree};

/// Extra buffer in Newick string length/capacity estimate
const BUFFER_CHARS: usize = 10;

/// Guess for the length of one `name|event|species|timeSlice` label
const LABEL_CHARS_GUESS: usize = 24;

/// Label part for a node without event
const NO_EVENT: &str = "NOEVENT";

/// Label part for a node without species
const NO_SPECIES: &str = "no species";

/// Label part for a node without (visible) time slice
const NO_TIME_SLICE: &str = "NOTS";

/// Writes the given trees to a file in Newick format, one tree per line.
///
/// # Arguments
/// * `file` - The file to write to
/// * `trees` - Trees to write
/// * `hide_losses` - Whether to leave out loss branches, see [to_newick]
///
/// # Errors
/// Returns an I/O error if writing fails.
pub fn write_newick_file(file: File, trees: &[ReconciledTree], hide_losses: bool) -> io::Result<()> {
    let mut writer = BufWriter::new(file);
    for tree in trees {
        writer.write_all(to_newick(tree, hide_losses).as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Returns a Newick representation of a reconciled tree with closing semicolon.
///
/// Every node is labelled `name|event|species|timeSlice`, where the event is
/// its short label (`Extant`, `Spe`, `Dup`, ...), unnamed nodes use their id
/// and missing parts are written as `NOEVENT`, `no species` and `NOTS`.
/// Labels are quoted where Newick requires it. There are no branch lengths.
///
/// With `hide_losses`, loss leaves are left out, as is any internal node all
/// of whose children are left out.
///
/// # Example
/// ```
/// use recphylo::model::{EventKind, ReconciledTree};
/// use recphylo::newick::to_newick;
///
/// let mut tree = ReconciledTree::new();
/// let root = tree.root_id();
/// tree[root].set_event(EventKind::Speciation);
/// tree[root].set_species("S0");
/// let a = tree.add_child(root)?;
/// tree[a].set_event(EventKind::Extant);
/// tree[a].set_species("S1");
/// tree[a].set_name("a");
/// let lost = tree.add_child(root)?;
/// tree[lost].set_event(EventKind::Loss);
/// tree[lost].set_species("S2");
///
/// assert_eq!(to_newick(&tree, false), "(a|Extant|S1|NOTS,2|Loss|S2|NOTS)0|Spe|S0|NOTS;");
/// assert_eq!(to_newick(&tree, true), "(a|Extant|S1|NOTS)0|Spe|S0|NOTS;");
/// # Ok::<(), recphylo::model::TreeError>(())
/// ```
pub fn to_newick(tree: &ReconciledTree, hide_losses: bool) -> String {
    let mut newick = String::with_capacity(tree.num_nodes() * LABEL_CHARS_GUESS + BUFFER_CHARS);
    append_subtree(tree, tree.root_id(), hide_losses, &mut newick);
    newick.push(';');
    newick
}

/// Appends the subtree of `id`; returns `false` (appending nothing) if the
/// whole subtree is hidden.
fn append_subtree(tree: &ReconciledTree, id: NodeId, hide_losses: bool, newick: &mut String) -> bool {
    let node = &tree[id];
    if hide_losses && node.has_event(EventKind::Loss) {
        return false;
    }

    if !node.is_leaf() {
        let mut subtrees = String::new();
        let mut written = 0;
        for &child in node.children() {
            let mut child_newick = String::new();
            if append_subtree(tree, child, hide_losses, &mut child_newick) {
                if written > 0 {
                    subtrees.push(',');
                }
                subtrees.push_str(&child_newick);
                written += 1;
            }
        }
        if written == 0 {
            return false;
        }
        newick.push('(');
        newick.push_str(&subtrees);
        newick.push(')');
    }

    newick.push_str(&escape_label(&node_label(tree, id)));
    true
}

/// Returns `name|event|species|timeSlice` of a node.
fn node_label(tree: &ReconciledTree, id: NodeId) -> String {
    let node = &tree[id];
    let event = node.event().map(|e| e.short_label()).unwrap_or(NO_EVENT);
    let species = node.species().unwrap_or(NO_SPECIES);
    let time_slice = match tree.time_slice(id) {
        Ok(Some(ts)) => ts.to_string(),
        _ => NO_TIME_SLICE.to_string(),
    };
    format!("{}|{}|{}|{}", node.display_name(), event, species, time_slice)
}

/// Quotes a label if it contains characters with a meaning in Newick.
pub fn escape_label(label: &str) -> String {
    if label.chars().any(|c| matches!(c, ' ' | ',' | ';' | '\t' | '\n' | '\r' | '(' | ')' | ':' | '[' | ']' | '\'')) {
        // Replace single quotes with double single quotes (SQL-style escaping)
        let escaped = label.replace('\'', "''");
        format!("'{}'", escaped)
    } else {
        label.to_string()
    }
}

impl ReconciledTree {
    /// Returns the Newick representation of this tree, see [to_newick].
    pub fn to_newick(&self, hide_losses: bool) -> String {
        to_newick(self, hide_losses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_label() {
        assert_eq!(escape_label("a|Extant|S1|0"), "a|Extant|S1|0");
        assert_eq!(escape_label("a|Loss|no species|NOTS"), "'a|Loss|no species|NOTS'");
        assert_eq!(escape_label("it's"), "'it''s'");
    }

    #[test]
    fn test_hidden_subtree_drops_parent() {
        let mut tree = ReconciledTree::new();
        let root = tree.root_id();
        tree[root].set_event(EventKind::Duplication);
        let left = tree.add_child(root).unwrap();
        tree[left].set_event(EventKind::Extant);
        let right = tree.add_child(root).unwrap();
        tree[right].set_event(EventKind::SpeciationOut);
        let loss = tree.add_child(right).unwrap();
        tree[loss].set_event(EventKind::Loss);

        assert_eq!(
            tree.to_newick(true),
            "('1|Extant|no species|NOTS')'0|Dup|no species|NOTS';"
        );
    }
}
