//! Plain rooted species tree, used as lookup table during reconciliation.

use std::collections::HashMap;

/// Index of a node in a [SpeciesTree] (arena).
pub type SpeciesIndex = usize;

// =#========================================================================#=
// SPECIES NODE
// =#========================================================================$=
/// A node of a [SpeciesTree].
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesNode {
    index: SpeciesIndex,
    name: Option<String>,
    parent: Option<SpeciesIndex>,
    children: Vec<SpeciesIndex>,
    branch_length: Option<f64>,
}

impl SpeciesNode {
    pub fn index(&self) -> SpeciesIndex {
        self.index
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the name, falling back to the index as string.
    ///
    /// Gene-tree nodes refer to species by this label.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.index.to_string(),
        }
    }

    pub fn parent(&self) -> Option<SpeciesIndex> {
        self.parent
    }

    pub fn children(&self) -> &[SpeciesIndex] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Distance to parent, if given.
    pub fn branch_length(&self) -> Option<f64> {
        self.branch_length
    }
}

// =#========================================================================#=
// SPECIES TREE
// =#========================================================================$=
/// A rooted species tree with name lookup, using the arena pattern.
///
/// Built once per input file and read-only afterwards. Nodes are looked up
/// by label: their name, or their index if they have none.
///
/// # Example
/// ```
/// use recphylo::model::SpeciesTree;
///
/// let mut tree = SpeciesTree::new();
/// let root = tree.add_root(Some("S0".to_string()));
/// tree.add_child(root, Some("S1".to_string()), Some(1.0));
/// tree.add_child(root, Some("S2".to_string()), Some(1.5));
///
/// assert_eq!(tree.to_newick(), "(S1:1,S2:1.5)S0;");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SpeciesTree {
    nodes: Vec<SpeciesNode>,
    root: Option<SpeciesIndex>,
    by_name: HashMap<String, SpeciesIndex>,
}

impl SpeciesTree {
    /// Creates an empty species tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the root node.
    ///
    /// # Returns
    /// The index of the newly created root.
    pub fn add_root(&mut self, name: Option<String>) -> SpeciesIndex {
        let index = self.push(name, None, None);
        self.root = Some(index);
        index
    }

    /// Adds a node as last child of `parent`.
    ///
    /// # Panics
    /// Panics if `parent` is out of bounds.
    pub fn add_child(
        &mut self,
        parent: SpeciesIndex,
        name: Option<String>,
        branch_length: Option<f64>,
    ) -> SpeciesIndex {
        let index = self.push(name, Some(parent), branch_length);
        self.nodes[parent].children.push(index);
        index
    }

    /// Sets the name of a node and registers it for lookup.
    pub fn set_name(&mut self, index: SpeciesIndex, name: String) {
        if let Some(old) = self.nodes[index].name.take() {
            self.by_name.remove(&old);
        }
        self.by_name.insert(name.clone(), index);
        self.nodes[index].name = Some(name);
    }

    pub fn set_branch_length(&mut self, index: SpeciesIndex, branch_length: f64) {
        self.nodes[index].branch_length = Some(branch_length);
    }

    /// Returns whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> Option<&SpeciesNode> {
        self.root.map(|r| &self.nodes[r])
    }

    pub fn root_index(&self) -> Option<SpeciesIndex> {
        self.root
    }

    pub fn node(&self, index: SpeciesIndex) -> Option<&SpeciesNode> {
        self.nodes.get(index)
    }

    /// Looks up a node by label (name, or index for unnamed nodes).
    pub fn node_by_name(&self, label: &str) -> Option<&SpeciesNode> {
        if let Some(&index) = self.by_name.get(label) {
            return Some(&self.nodes[index]);
        }
        let index: SpeciesIndex = label.parse().ok()?;
        self.nodes.get(index).filter(|n| n.name.is_none())
    }

    pub fn children_of(&self, index: SpeciesIndex) -> &[SpeciesIndex] {
        self.nodes.get(index).map(|n| n.children()).unwrap_or(&[])
    }

    pub fn parent_of(&self, index: SpeciesIndex) -> Option<SpeciesIndex> {
        self.nodes.get(index).and_then(|n| n.parent)
    }

    /// Returns the labels of all leaves, in pre-order.
    pub fn leaf_labels(&self) -> Vec<String> {
        self.pre_order_iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.label())
            .collect()
    }

    /// Returns an iterator over the tree in pre-order.
    pub fn pre_order_iter(&self) -> impl Iterator<Item = &SpeciesNode> {
        let mut stack: Vec<SpeciesIndex> = self.root.into_iter().collect();
        std::iter::from_fn(move || {
            let index = stack.pop()?;
            let node = &self.nodes[index];
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Returns a Newick string with node labels and branch lengths.
    ///
    /// Returns an empty string for an empty tree.
    pub fn to_newick(&self) -> String {
        let Some(root) = self.root else {
            return String::new();
        };
        let mut out = String::new();
        self.append_newick(root, &mut out);
        out.push(';');
        out
    }

    fn append_newick(&self, index: SpeciesIndex, out: &mut String) {
        let node = &self.nodes[index];
        if !node.children.is_empty() {
            out.push('(');
            for (i, &child) in node.children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                self.append_newick(child, out);
            }
            out.push(')');
        }
        out.push_str(&node.label());
        if let Some(bl) = node.branch_length {
            out.push_str(&format!(":{}", bl));
        }
    }

    fn push(
        &mut self,
        name: Option<String>,
        parent: Option<SpeciesIndex>,
        branch_length: Option<f64>,
    ) -> SpeciesIndex {
        let index = self.nodes.len();
        if let Some(name) = &name {
            self.by_name.insert(name.clone(), index);
        }
        self.nodes.push(SpeciesNode {
            index,
            name,
            parent,
            children: Vec::new(),
            branch_length,
        });
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_and_lookup() {
        let mut species = SpeciesTree::new();
        let root = species.add_root(Some("S0".to_string()));
        let s1 = species.add_child(root, Some("S1".to_string()), Some(2.0));
        let unnamed = species.add_child(root, None, None);

        assert_eq!(species.parent_of(root), None);
        assert_eq!(species.parent_of(s1), Some(root));
        assert_eq!(species.parent_of(unnamed), Some(root));
        assert_eq!(species.parent_of(42), None);
        assert_eq!(species.children_of(root), &[s1, unnamed]);

        assert_eq!(species.node_by_name("S1").map(|n| n.index()), Some(s1));
        assert_eq!(species.node_by_name("2").map(|n| n.index()), Some(unnamed));
        assert_eq!(species.node_by_name("S7").map(|n| n.index()), None);
        assert_eq!(species.leaf_labels(), vec!["S1", "2"]);
        assert_eq!(species.to_newick(), "(S1:2,2)S0;");
    }
}
