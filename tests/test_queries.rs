//! Query layer: ancestry, compatibility, cloning and lookups.
//!
//! Property tests run over all node pairs of the fixture trees.

use proptest::prelude::*;
use recphylo::model::{EventKind, ReconciledTree, TreeError};
use recphylo::recphyloxml::parse_file;
use std::path::Path;

fn fixture_tree() -> ReconciledTree {
    let path = Path::new("tests").join("fixtures").join("sliced_transfers.xml");
    parse_file(path).unwrap().gene_trees.remove(0)
}

fn subdivided_fixture_tree() -> ReconciledTree {
    let mut tree = fixture_tree();
    tree.subdivide().unwrap();
    tree
}

// ============================================================================
// Properties
// ============================================================================
proptest! {
    #[test]
    fn prop_compatibility_is_symmetric(x in 0usize..15, y in 0usize..15) {
        let tree = fixture_tree();
        prop_assert_eq!(tree.are_compatible(x, y).ok(), tree.are_compatible(y, x).ok());
        prop_assert_eq!(tree.have_same_species(x, y), tree.have_same_species(y, x));
    }

    #[test]
    fn prop_compatibility_symmetric_when_subdivided(x in 0usize..17, y in 0usize..17) {
        let tree = subdivided_fixture_tree();
        let xy = tree.are_compatible(x, y).unwrap();
        prop_assert_eq!(xy, tree.are_compatible(y, x).unwrap());
        if x == y {
            prop_assert!(xy);
        }
    }

    #[test]
    fn prop_ancestry_is_antisymmetric(a in 0usize..17, b in 0usize..17) {
        let tree = subdivided_fixture_tree();
        let a_over_b = tree.is_ancestor(a, b).unwrap();
        let b_over_a = tree.is_ancestor(b, a).unwrap();
        prop_assert!(!(a_over_b && b_over_a));
        if a == b {
            prop_assert!(!a_over_b);
        }
        if a == tree.root_id() && b != a {
            prop_assert!(a_over_b);
        }
    }

    #[test]
    fn prop_path_ends_at_descendant(a in 0usize..15, b in 0usize..15) {
        let tree = fixture_tree();
        let path = tree.path_from_ancestor_to_descendant(a, b).unwrap();
        prop_assert_eq!(path.last(), Some(&b));
        if tree.is_ancestor(a, b).unwrap() || a == b {
            prop_assert_eq!(path.first(), Some(&a));
        } else {
            prop_assert_eq!(path.first(), Some(&tree.root_id()));
        }
        for pair in path.windows(2) {
            prop_assert_eq!(tree.parent_of(pair[1]).unwrap(), Some(pair[0]));
        }
    }
}

// ============================================================================
// Examples
// ============================================================================
#[test]
fn test_path_from_ancestor() {
    let tree = fixture_tree();
    let a1 = tree.node_id_by_name("a1").unwrap();
    let path = tree.path_from_ancestor_to_descendant(tree.root_id(), a1).unwrap();
    assert_eq!(path, vec![0, 1, a1]);

    // Not an ancestor: path starts at the root
    let c1 = tree.node_id_by_name("c1").unwrap();
    let path = tree.path_from_ancestor_to_descendant(a1, c1).unwrap();
    assert_eq!(path.first(), Some(&tree.root_id()));
}

#[test]
fn test_time_compatibility() {
    let tree = fixture_tree();
    let a1 = tree.node_id_by_name("a1").unwrap();
    let spe_x = tree.node_id_by_name("spe_x").unwrap();
    let dup_x = tree.node_id_by_name("dup_x").unwrap();
    assert!(tree.are_compatible(a1, spe_x).unwrap());
    assert!(tree.have_same_species(a1, dup_x).unwrap());
    assert!(!tree.are_compatible(a1, dup_x).unwrap());

    // Speciation loss has no time slice in a sliced tree
    let loss = tree.children_of(a1).unwrap()[1];
    assert_eq!(
        tree.are_time_compatible(a1, loss),
        Err(TreeError::MissingProperty {
            node: loss,
            property: "time slice"
        })
    );
}

#[test]
fn test_missing_species() {
    let mut tree = ReconciledTree::new();
    let root = tree.root_id();
    tree[root].set_event(EventKind::Duplication);
    tree[root].set_species("S1");
    let child = tree.add_child(root).unwrap();
    tree[child].set_event(EventKind::Extant);

    assert_eq!(
        tree.have_same_species(root, child),
        Err(TreeError::MissingProperty {
            node: child,
            property: "species"
        })
    );
    assert_eq!(tree.have_same_species(root, 42), Err(TreeError::UnknownNode(42)));
}

#[test]
fn test_clone_subtree() {
    let tree = fixture_tree();
    let out_y = tree.node_id_by_name("out_y").unwrap();
    let clone = tree.clone_subtree(out_y).unwrap();

    assert_eq!(clone.num_nodes(), 7);
    assert!(clone.is_sliced());
    assert!(clone.is_valid());
    assert_eq!(clone.root().name(), Some("out_y"));
    assert_eq!(clone.root().event(), Some(EventKind::SpeciationOut));
    assert_eq!(clone.real_leaf_names(), vec!["c1", "d1"]);
    assert_eq!(clone.count_transfers(), 2);
    assert_eq!(clone.count_losses(), 1);
    // Renumbered in pre-order
    assert_eq!(clone.node_ids(), (0..7).collect::<Vec<_>>());

    let original_subtree = tree.clone_subtree(out_y).unwrap();
    assert!(clone.same_reconciliation(&original_subtree));
}

#[test]
fn test_name_lookup() {
    let tree = fixture_tree();
    assert_eq!(tree.node_id_by_name("fam1").unwrap(), tree.root_id());
    assert_eq!(
        tree.node_id_by_name("zz"),
        Err(TreeError::NameNotFound("zz".to_string()))
    );
}

#[test]
fn test_describe_node() {
    let tree = fixture_tree();
    let c1 = tree.node_id_by_name("c1").unwrap();
    let description = tree.describe_node(c1).unwrap();
    assert!(description.contains("\"c1\""));
    assert!(description.contains("Reception"));
    assert!(tree.describe_node(99).is_err());
}
