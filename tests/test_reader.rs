use recphylo::model::{EMPTY_CLADE, EventKind, TimeSliceStatus};
use recphylo::parser::{ParsingErrorType, TagReader};
use recphylo::recphyloxml::{CladeBuilder, RecPhyloXmlParser, parse_file, parse_str};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new("tests").join("fixtures").join(name)
}

// --- SCENARIOS ---
#[test]
fn test_single_leaf() {
    let rec_phylo = parse_file(fixture("single_leaf.xml")).unwrap();
    assert!(rec_phylo.species_tree.is_none());
    assert_eq!(rec_phylo.num_gene_trees(), 1);

    let tree = &rec_phylo.gene_trees[0];
    assert_eq!(tree.num_nodes(), 1);
    assert_eq!(tree.time_slice_status(), TimeSliceStatus::Unsliced);

    let root = tree.root();
    assert_eq!(root.name(), Some("G1"));
    assert_eq!(root.event(), Some(EventKind::Extant));
    assert_eq!(root.species(), Some("S1"));
    // Leaves carry slice 0, but an unsliced tree does not expose it
    assert_eq!(tree.time_slice(root.id()).unwrap(), None);
    assert!(tree.is_valid());
}

#[test]
fn test_speciation_with_two_leaves() {
    let rec_phylo = parse_file(fixture("speciation.xml")).unwrap();
    let tree = &rec_phylo.gene_trees[0];

    assert_eq!(tree.num_nodes(), 3);
    assert_eq!(tree.num_leaves(), 2);
    assert_eq!(tree.count_duplications(), 0);
    assert_eq!(tree.count_losses(), 0);

    let root = tree.root_id();
    for leaf in tree.leaves() {
        assert!(tree.is_ancestor(root, leaf.id()).unwrap());
    }
    assert_eq!(tree.real_leaf_names(), vec!["g1", "g2"]);
    assert_eq!(tree.num_clades(), 3);
    assert!(tree.is_valid());
}

#[test]
fn test_speciation_loss_resolved_against_species_tree() {
    let rec_phylo = parse_file(fixture("speciation_loss.xml")).unwrap();
    let species = rec_phylo.species_tree.as_ref().unwrap();
    assert_eq!(species.leaf_labels(), vec!["S1", "S2"]);

    let tree = &rec_phylo.gene_trees[0];
    assert_eq!(tree.num_nodes(), 3);
    let root = tree.root();
    assert_eq!(root.event(), Some(EventKind::Speciation));
    assert_eq!(root.children().len(), 2);

    let loss = &tree[root.children()[1]];
    assert_eq!(loss.event(), Some(EventKind::Loss));
    assert_eq!(loss.species(), Some("S2"));
    assert_eq!(loss.clade_id(), Some(EMPTY_CLADE));
    assert_eq!(tree.node_ids_by_clade(EMPTY_CLADE), &[loss.id()]);
    assert!(tree.is_valid());
}

// --- LARGER FILE ---
#[test]
fn test_sliced_file_with_transfers() {
    let rec_phylo = parse_file(fixture("sliced_transfers.xml")).unwrap();
    let species = rec_phylo.species_tree.as_ref().unwrap();
    assert_eq!(species.num_nodes(), 7);
    assert_eq!(species.node_by_name("y").unwrap().branch_length(), Some(0.5));
    assert_eq!(rec_phylo.num_gene_trees(), 2);

    let tree = &rec_phylo.gene_trees[0];
    assert!(tree.is_sliced());
    assert!(tree.is_valid());
    assert_eq!(tree.num_nodes(), 15);
    assert_eq!(tree.count_duplications(), 1);
    assert_eq!(tree.count_losses(), 2);
    assert_eq!(tree.count_transfers(), 2);
    assert_eq!(tree.count_event(EventKind::BifurcationOut), 1);
    assert_eq!(tree.real_leaf_names(), vec!["a1", "a2", "b1", "c1", "d1"]);
    assert_eq!(tree.num_clades(), 11);

    // speciationLoss in x with survivor in a: lost in b
    let a1_top = tree.node_id_by_name("a1").unwrap();
    assert_eq!(tree[a1_top].event(), Some(EventKind::Speciation));
    let loss = tree[a1_top].children()[1];
    assert_eq!(tree[loss].species(), Some("b"));
    assert_eq!(tree.time_slice(loss).unwrap(), None);

    // speciationOutLoss keeps species and time slice, loss after the out child
    let out_y = tree.node_id_by_name("out_y").unwrap();
    let children = tree.children_of(out_y).unwrap();
    assert_eq!(tree[children[0]].event(), Some(EventKind::BifurcationOut));
    assert_eq!(tree[children[0]].species(), Some("-1"));
    assert_eq!(tree[children[1]].event(), Some(EventKind::Loss));
    assert_eq!(tree[children[1]].species(), Some("y"));
    assert_eq!(tree.time_slice(children[1]).unwrap(), Some(3));

    // Reception takes the destination species
    let c1 = tree.node_id_by_name("c1").unwrap();
    assert_eq!(tree[c1].event(), Some(EventKind::Reception));
    assert_eq!(tree[c1].species(), Some("c"));
    assert_eq!(tree.time_slice(c1).unwrap(), Some(1));

    let second = &rec_phylo.gene_trees[1];
    assert_eq!(second.num_nodes(), 7);
    let b2_top = second.node_id_by_name("b2").unwrap();
    let loss = second[b2_top].children()[1];
    assert_eq!(second[loss].species(), Some("a"));
}

#[test]
fn test_event_summary_of_file() {
    let rec_phylo = parse_file(fixture("sliced_transfers.xml")).unwrap();
    let mut summary = rec_phylo.gene_trees[0].event_summary_by_species();
    assert_eq!(summary.count("x", EventKind::Speciation), 2);
    assert_eq!(summary.count("x", EventKind::Duplication), 1);
    assert_eq!(summary.count("b", EventKind::Loss), 1);
    assert_eq!(summary.count("-1", EventKind::BifurcationOut), 1);
    assert_eq!(summary.total("c"), 2);

    summary.merge(&rec_phylo.gene_trees[1].event_summary_by_species());
    assert_eq!(summary.count("r", EventKind::Speciation), 2);
    assert_eq!(summary.count("a", EventKind::Loss), 1);
    assert_eq!(
        summary.species().collect::<Vec<_>>(),
        vec!["-1", "a", "b", "c", "d", "r", "x", "y"]
    );
    assert!(summary.to_string().starts_with("species"));
}

#[test]
fn test_buffered_and_in_memory_agree() {
    let path = fixture("sliced_transfers.xml");
    let in_memory = parse_file(&path).unwrap();
    let buffered = RecPhyloXmlParser::new().parse_file_buffered(&path).unwrap();
    let from_reader = RecPhyloXmlParser::new()
        .parse_reader(BufReader::new(File::open(&path).unwrap()))
        .unwrap();

    for other in [&buffered, &from_reader] {
        assert_eq!(other.num_gene_trees(), in_memory.num_gene_trees());
        for (a, b) in in_memory.gene_trees.iter().zip(&other.gene_trees) {
            assert!(a.same_reconciliation(b));
        }
    }
}

#[test]
fn test_build_single_tree() {
    let input = "\
    <name>G</name>
    <eventsRec>
      <duplication speciesLocation=\"S1\"></duplication>
    </eventsRec>
    <clade>
      <eventsRec>
        <leaf speciesLocation=\"S1\" geneName=\"g1\"></leaf>
      </eventsRec>
    </clade>
    <clade>
      <eventsRec>
        <leaf speciesLocation=\"S1\" geneName=\"g2\"></leaf>
      </eventsRec>
    </clade>
  </clade>
</phylogeny>";
    let mut reader = TagReader::from_string(input);
    let tree = CladeBuilder::build_tree(&mut reader, None).unwrap();
    assert_eq!(tree.num_nodes(), 3);
    assert_eq!(tree.count_duplications(), 1);
    assert_eq!(tree.real_leaf_names(), vec!["g1", "g2"]);
    // Reader stopped right after the root clade
    assert_eq!(reader.line_number(), 15);
}

// --- ERRORS ---
#[test]
fn test_unknown_event_reports_line() {
    let input = r#"<recPhylo>
<recGeneTree>
<phylogeny>
<clade>
<name>G1</name>
<eventsRec>
<gain speciesLocation="S1"></gain>
</eventsRec>
</clade>
</phylogeny>
</recGeneTree>
</recPhylo>"#;
    let err = parse_str(input).unwrap_err();
    assert_eq!(err.kind(), &ParsingErrorType::UnknownEvent("gain".to_string()));
    assert_eq!(err.line(), 7);
    assert!(err.to_string().contains("line 7"));
}

#[test]
fn test_empty_event_list() {
    let input = "<recGeneTree>\n<clade>\n<name>G1</name>\n<eventsRec>\n</eventsRec>\n</clade>\n</recGeneTree>";
    let err = parse_str(input).unwrap_err();
    assert_eq!(err.kind(), &ParsingErrorType::EmptyEventList);
}

#[test]
fn test_truncated_input() {
    let input = "<recGeneTree>\n<clade>\n<name>G1</name>\n<eventsRec>\n<leaf speciesLocation=\"S1\"></leaf>\n";
    let err = parse_str(input).unwrap_err();
    assert_eq!(err.kind(), &ParsingErrorType::UnexpectedEOF);
}

#[test]
fn test_malformed_attribute() {
    let input = "<recGeneTree>\n<clade>\n<eventsRec>\n<leaf speciesLocation=\"S1></leaf>\n</eventsRec>\n</clade>\n</recGeneTree>";
    let err = parse_str(input).unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorType::MalformedTag(_)));
    assert_eq!(err.line(), 4);
}

#[test]
fn test_missing_file() {
    let err = parse_file(fixture("does_not_exist.xml")).unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorType::IoError(_)));
}

#[test]
fn test_species_tree_must_bifurcate() {
    let input = r#"<recPhylo>
<spTree>
<phylogeny>
<clade>
<name>S0</name>
<clade>
<name>S1</name>
</clade>
</clade>
</phylogeny>
</spTree>
<recGeneTree>
<phylogeny>
<clade>
<eventsRec>
<speciationLoss speciesLocation="S0"></speciationLoss>
<leaf speciesLocation="S1"></leaf>
</eventsRec>
</clade>
</phylogeny>
</recGeneTree>
</recPhylo>"#;
    let err = parse_str(input).unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorType::MalformedSpeciesTree(_)));
}
