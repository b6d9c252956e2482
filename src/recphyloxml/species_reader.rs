//! Reading the `spTree` block into a [SpeciesTree].

use log::{debug, info};

use crate::model::species_tree::{SpeciesIndex, SpeciesTree};
use crate::parser::line_source::LineSource;
use crate::parser::parsing_error::{ParsingError, ParsingErrorType};
use crate::parser::tag_reader::TagReader;
use crate::recphyloxml::defs::{BRANCH_LENGTH, CLADE, NAME};

/// Reads a species tree from a reader positioned right after the root
/// `<clade>` line.
///
/// Nodes without a `name` are labelled by their index. Consumes input up to
/// and including the root's `</clade>` line.
///
/// # Errors
/// * `UnexpectedEOF` if input ends inside a clade
/// * `MalformedTag` if a branch length is not a number
pub fn read_species_tree<S: LineSource>(
    reader: &mut TagReader<S>,
) -> Result<SpeciesTree, ParsingError> {
    let mut tree = SpeciesTree::new();
    let root = tree.add_root(None);
    read_species_clade(reader, &mut tree, root)?;

    info!("Read species tree with {} nodes", tree.num_nodes());
    Ok(tree)
}

/// Recursively reads one clade into `node`.
fn read_species_clade<S: LineSource>(
    reader: &mut TagReader<S>,
    tree: &mut SpeciesTree,
    node: SpeciesIndex,
) -> Result<(), ParsingError> {
    debug!("Parsing species node {}", node);

    let mut name: Option<String> = None;
    let mut in_name = false;

    loop {
        let tag = reader.expect_tag()?;

        if tag.is_text() {
            if in_name && !tag.value.is_empty() {
                append_text(&mut name, &tag.value);
            }
            continue;
        }
        in_name = false;

        if tag.is_closing(CLADE) {
            break;
        } else if tag.is_opening(NAME) {
            name = Some(tag.value);
            in_name = true;
        } else if tag.is_opening(BRANCH_LENGTH) {
            let length: f64 = tag.value.parse().map_err(|_| {
                ParsingError::from_reader(
                    ParsingErrorType::MalformedTag(format!(
                        "branch length \"{}\" is not a number",
                        tag.value
                    )),
                    reader,
                )
            })?;
            tree.set_branch_length(node, length);
        } else if tag.is_opening(CLADE) {
            let child = tree.add_child(node, None, None);
            read_species_clade(reader, tree, child)?;
        }
    }

    if let Some(name) = name.filter(|n| !n.is_empty()) {
        tree.set_name(node, name);
    }
    Ok(())
}

/// Appends a continuation line to a pending name.
pub(crate) fn append_text(pending: &mut Option<String>, text: &str) {
    match pending {
        Some(name) if !name.is_empty() => {
            name.push(' ');
            name.push_str(text);
        }
        _ => *pending = Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_clades_and_lengths() {
        let input = "\
      <name>S0</name>
      <clade>
        <name>S1</name>
        <branch_length>1.5</branch_length>
      </clade>
      <clade>
        <branch_length>2</branch_length>
      </clade>
    </clade>
    <clade>";
        let mut reader = TagReader::from_string(input);
        let tree = read_species_tree(&mut reader).unwrap();

        assert_eq!(tree.num_nodes(), 3);
        assert_eq!(tree.root().unwrap().label(), "S0");
        let s1 = tree.node_by_name("S1").unwrap();
        assert_eq!(s1.branch_length(), Some(1.5));
        // Unnamed node is found by its index
        let unnamed = tree.node_by_name("2").unwrap();
        assert_eq!(unnamed.branch_length(), Some(2.0));
        assert_eq!(reader.line_number(), 9);
    }

    #[test]
    fn test_bad_branch_length() {
        let mut reader = TagReader::from_string("<branch_length>abc</branch_length>\n</clade>");
        let err = read_species_tree(&mut reader).unwrap_err();
        assert!(matches!(err.kind(), ParsingErrorType::MalformedTag(_)));
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_eof_inside_clade() {
        let mut reader = TagReader::from_string("<name>S0</name>\n<clade>\n</clade>");
        let err = read_species_tree(&mut reader).unwrap_err();
        assert_eq!(err.kind(), &ParsingErrorType::UnexpectedEOF);
    }
}
