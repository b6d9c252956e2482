//! recPhyloXML writing.

use std::io::{self, BufWriter, Write};

use crate::model::event::EventKind;
use crate::model::rec_tree::{NodeId, ReconciledTree};
use crate::model::species_tree::{SpeciesIndex, SpeciesTree};
use crate::recphyloxml::RecPhylo;
use crate::recphyloxml::defs::*;

/// Default number of spaces per indentation level
const DEFAULT_INDENT: usize = 2;

// =#========================================================================#=
// RECPHYLOXML WRITER
// =#========================================================================#=
/// Writes species trees and reconciled gene trees as recPhyloXML.
///
/// Consecutive events along a non-branching path of a gene tree are
/// compressed into one `clade` with several event lines. Loss children are
/// not written as clades of their own; instead the event of their parent
/// gets the suffix `Loss` (e.g. `speciationLoss`). Filler
/// [NoEvent](EventKind::NoEvent) nodes are never written.
///
/// Values are written as they are, without XML entities. An attribute value
/// containing `"` is single-quoted instead. Names containing `<`, and
/// attribute values containing both kinds of quotes, cannot be read back.
///
/// # Example
/// ```
/// use recphylo::recphyloxml::{RecPhyloXmlWriter, parse_str};
///
/// let input = r#"<recPhylo>
/// <recGeneTree>
/// <phylogeny rooted="true">
/// <clade>
/// <name>G1</name>
/// <eventsRec>
/// <leaf speciesLocation="S1"></leaf>
/// </eventsRec>
/// </clade>
/// </phylogeny>
/// </recGeneTree>
/// </recPhylo>"#;
/// let rec_phylo = parse_str(input)?;
///
/// let mut writer = RecPhyloXmlWriter::new(Vec::new()).with_indent(1);
/// writer.write_recphylo(&rec_phylo)?;
/// let xml = String::from_utf8(writer.into_inner()?)?;
/// assert!(xml.contains(r#"<leaf speciesLocation="S1" geneName="G1"></leaf>"#));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct RecPhyloXmlWriter<W: Write> {
    bw: BufWriter<W>,
    indent: usize,
    with_tree_indices: bool,
    level: usize,
}

// ============================================================================
// API
// ============================================================================
impl<W: Write> RecPhyloXmlWriter<W> {
    pub fn new(inner: W) -> Self {
        RecPhyloXmlWriter {
            bw: BufWriter::new(inner),
            indent: DEFAULT_INDENT,
            with_tree_indices: false,
            level: 0,
        }
    }

    /// Sets the number of spaces per indentation level (default 2).
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Writes an `<id>i</id>` line with the 0-based index of each gene tree.
    pub fn with_tree_indices(mut self) -> Self {
        self.with_tree_indices = true;
        self
    }

    /// Writes a complete document: header, the species tree (if any) and
    /// all gene trees.
    ///
    /// # Errors
    /// Returns an I/O error if writing fails.
    pub fn write_recphylo(&mut self, rec_phylo: &RecPhylo) -> io::Result<()> {
        self.header()?;
        if let Some(species_tree) = &rec_phylo.species_tree {
            self.write_species_tree(species_tree)?;
        }
        for (i, tree) in rec_phylo.gene_trees.iter().enumerate() {
            self.write_gene_tree(tree, Some(i))?;
        }
        self.footer()?;
        self.bw.flush()
    }

    /// Writes a `spTree` block; nothing for an empty species tree.
    pub fn write_species_tree(&mut self, species_tree: &SpeciesTree) -> io::Result<()> {
        let Some(root) = species_tree.root_index() else {
            return Ok(());
        };
        self.open(SP_TREE)?
            .open(PHYLOGENY)?
            .species_clade(species_tree, root)?
            .close(PHYLOGENY)?
            .close(SP_TREE)?;
        Ok(())
    }

    /// Writes a `recGeneTree` block.
    ///
    /// # Arguments
    /// * `tree` - The reconciled gene tree
    /// * `index` - Index written as `<id>` line if tree indices are enabled
    pub fn write_gene_tree(&mut self, tree: &ReconciledTree, index: Option<usize>) -> io::Result<()> {
        self.open(REC_GENE_TREE)?
            .indentation()?
            .write_str("<")?
            .write_str(PHYLOGENY)?
            .write_str(" rooted=\"true\">")?
            .newline()?;
        self.level += 1;

        if self.with_tree_indices
            && let Some(index) = index
        {
            self.element(ID, &index.to_string())?;
        }
        self.gene_clade(tree, tree.root_id())?
            .close(PHYLOGENY)?
            .close(REC_GENE_TREE)?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.bw.into_inner().map_err(|e| e.into_error())
    }
}

// ============================================================================
// Document Structure
// ============================================================================
impl<W: Write> RecPhyloXmlWriter<W> {
    fn header(&mut self) -> io::Result<&mut Self> {
        self.write_str(XML_DECLARATION)?
            .newline()?
            .write_str(REC_PHYLO_OPEN)?
            .newline()?;
        self.level = 1;
        Ok(self)
    }

    fn footer(&mut self) -> io::Result<&mut Self> {
        self.level = 1;
        self.close(REC_PHYLO)
    }

    /// Writes a species clade, collapsing chains of single-child nodes into
    /// one clade whose branch length is the sum along the chain.
    fn species_clade(&mut self, tree: &SpeciesTree, index: SpeciesIndex) -> io::Result<&mut Self> {
        let Some(top) = tree.node(index) else {
            return Ok(self);
        };

        let mut branch_length = top.branch_length().unwrap_or(0.0);
        let mut bottom = index;
        while let [only] = tree.children_of(bottom) {
            bottom = *only;
            branch_length += tree.node(bottom).and_then(|n| n.branch_length()).unwrap_or(0.0);
        }

        self.open(CLADE)?.element(NAME, &top.label())?;
        if branch_length != 0.0 {
            self.element(BRANCH_LENGTH, &branch_length.to_string())?;
        }
        for &child in tree.children_of(bottom) {
            self.species_clade(tree, child)?;
        }
        self.close(CLADE)
    }

    /// Writes the clade starting at `id` together with all nodes of its
    /// non-branching chain, then its child clades.
    fn gene_clade(&mut self, tree: &ReconciledTree, id: NodeId) -> io::Result<&mut Self> {
        // ==== Fillers never start a clade
        let mut top = id;
        while tree[top].has_event(EventKind::NoEvent)
            && let Some(&child) = tree[top].children().first()
        {
            top = child;
        }

        self.open(CLADE)?.element(NAME, &tree[top].display_name())?;

        // ==== Event chain
        self.open(EVENTS_REC)?;
        let mut current = top;
        let live_children = loop {
            let node = &tree[current];
            let (losses, live): (Vec<NodeId>, Vec<NodeId>) = node
                .children()
                .iter()
                .partition(|&&c| tree[c].has_event(EventKind::Loss));
            if !node.has_event(EventKind::NoEvent) {
                self.event_line(tree, current, !losses.is_empty())?;
            }
            match live.as_slice() {
                [only] => current = *only,
                _ => break live,
            }
        };
        self.close(EVENTS_REC)?;

        // ==== Child clades
        for child in live_children {
            self.gene_clade(tree, child)?;
        }
        self.close(CLADE)
    }

    /// Writes one event line, e.g.
    /// `<speciation speciesLocation="S0" timeSlice="3"></speciation>`.
    fn event_line(&mut self, tree: &ReconciledTree, id: NodeId, with_loss: bool) -> io::Result<&mut Self> {
        let node = &tree[id];
        let Some(event) = node.event() else {
            return Ok(self);
        };
        let Some(tag_name) = event.tag_name() else {
            return Ok(self);
        };
        let tag_name = if with_loss {
            format!("{}{}", tag_name, LOSS_SUFFIX)
        } else {
            tag_name.to_string()
        };

        self.indentation()?.write_str("<")?.write_str(&tag_name)?;

        if event != EventKind::BifurcationOut
            && let Some(species) = node.species()
        {
            let key = match event {
                EventKind::Reception => DESTINATION_SPECIES,
                _ => SPECIES_LOCATION,
            };
            self.attribute(key, species)?;
        }
        if event == EventKind::Extant
            && let Some(name) = node.name()
        {
            self.attribute(GENE_NAME, name)?;
        }
        if event != EventKind::Extant
            && let Ok(Some(ts)) = tree.time_slice(id)
        {
            self.attribute(TIME_SLICE, &ts.to_string())?;
        }

        self.write_str("></")?
            .write_str(&tag_name)?
            .write_str(">")?
            .newline()
    }
}

// ============================================================================
// Little Helpers
// ============================================================================
impl<W: Write> RecPhyloXmlWriter<W> {
    fn write_str(&mut self, s: &str) -> io::Result<&mut Self> {
        self.bw.write_all(s.as_bytes())?;
        Ok(self)
    }

    fn newline(&mut self) -> io::Result<&mut Self> {
        self.bw.write_all(b"\n")?;
        Ok(self)
    }

    fn indentation(&mut self) -> io::Result<&mut Self> {
        let width = self.level * self.indent;
        write!(self.bw, "{:width$}", "")?;
        Ok(self)
    }

    /// `<name>` on its own line, one level deeper afterwards
    fn open(&mut self, name: &str) -> io::Result<&mut Self> {
        self.indentation()?.write_str("<")?.write_str(name)?.write_str(">")?.newline()?;
        self.level += 1;
        Ok(self)
    }

    /// `</name>` on its own line, one level up
    fn close(&mut self, name: &str) -> io::Result<&mut Self> {
        self.level = self.level.saturating_sub(1);
        self.indentation()?.write_str("</")?.write_str(name)?.write_str(">")?.newline()
    }

    /// `<name>value</name>` on one line
    fn element(&mut self, name: &str, value: &str) -> io::Result<&mut Self> {
        self.indentation()?
            .write_str("<")?
            .write_str(name)?
            .write_str(">")?
            .write_str(value)?
            .write_str("</")?
            .write_str(name)?
            .write_str(">")?
            .newline()
    }

    /// ` key="value"`, or single-quoted if the value contains `"`
    fn attribute(&mut self, key: &str, value: &str) -> io::Result<&mut Self> {
        let quote = if value.contains('"') { "'" } else { "\"" };
        self.write_str(" ")?
            .write_str(key)?
            .write_str("=")?
            .write_str(quote)?
            .write_str(value)?
            .write_str(quote)
    }
}
