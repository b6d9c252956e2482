//! Building reconciled gene trees from `recGeneTree` blocks.
//!
//! Construction runs in two phases:
//! 1. [read_clade] descends through the nested `clade` elements and produces
//!    an immutable [CladeDescription] tree, one description per clade, each
//!    holding its compressed list of [EventLine]s.
//! 2. [CladeBuilder] expands every description into a chain of tree nodes
//!    (one node per event), building each node exactly once, and records
//!    speciations whose lost sibling still has to be added.
//!
//! Those pending losses are resolved by [resolve_losses] against a species
//! tree, which may only be known once the whole file has been read.

use log::{debug, warn};

use crate::model::event::EventKind;
use crate::model::rec_tree::{CladeId, DEAD_LINEAGE, EMPTY_CLADE, NodeId, ReconciledTree, TimeSliceStatus};
use crate::model::species_tree::SpeciesTree;
use crate::model::tree_error::TreeError;
use crate::parser::line_source::LineSource;
use crate::parser::parsing_error::{ParsingError, ParsingErrorType};
use crate::parser::tag_reader::{Tag, TagReader};
use crate::recphyloxml::defs::*;
use crate::recphyloxml::species_reader::append_text;

// =#========================================================================#=
// EVENT LINE
// =#========================================================================$=
/// Event tags of an `eventsRec` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTag {
    Leaf,
    Speciation,
    SpeciationOut,
    BifurcationOut,
    Duplication,
    TransferBack,
    SpeciationOutLoss,
    SpeciationLoss,
}

impl EventTag {
    /// Maps a tag name to its event tag, `None` if unknown.
    pub fn from_name(name: &str) -> Option<EventTag> {
        match name {
            "leaf" => Some(EventTag::Leaf),
            "speciation" => Some(EventTag::Speciation),
            "speciationOut" => Some(EventTag::SpeciationOut),
            "bifurcationOut" => Some(EventTag::BifurcationOut),
            "duplication" => Some(EventTag::Duplication),
            "transferBack" => Some(EventTag::TransferBack),
            SPECIATION_OUT_LOSS => Some(EventTag::SpeciationOutLoss),
            SPECIATION_LOSS => Some(EventTag::SpeciationLoss),
            _ => None,
        }
    }

    /// The event a node built from this tag carries.
    pub fn event_kind(&self) -> EventKind {
        match self {
            EventTag::Leaf => EventKind::Extant,
            EventTag::Speciation | EventTag::SpeciationLoss => EventKind::Speciation,
            EventTag::SpeciationOut | EventTag::SpeciationOutLoss => EventKind::SpeciationOut,
            EventTag::BifurcationOut => EventKind::BifurcationOut,
            EventTag::Duplication => EventKind::Duplication,
            EventTag::TransferBack => EventKind::Reception,
        }
    }
}

/// One event line of an `eventsRec` block, attributes already interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct EventLine {
    pub tag: EventTag,
    pub species: Option<String>,
    pub time_slice: Option<u32>,
    pub gene_name: Option<String>,
}

impl EventLine {
    /// Interprets an event tag.
    ///
    /// The species of a `transferBack` is its `destinationSpecies`, that of
    /// every other event its `speciesLocation`; each falls back to the other
    /// attribute. A `bifurcationOut` always lives in the dead lineage, and a
    /// `leaf` always has time slice 0.
    ///
    /// # Errors
    /// * `UnknownEvent` for an unrecognized tag name
    /// * `MalformedTag` for a `timeSlice` that is not a non-negative integer
    pub fn from_tag<S: LineSource>(
        tag: &Tag,
        reader: &TagReader<S>,
    ) -> Result<EventLine, ParsingError> {
        let Some(event_tag) = EventTag::from_name(&tag.name) else {
            return Err(ParsingError::unknown_event(reader, &tag.name));
        };

        let location = tag.attribute(SPECIES_LOCATION);
        let destination = tag.attribute(DESTINATION_SPECIES);
        let species = match event_tag {
            EventTag::BifurcationOut => Some(DEAD_LINEAGE),
            EventTag::TransferBack => destination.or(location),
            _ => location.or(destination),
        };

        let time_slice = match (event_tag, tag.attribute(TIME_SLICE)) {
            (EventTag::Leaf, _) => Some(0),
            (_, Some(value)) => Some(value.trim().parse::<u32>().map_err(|_| {
                ParsingError::from_reader(
                    ParsingErrorType::MalformedTag(format!(
                        "time slice \"{}\" is not a non-negative integer",
                        value
                    )),
                    reader,
                )
            })?),
            (_, None) => None,
        };

        Ok(EventLine {
            tag: event_tag,
            species: species.map(str::to_string),
            time_slice,
            gene_name: tag.attribute(GENE_NAME).map(str::to_string),
        })
    }
}

// =#========================================================================#=
// CLADE DESCRIPTION (phase 1)
// =#========================================================================$=
/// A clade as read from the file, before expansion into tree nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CladeDescription {
    pub name: Option<String>,
    pub events: Vec<EventLine>,
    pub children: Vec<CladeDescription>,
}

/// Reads one clade from a reader positioned right after its `<clade>` line.
///
/// Consumes input up to and including the matching `</clade>` line.
///
/// # Errors
/// * `UnexpectedEOF` if input ends inside the clade
/// * `EmptyEventList` if the clade has no events
/// * `UnknownEvent` / `MalformedTag` for a broken event line
pub fn read_clade<S: LineSource>(
    reader: &mut TagReader<S>,
) -> Result<CladeDescription, ParsingError> {
    let mut clade = CladeDescription::default();
    let mut in_name = false;

    loop {
        let tag = reader.expect_tag()?;

        if tag.is_text() {
            if in_name && !tag.value.is_empty() {
                append_text(&mut clade.name, &tag.value);
            }
            continue;
        }
        in_name = false;

        if tag.is_closing(CLADE) {
            break;
        } else if tag.is_opening(NAME) {
            clade.name = Some(tag.value);
            in_name = true;
        } else if tag.is_opening(EVENTS_REC) {
            clade.events = read_events(reader)?;
        } else if tag.is_opening(CLADE) {
            clade.children.push(read_clade(reader)?);
        }
    }

    if clade.events.is_empty() {
        return Err(ParsingError::empty_event_list(reader));
    }
    clade.name = clade.name.filter(|n| !n.is_empty());

    debug!(
        "Parsed clade {:?} with {} events and {} children",
        clade.name,
        clade.events.len(),
        clade.children.len()
    );
    Ok(clade)
}

/// Reads event lines up to and including `</eventsRec>`.
fn read_events<S: LineSource>(reader: &mut TagReader<S>) -> Result<Vec<EventLine>, ParsingError> {
    let mut events = Vec::new();
    loop {
        let tag = reader.expect_tag()?;
        if tag.is_closing(EVENTS_REC) {
            break;
        }
        // End tags of multi-line events and stray text carry nothing
        if tag.is_text() || tag.closing {
            continue;
        }
        events.push(EventLine::from_tag(&tag, reader)?);
    }

    if events.is_empty() {
        return Err(ParsingError::empty_event_list(reader));
    }
    Ok(events)
}

// =#========================================================================#=
// CLADE BUILDER (phase 2)
// =#========================================================================$=
/// A freshly built tree together with the speciations still missing their
/// lost sibling.
#[derive(Debug, Clone)]
pub struct BuiltTree {
    pub tree: ReconciledTree,
    pub pending_losses: Vec<NodeId>,
}

/// Expands [CladeDescription]s into a [ReconciledTree].
///
/// The events of a clade become a chain of nodes: the first event is the
/// topmost node (attached to the parent clade, or the root), the last one is
/// the node carrying the nested clades. All nodes of a chain share the
/// clade's id; clade ids are handed out in pre-order starting with 0 at the
/// root clade.
///
/// # Example
/// ```
/// use recphylo::parser::TagReader;
/// use recphylo::recphyloxml::CladeBuilder;
///
/// let input = "\
/// <name>G1</name>
/// <eventsRec>
///   <leaf speciesLocation=\"S1\"></leaf>
/// </eventsRec>
/// </clade>";
/// let mut reader = TagReader::from_string(input);
/// let tree = CladeBuilder::build_tree(&mut reader, None)?;
/// assert_eq!(tree.num_nodes(), 1);
/// assert_eq!(tree.root().name(), Some("G1"));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct CladeBuilder {
    tree: ReconciledTree,
    next_clade: CladeId,
    pending_losses: Vec<NodeId>,
}

impl Default for CladeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CladeBuilder {
    pub fn new() -> Self {
        CladeBuilder {
            tree: ReconciledTree::new(),
            next_clade: 0,
            pending_losses: Vec::new(),
        }
    }

    /// Reads and builds one tree from a reader positioned right after the
    /// root `<clade>` line, resolving its losses right away.
    ///
    /// # Arguments
    /// * `reader` - Reader positioned after the root `<clade>` line
    /// * `species` - Species tree for loss resolution, if any
    ///
    /// # Errors
    /// Any error of [read_clade], [CladeBuilder::build] or [resolve_losses].
    pub fn build_tree<S: LineSource>(
        reader: &mut TagReader<S>,
        species: Option<&SpeciesTree>,
    ) -> Result<ReconciledTree, ParsingError> {
        let description = read_clade(reader)?;
        let BuiltTree {
            mut tree,
            pending_losses,
        } = CladeBuilder::new().build(&description)?;
        resolve_losses(&mut tree, &pending_losses, species)?;
        Ok(tree)
    }

    /// Builds the tree described by the root clade `root`.
    ///
    /// Losses implied by `speciationOutLoss` are added immediately; those of
    /// `speciationLoss` are reported as pending. The time-slice status is
    /// [Sliced](TimeSliceStatus::Sliced) iff the root carries a time slice
    /// and is not a leaf.
    pub fn build(mut self, root: &CladeDescription) -> Result<BuiltTree, ParsingError> {
        self.build_clade(root, None).map_err(tree_to_parsing_error)?;

        // The forced slice 0 of a lone leaf does not make a tree sliced
        let root = self.tree.root();
        if root.stored_time_slice().is_some() && !root.has_event(EventKind::Extant) {
            self.tree.set_time_slice_status(TimeSliceStatus::Sliced);
        }

        Ok(BuiltTree {
            tree: self.tree,
            pending_losses: self.pending_losses,
        })
    }

    /// Builds a clade below `parent` (or as root), returning its top node.
    fn build_clade(
        &mut self,
        clade: &CladeDescription,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        let clade_id = self.next_clade;
        self.next_clade += 1;

        let mut attach = parent;
        let mut chain = Vec::with_capacity(clade.events.len());
        for (i, event) in clade.events.iter().enumerate() {
            let id = match attach {
                Some(p) => self.tree.add_child(p)?,
                None => self.tree.root_id(),
            };
            self.tree.set_clade_id(id, clade_id)?;
            if i == 0
                && let Some(name) = &clade.name
            {
                self.tree[id].set_name(name.as_str());
            }
            self.apply_event(id, event);
            chain.push((id, event.tag));
            attach = Some(id);
        }
        let (Some(&(top, _)), Some(&(bottom, _))) = (chain.first(), chain.last()) else {
            return Err(TreeError::InvalidStructure(
                "clade without events".to_string(),
            ));
        };

        for child in &clade.children {
            self.build_clade(child, Some(bottom))?;
        }

        // Losses go after every other child of their node
        for &(id, tag) in &chain {
            if tag == EventTag::SpeciationOutLoss {
                let node = &self.tree[id];
                let species = node.species().map(str::to_string);
                let ts = node.stored_time_slice();
                add_loss(&mut self.tree, id, species, ts)?;
            }
        }

        Ok(top)
    }

    /// Sets event, species, time slice and gene name of a chain node.
    fn apply_event(&mut self, id: NodeId, event: &EventLine) {
        let node = &mut self.tree[id];
        node.set_event(event.tag.event_kind());
        if let Some(species) = &event.species {
            node.set_species(species.as_str());
        }
        if let Some(ts) = event.time_slice {
            node.set_time_slice(ts);
        }
        if let Some(gene_name) = &event.gene_name {
            node.set_name(gene_name.as_str());
        }

        if event.tag == EventTag::SpeciationLoss {
            self.pending_losses.push(id);
        }
    }
}

// =#========================================================================#=
// LOSS RESOLUTION
// =#========================================================================$=
/// Adds the lost sibling of every speciation left with a single child.
///
/// Covers the `pending` speciations recorded while building as well as any
/// other speciation node with exactly one child. The lost species is the
/// child of the speciation's species (in `species`) that the surviving child
/// does not map to. Without a species tree, the species of the loss stays
/// unknown. Loss nodes get the empty clade id.
///
/// # Errors
/// * `SpeciesNotFound` if a speciation's species is not in the species tree
/// * `MalformedSpeciesTree` if that species does not have exactly two children,
///   or the surviving child lives in neither of them
/// * `InvalidTreeStructure` if a speciation node has no children at all
pub fn resolve_losses(
    tree: &mut ReconciledTree,
    pending: &[NodeId],
    species: Option<&SpeciesTree>,
) -> Result<(), ParsingError> {
    let mut targets: Vec<NodeId> = pending.to_vec();
    for node in tree.pre_order_iter() {
        if !node.has_event(EventKind::Speciation) {
            continue;
        }
        match node.children().len() {
            0 => {
                return Err(ParsingError::without_context(
                    ParsingErrorType::InvalidTreeStructure(format!(
                        "speciation node {} has no children",
                        node.id()
                    )),
                ));
            }
            1 if !targets.contains(&node.id()) => targets.push(node.id()),
            _ => {}
        }
    }

    let species = species.filter(|s| !s.is_empty());
    for id in targets {
        let num_children = tree.children_of(id).map_err(tree_to_parsing_error)?.len();
        if num_children != 1 {
            warn!(
                "Speciation loss at node {} has {} children, no loss added",
                id, num_children
            );
            continue;
        }

        let lost = match species {
            Some(species) => Some(lost_species(tree, id, species)?),
            None => None,
        };
        debug!(
            "Adding loss below node {} in species {}",
            id,
            lost.as_deref().unwrap_or("unknown")
        );
        add_loss(tree, id, lost, None).map_err(tree_to_parsing_error)?;
    }
    Ok(())
}

/// Determines the species the sibling of the only child of `id` was lost in.
fn lost_species(
    tree: &ReconciledTree,
    id: NodeId,
    species: &SpeciesTree,
) -> Result<String, ParsingError> {
    let node = &tree[id];
    let parent_species = node.species().unwrap_or_default();
    let Some(species_node) = species.node_by_name(parent_species) else {
        return Err(ParsingError::without_context(
            ParsingErrorType::SpeciesNotFound(parent_species.to_string()),
        ));
    };

    let [first, second] = species_node.children() else {
        return Err(ParsingError::without_context(
            ParsingErrorType::MalformedSpeciesTree(format!(
                "species \"{}\" has {} children, a speciation needs 2",
                parent_species,
                species_node.children().len()
            )),
        ));
    };
    let label = |index| species.node(index).map(|n| n.label()).unwrap_or_default();
    let (first, second) = (label(*first), label(*second));

    let survivor = tree[node.children()[0]].species();
    match survivor {
        Some(s) if s == first => Ok(second),
        Some(s) if s == second => Ok(first),
        _ => Err(ParsingError::without_context(
            ParsingErrorType::MalformedSpeciesTree(format!(
                "species \"{}\" of node {} is not a child of \"{}\"",
                survivor.unwrap_or("none"),
                node.children()[0],
                parent_species
            )),
        )),
    }
}

/// Adds a loss child to `parent`.
pub(crate) fn add_loss(
    tree: &mut ReconciledTree,
    parent: NodeId,
    species: Option<String>,
    time_slice: Option<u32>,
) -> Result<NodeId, TreeError> {
    let loss = tree.add_child(parent)?;
    let node = &mut tree[loss];
    node.set_event(EventKind::Loss);
    if let Some(species) = species {
        node.set_species(species);
    }
    if let Some(ts) = time_slice {
        node.set_time_slice(ts);
    }
    tree.set_clade_id(loss, EMPTY_CLADE)?;
    Ok(loss)
}

fn tree_to_parsing_error(err: TreeError) -> ParsingError {
    ParsingError::without_context(ParsingErrorType::InvalidTreeStructure(err.to_string()))
}
