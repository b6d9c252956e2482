//! recPhyloXML format constants.
//!
//! Tag and attribute names used when reading and writing recPhyloXML files.

/// XML declaration written as first line
pub(crate) const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Opening line of the document element, with namespaces
pub(crate) const REC_PHYLO_OPEN: &str = r#"<recPhylo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.recg.org ./recGeneTreeXML.xsd" xmlns="http://www.recg.org">"#;

// Structure tags
/// Document element "recPhylo"
pub(crate) const REC_PHYLO: &str = "recPhylo";

/// Species tree block "spTree"
pub(crate) const SP_TREE: &str = "spTree";

/// Reconciled gene tree block "recGeneTree"
pub(crate) const REC_GENE_TREE: &str = "recGeneTree";

/// Tree wrapper "phylogeny"
pub(crate) const PHYLOGENY: &str = "phylogeny";

/// Tree index inside a "phylogeny" block
pub(crate) const ID: &str = "id";

/// Node "clade"
pub(crate) const CLADE: &str = "clade";

/// Node name "name"
pub(crate) const NAME: &str = "name";

/// Species-tree branch length "branch_length"
pub(crate) const BRANCH_LENGTH: &str = "branch_length";

/// Event list "eventsRec"
pub(crate) const EVENTS_REC: &str = "eventsRec";

// Event tags only ever read (written ones come from EventKind::tag_name)
/// Speciation with an implicit loss in the sister species
pub(crate) const SPECIATION_LOSS: &str = "speciationLoss";

/// Speciation out with an implicit loss in the same species
pub(crate) const SPECIATION_OUT_LOSS: &str = "speciationOutLoss";

/// Suffix marking an event whose node has loss children
pub(crate) const LOSS_SUFFIX: &str = "Loss";

// Event attributes
/// Species an event takes place in
pub(crate) const SPECIES_LOCATION: &str = "speciesLocation";

/// Species a transfer lands in
pub(crate) const DESTINATION_SPECIES: &str = "destinationSpecies";

/// Time slice of an event
pub(crate) const TIME_SLICE: &str = "timeSlice";

/// Name of an extant gene
pub(crate) const GENE_NAME: &str = "geneName";
