//! Reconciliation events.

use std::fmt;

// =#========================================================================#=
// EVENT KIND
// =#========================================================================$=
/// The evolutionary event a reconciled gene-tree node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Current gene, a leaf of the gene tree
    Extant,
    /// Speciation in the species tree
    Speciation,
    /// Gene lost in a species
    Loss,
    /// Duplication within a species
    Duplication,
    /// Speciation into an extinct or unsampled lineage
    SpeciationOut,
    /// Landing of a transfer
    Reception,
    /// Filler node making a time-slice step explicit
    NoEvent,
    /// Bifurcation inside an extinct or unsampled lineage
    BifurcationOut,
}

impl EventKind {
    /// All event kinds, in declaration order.
    pub const ALL: [EventKind; 8] = [
        EventKind::Extant,
        EventKind::Speciation,
        EventKind::Loss,
        EventKind::Duplication,
        EventKind::SpeciationOut,
        EventKind::Reception,
        EventKind::NoEvent,
        EventKind::BifurcationOut,
    ];

    /// Tag name used for this event in a recPhyloXML `eventsRec` block.
    ///
    /// [EventKind::NoEvent] is never written; its tag name is `None`.
    pub fn tag_name(&self) -> Option<&'static str> {
        match self {
            EventKind::Extant => Some("leaf"),
            EventKind::Speciation => Some("speciation"),
            EventKind::Loss => Some("loss"),
            EventKind::Duplication => Some("duplication"),
            EventKind::SpeciationOut => Some("speciationOut"),
            EventKind::Reception => Some("transferBack"),
            EventKind::NoEvent => None,
            EventKind::BifurcationOut => Some("bifurcationOut"),
        }
    }

    /// Short label used in pseudo-Newick output.
    pub fn short_label(&self) -> &'static str {
        match self {
            EventKind::Extant => "Extant",
            EventKind::Speciation => "Spe",
            EventKind::Loss => "Loss",
            EventKind::Duplication => "Dup",
            EventKind::SpeciationOut => "SpeOut",
            EventKind::Reception => "Reception",
            EventKind::NoEvent => "Null",
            EventKind::BifurcationOut => "BifOut",
        }
    }

    /// Whether a node with this event may have `num_children` children in a
    /// finished tree.
    ///
    /// Outgoing events keep one lineage in the sampled species and may send a
    /// second one into the dead lineage, so they accept one or two children.
    pub fn accepts_children(&self, num_children: usize) -> bool {
        match self {
            EventKind::Extant | EventKind::Loss => num_children == 0,
            EventKind::Speciation | EventKind::Duplication => num_children == 2,
            EventKind::Reception | EventKind::NoEvent => num_children == 1,
            EventKind::SpeciationOut | EventKind::BifurcationOut => {
                (1..=2).contains(&num_children)
            }
        }
    }

    /// Whether this event is a transfer (counted by `count_transfers`).
    pub fn is_transfer(&self) -> bool {
        matches!(self, EventKind::Reception)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Extant => "Extant",
            EventKind::Speciation => "Speciation",
            EventKind::Loss => "Loss",
            EventKind::Duplication => "Duplication",
            EventKind::SpeciationOut => "SpeciationOut",
            EventKind::Reception => "Reception",
            EventKind::NoEvent => "NoEvent",
            EventKind::BifurcationOut => "BifurcationOut",
        };
        f.write_str(name)
    }
}
