use std::fmt;

use serde::{Serialize, Deserialize};

/// Internal numeric IDs (indexes into Vecs).
pub type IntervalId = usize;
pub type ExonId = usize;

/// Identifier of the cDNA that witnessed an interval (GenBank GI number).
pub type SourceId = i32;

/// Weight value written for an [`LinkKind::Adjacent`] edge.
pub const ADJACENT_WEIGHT: i32 = -1;

/// Evidence carried by an edge between two intervals (or two exons).
///
/// `Splice` edges come from alignments that jump from one block to the next.
/// `Adjacent` edges join the pieces of one interval after it has been cut
/// during consolidation: they are genomic continuity, not a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    Splice(u32),
    Adjacent,
}

impl LinkKind {
    /// Combine two edges that now join the same pair of intervals.
    ///
    /// Splice counts add up; adjacency wins over any count.
    pub fn merge(self, other: LinkKind) -> LinkKind {
        match (self, other) {
            (LinkKind::Splice(a), LinkKind::Splice(b)) => LinkKind::Splice(a.saturating_add(b)),
            _ => LinkKind::Adjacent,
        }
    }

    /// Weight of a two-hop edge: the weaker of the two counts.
    ///
    /// An adjacency hop carries no count of its own, so the other hop decides.
    pub fn weakest(self, other: LinkKind) -> LinkKind {
        match (self, other) {
            (LinkKind::Splice(a), LinkKind::Splice(b)) => LinkKind::Splice(a.min(b)),
            (LinkKind::Adjacent, x) | (x, LinkKind::Adjacent) => x,
        }
    }

    /// On-disk weight.
    pub fn weight(self) -> i32 {
        match self {
            LinkKind::Splice(n) => i32::try_from(n).unwrap_or(i32::MAX),
            LinkKind::Adjacent => ADJACENT_WEIGHT,
        }
    }

    pub fn from_weight(weight: i32) -> LinkKind {
        if weight < 0 {
            LinkKind::Adjacent
        } else {
            LinkKind::Splice(weight as u32)
        }
    }

    #[inline]
    pub fn is_adjacent(self) -> bool {
        self == LinkKind::Adjacent
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Splice(n) => write!(f, "splice({n})"),
            LinkKind::Adjacent => write!(f, "adjacent"),
        }
    }
}

/// One directed edge as stored on an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub target: IntervalId,
    pub kind: LinkKind,
}

impl Link {
    pub fn new(target: IntervalId, kind: LinkKind) -> Self {
        Self { target, kind }
    }
}
