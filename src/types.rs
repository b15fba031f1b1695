use serde::{Serialize, Deserialize};

/// Genomic strand/orientation of a chromosome pass.
///
/// Every run of the collector handles exactly one chromosome/strand pair, so
/// there is no "unknown" orientation here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    #[inline]
    pub fn is_reverse(self) -> bool {
        self == Strand::Minus
    }

    /// `+` or `-`, as used in file stems and gene names.
    pub fn symbol(self) -> char {
        match self {
            Strand::Plus => '+',
            Strand::Minus => '-',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Strand::Plus),
            '-' => Some(Strand::Minus),
            _ => None,
        }
    }

    /// Orientation word found in sim4 header lines.
    pub fn from_sim4_direction(word: &str) -> Option<Self> {
        match word.trim() {
            "forward" => Some(Strand::Plus),
            "complement" => Some(Strand::Minus),
            _ => None,
        }
    }
}

/// A contiguous genomic interval.
/// Coordinates are 0-based, half-open: [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span. Panics if start >= end.
    pub fn new(start: u32, end: u32) -> Self {
        assert!(start < end, "Span requires start < end");
        Self { start, end }
    }

    #[inline]
    pub fn len(self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }

    #[inline]
    pub fn overlaps(self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    #[inline]
    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True if `other` begins exactly where `self` ends.
    #[inline]
    pub fn abuts(self, other: Span) -> bool {
        self.end == other.start
    }

    /// Cut the union of two overlapping spans at every distinct endpoint.
    ///
    /// Returns the cut points (sorted, deduped); consecutive points delimit
    /// the pieces. Two identical spans produce a single piece.
    pub fn cut_points(a: Span, b: Span) -> Vec<u32> {
        let mut cuts = vec![a.start, a.end, b.start, b.end];
        cuts.sort_unstable();
        cuts.dedup();
        cuts
    }
}
