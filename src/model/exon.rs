use crate::model::types::{ExonId, IntervalId, LinkKind};
use crate::types::Span;

/// Edge between two exons.
///
/// `amino_acid` is the residue spliced together from the bases left over at
/// the junction (None when the junction falls between codons, or when the
/// spliced codon contains a non-ACGT base).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExonLink {
    pub target: ExonId,
    pub kind: LinkKind,
    pub amino_acid: Option<u8>,
}

/// One interval read in one reading frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exon {
    pub index: ExonId,
    pub interval: IntervalId,
    pub span: Span,
    /// Bases skipped before the first codon (0, 1 or 2).
    pub frame: u8,
    /// Translated residues; stop codons are `X`.
    pub sequence: Vec<u8>,
    /// The `frame` leading bases that belong to a codon started upstream.
    pub prefix: Vec<u8>,
    /// Trailing bases (0-2) that do not complete a codon in this interval.
    pub suffix: Vec<u8>,
    pub forward: Vec<ExonLink>,
    pub backward: Vec<ExonLink>,
}

impl Exon {
    pub fn new(interval: IntervalId, span: Span, frame: u8) -> Self {
        Self {
            index: 0,
            interval,
            span,
            frame,
            sequence: Vec::new(),
            prefix: Vec::new(),
            suffix: Vec::new(),
            forward: Vec::new(),
            backward: Vec::new(),
        }
    }
}
