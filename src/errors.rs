use thiserror::Error;

use crate::model::types::IntervalId;

/// Corrupt link graph inside one locus.
///
/// Raised while consolidating or linking; the locus is dropped and the run
/// moves on to the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocusError {
    #[error("interval {from} [{from_start}-{from_end}) links to {to} [{to_start}-{to_end}) which does not lie downstream")]
    BackwardLink {
        from: IntervalId,
        from_start: u32,
        from_end: u32,
        to: IntervalId,
        to_start: u32,
        to_end: u32,
    },
    #[error("interval {id} [{start}-{end}) links to itself")]
    SelfLink { id: IntervalId, start: u32, end: u32 },
}

/// Errors while writing or reading the gene database.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("truncated gene record {gene}: {what}")]
    Truncated { gene: usize, what: &'static str },
    #[error("invalid value in gene record {gene}: {reason}")]
    Invalid { gene: usize, reason: String },
}
