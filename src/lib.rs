//! exon_graph_db
//!
//! Builds a splice-tolerant exon graph database from cDNA-to-genome
//! alignments. Aligned blocks become intervals, intervals are grouped into
//! loci and made disjoint, and every interval is translated in each reading
//! frame. Exons are linked across observed splice junctions and written out
//! one binary gene record per locus.
//! Coordinates are 0-based, half-open.

pub mod types;
pub mod errors;
pub mod dna;
pub mod genome;
pub mod model;
pub mod alignment;
pub mod collector;
pub mod db;
pub mod stats;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub use types::{Span, Strand};
pub use errors::{DbError, LocusError};

pub use alignment::{AlignmentLoader, ParseError, Sim4Reader};
pub use collector::{build_database, CollectorOptions, ExonCollector};
pub use db::{DbSummary, GeneReader, GeneWriter, SourceIndex};
pub use genome::{GenomeStore, InMemoryGenome, RawGenomeFile};
pub use model::{Exon, Interval, IntervalSet, LinkKind, Locus};
pub use stats::RunStats;

static TRACING_INIT: Once = Once::new();

/// Install the `tracing` subscriber once. `RUST_LOG` overrides the default
/// `info` level.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
