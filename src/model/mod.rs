pub mod types;
pub mod interval;
pub mod exon;
pub mod locus;

pub use types::{ExonId, IntervalId, Link, LinkKind, SourceId};
pub use interval::{Interval, IntervalSet};
pub use exon::{Exon, ExonLink};
pub use locus::Locus;
