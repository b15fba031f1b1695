pub mod reader;
pub mod source_index;
pub mod writer;

pub use reader::{DbSummary, ExonRecord, GeneReader, GeneRecord, LinkRecord};
pub use source_index::SourceIndex;
pub use writer::{GeneWriter, SOURCE_ID_SLOTS};
