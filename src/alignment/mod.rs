pub mod builder;
pub mod io;

pub use builder::{AlignmentLoader, LoadedAlignments};
pub use io::{parse_file_stem, AlignmentRecord, ParseError, Sim4Reader};
