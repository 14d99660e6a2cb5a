//! File I/O, validation, and serialization for the chromwarp pipeline.

mod anchor_reader;
mod directory;
mod domain;
mod error;
mod scan_reader;
mod writer;

pub use anchor_reader::AnchorReader;
pub use directory::{AnchorDirectory, CsvDirectory};
pub use domain::{ExperimentName, SequenceId};
pub use error::IoError;
pub use scan_reader::ScanReader;
pub use writer::ResultWriter;
