#![deny(warnings)]

// Library crate for filewriter

pub mod error;
pub mod file_writer;
pub mod logging;
pub mod report;

pub use error::{FileWriterError, Result};
pub use file_writer::FileWriter;
