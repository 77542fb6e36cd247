#![deny(warnings)]

// Per-operation result records for machine-readable output

use crate::error::Result;
use crate::file_writer::FileWriter;

/// Outcome of one file operation, printed by the CLI in `--json` mode
#[derive(Debug, serde::Serialize)]
pub struct OpReport {
    pub path: String,
    pub operation: String,
    pub status: String,
    pub exists: bool,
    pub error: Option<String>,
}

impl OpReport {
    /// Build a report from the outcome of an operation on `writer`.
    /// `exists` is probed after the operation ran.
    pub fn new(writer: &FileWriter, operation: &str, result: &Result<()>) -> Self {
        let (status, error) = match result {
            Ok(()) => ("ok".to_string(), None),
            Err(e) => ("error".to_string(), Some(e.to_string())),
        };

        Self {
            path: writer.path().display().to_string(),
            operation: operation.to_string(),
            status,
            exists: writer.exists(),
            error,
        }
    }

    /// Whether the operation succeeded
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
