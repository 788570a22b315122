//! Error types for the extraction engine

use std::fmt;

use thiserror::Error;

/// Result type for extraction operations
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// A field whose configuration cannot be trusted for any record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Name of the offending field
    pub field: String,
    /// What is contradictory about it
    pub reason: String,
}

impl FieldIssue {
    pub fn new<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': {}", self.field, self.reason)
    }
}

/// Errors raised before a scan starts
///
/// Per-cell resolution has no failure case, so nothing here is produced
/// while records are being pulled.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// One or more fields classified as contradictory
    #[error("{} misconfigured field(s): {}", .0.len(), join_issues(.0))]
    Misconfigured(Vec<FieldIssue>),

    /// The configured sheet order names a sheet the grid does not have
    #[error("Sheet not found in grid: {0}")]
    UnknownSheet(String),

    /// Configuration JSON could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// IO error while loading a configuration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misconfigured_message_lists_every_field() {
        let err = ExtractError::Misconfigured(vec![
            FieldIssue::new("a", "first_row requires a column scan"),
            FieldIssue::new("b", "duplicate field name"),
        ]);
        assert_eq!(
            err.to_string(),
            "2 misconfigured field(s): field 'a': first_row requires a column scan; \
             field 'b': duplicate field name"
        );
    }
}
