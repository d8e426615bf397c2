//! Error types for calendar extraction.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::LineRef;

/// Errors that abort a whole extraction call.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no academic year was provided; pass one like \"2025-2026\"")]
    MissingAcademicYear,

    #[error("invalid academic year '{0}': expected \"YYYY-YYYY\" with consecutive years, or \"YYYY\"")]
    InvalidAcademicYear(String),

    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("cannot parse OCR lines in {path}: {source}")]
    InputParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExtractResult<T> = Result<T, ExtractError>;

/// Problems with a single line. Collected next to the events, never fatal.
///
/// Lines with no date pattern at all are not issues; they only add to the
/// skipped-line count.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineIssue {
    #[error("line {}: {detail}", .line.ordinal)]
    DateOutOfRange { line: LineRef, detail: String },

    #[error("line {}: '{token}' could be any of {}", .line.ordinal, .candidates.join(", "))]
    AmbiguousMonth {
        line: LineRef,
        token: String,
        candidates: Vec<&'static str>,
    },

    #[error("line {}: date has no usable description", .line.ordinal)]
    MissingDescription { line: LineRef },
}

impl LineIssue {
    pub fn line(&self) -> LineRef {
        match self {
            LineIssue::DateOutOfRange { line, .. }
            | LineIssue::AmbiguousMonth { line, .. }
            | LineIssue::MissingDescription { line } => *line,
        }
    }

    /// Stable machine-readable name, used in JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            LineIssue::DateOutOfRange { .. } => "date_out_of_range",
            LineIssue::AmbiguousMonth { .. } => "ambiguous_month",
            LineIssue::MissingDescription { .. } => "missing_description",
        }
    }
}

/// Why the grid detector refused a page. The caller falls back to
/// reading-order lines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridDecline {
    #[error("image is empty")]
    EmptyImage,

    #[error("found {0} day columns, expected 7")]
    ColumnCount(usize),

    #[error("found {found} week rows, need between {needed} and 6")]
    RowCount { found: usize, needed: usize },

    #[error("cell {axis} of {size}px is too far from the median {median}px")]
    IrregularCells {
        axis: &'static str,
        size: u32,
        median: u32,
    },
}
