//! Error types for the pip-analysis crate.
use std::path::PathBuf;

use thiserror::Error;

/// Error type for the crate.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A variable that is required for this analysis is not in the dataset.
    #[error("Missing variable `{0}` required for the analysis.")]
    MissingVariable(String),
    /// A bin-center vector that is required is not in the dataset.
    #[error("Missing bin axis `{0}` required for the analysis.")]
    MissingBinAxis(String),
    /// The variable exists but has the wrong shape for the requested access.
    #[error("Variable `{name}` is not a {expected} variable.")]
    WrongKind {
        /// Name of the variable.
        name: String,
        /// The kind that was requested, "series" or "binned".
        expected: &'static str,
    },
    /// Two parallel sequences do not have matching lengths.
    #[error("Length mismatch for `{name}`: expected {expected}, found {found}.")]
    LengthMismatch {
        /// What was being checked.
        name: String,
        /// Required length.
        expected: usize,
        /// Actual length.
        found: usize,
    },
    /// Two datasets being merged hold different values for the same variable.
    #[error("Conflicting values for `{0}` while merging datasets.")]
    MergeConflict(String),
    /// Datasets being concatenated do not share the same variables.
    #[error("Cannot concatenate datasets, `{0}` is not present in all of them.")]
    ConcatMismatch(String),
    /// A site code that is not part of the network.
    #[error("Unknown site code `{0}`.")]
    UnknownSite(String),
    /// A directory name that is not of the form `YEAR_SITE`.
    #[error("`{0}` is not a YEAR_SITE directory name.")]
    InvalidSiteYear(String),
    /// A file could not be interpreted as a PIP dataset.
    #[error("Unable to read {path}: {reason}")]
    Read {
        /// The offending file.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// Forward an error from the standard library I/O layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Forward an error from building a file search pattern.
    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// Forward an error from the netcdf crate.
    #[cfg(feature = "netcdf")]
    #[error("Error bubbled up from netcdf crate: {0}")]
    NetCdf(#[from] netcdf::Error),
}

/// Shorthand for results.
pub type Result<T> = ::std::result::Result<T, AnalysisError>;
