//! Error taxonomy for archive operations.
//!
//! Three categories, each its own enum so the CLI can map them to distinct
//! exit codes:
//!
//! | Category | Meaning |
//! |----------|---------|
//! | [`FormatError`] | the stream violates the record layout |
//! | [`ChecksumError`] | a stored digest does not match the recomputed one |
//! | [`IoError`] | the underlying file or stream failed |
//!
//! Nothing is recovered locally and nothing is retried: the first error
//! aborts the whole operation and is surfaced with the member name when it
//! is known at that point of the scan.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, BaleError>;

/// Structural violations of the record layout.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The stream does not begin with the archive tag.
    #[error("not a bale archive (bad tag)")]
    BadTag,

    /// A record's fixed terminator bytes did not match the format constant.
    #[error("corrupt {record} record: bad terminator")]
    BadTerminator { record: &'static str },

    /// End of stream in the middle of a member header. A clean end of
    /// archive is zero bytes exactly where a header would start.
    #[error("truncated member header ({got} of {expected} bytes)")]
    TruncatedHeader { got: usize, expected: usize },

    /// The size field did not parse as a non-negative decimal integer.
    #[error("member {name:?}: bad size field {field:?}")]
    BadSize { name: String, field: String },

    /// End of stream where the member's padding or footer should be.
    #[error("member {name:?}: footer missing or truncated")]
    MissingFooter { name: String },
}

/// A recomputed digest disagrees with the one stored in the member footer.
#[derive(Error, Debug)]
pub enum ChecksumError {
    #[error("member {name:?}: header digest mismatch (stored {stored}, computed {computed})")]
    HeaderMismatch {
        name: String,
        stored: String,
        computed: String,
    },

    #[error("member {name:?}: data digest mismatch (stored {stored}, computed {computed})")]
    DataMismatch {
        name: String,
        stored: String,
        computed: String,
    },
}

/// Failures of the underlying files and streams.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("cannot open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("read failed on {what}: {source}")]
    Read { what: String, source: io::Error },

    #[error("write failed on {what}: {source}")]
    Write { what: String, source: io::Error },

    /// Stat failed, or the path does not name a regular file.
    #[error("cannot resolve metadata for {}: {source}", .path.display())]
    MetadataUnavailable { path: PathBuf, source: io::Error },

    /// The path contains the reserved name terminator and cannot be
    /// represented in a member header.
    #[error("cannot archive {}: name contains a newline", .path.display())]
    UnstorableName { path: PathBuf },
}

/// Any error the archive engine can produce.
#[derive(Error, Debug)]
pub enum BaleError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    #[error(transparent)]
    Io(#[from] IoError),
}
