use thiserror::Error;

use sparkify_storage::StorageError;

/// Any failure aborts the run; nothing is retried or skipped.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source path unreadable, or a record violating the expected schema.
    #[error("failed to read source '{pattern}': {source}")]
    SourceRead {
        pattern: String,
        #[source]
        source: StorageError,
    },

    /// Destination unwritable, or a partition column missing from the table.
    #[error("failed to write table '{table}': {source}")]
    Write {
        table: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("failed to build table '{table}': {source}")]
    Build {
        table: &'static str,
        #[source]
        source: arrow::error::ArrowError,
    },

    /// A written table could not be read back.
    #[error("failed to verify table '{table}': {source}")]
    Verify {
        table: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("timestamp {ts} is outside the supported calendar range")]
    InvalidTimestamp { ts: i64 },
}
