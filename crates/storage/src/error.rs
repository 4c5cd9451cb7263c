use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] sparkify_core::LakeError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("malformed record at {key}:{line}: {source}")]
    MalformedRecord {
        key: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid UTF-8 at {key}:{line}: {source}")]
    InvalidEncoding {
        key: String,
        line: usize,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("no files match '{pattern}'")]
    NoMatchingFiles { pattern: String },

    #[error("partition column '{column}' is not in the schema of '{destination}'")]
    MissingPartitionColumn { column: String, destination: String },

    #[error("destination '{0}' already exists")]
    DestinationExists(String),
}
