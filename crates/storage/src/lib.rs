pub mod backend;
pub mod error;
pub mod source;
pub mod table;

pub use backend::{LocalBackend, S3Backend, StorageBackend};
pub use error::StorageError;
pub use source::{GlobPattern, JsonLinesSource};
pub use table::{TableReader, TableWriter, WriteMode, WriteSummary};
