//! Parquet tables on a storage backend.
//!
//! Tables are directories of Zstd-compressed Parquet files. Partitioned
//! tables use the hive layout (`year=2018/month=11/part-*.parquet`) with
//! partition columns encoded in the path instead of the files, so any
//! engine that understands hive partitioning reads them as-is.

pub(crate) mod encode;
pub mod partition;
mod reader;
mod writer;


pub use reader::TableReader;
pub use writer::{TableWriter, WriteMode, WriteSummary};
