//! Partitioned, overwrite-mode table writer.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use tracing::info;
use uuid::Uuid;

use sparkify_core::config::ParquetConfig;

use super::encode::{encode_parquet, FileMetadata};
use super::partition::split_by_partition;
use crate::backend::StorageBackend;
use crate::error::StorageError;

/// What to do when the destination already holds data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Replace prior contents entirely; nothing is merged.
    #[default]
    Overwrite,
    /// Refuse to write if anything exists at the destination.
    ErrorIfExists,
}

/// Outcome of one table write.
#[derive(Debug, Clone)]
pub struct WriteSummary {
    pub destination: String,
    pub rows: usize,
    pub files: usize,
    /// Relative partition directories written (empty when unpartitioned).
    pub partitions: Vec<String>,
}

/// Persists Arrow batches as Parquet under one output root.
pub struct TableWriter {
    backend: Arc<StorageBackend>,
    zstd_level: i32,
}

impl TableWriter {
    pub fn new(backend: Arc<StorageBackend>, config: &ParquetConfig) -> Self {
        Self {
            backend,
            zstd_level: config.zstd_level,
        }
    }

    /// Write `batch` to `destination` (a key relative to the output root).
    ///
    /// With `partition_by`, rows are laid out as `col=value/…` directories in
    /// the given column order and the partition columns are dropped from the
    /// file schema. Every declared column is validated before storage is
    /// touched.
    pub async fn write(
        &self,
        batch: &RecordBatch,
        destination: &str,
        partition_by: &[&str],
        mode: WriteMode,
    ) -> Result<WriteSummary, StorageError> {
        let schema = batch.schema();
        let partition_indices = partition_by
            .iter()
            .map(|column| {
                schema
                    .index_of(column)
                    .map_err(|_| StorageError::MissingPartitionColumn {
                        column: column.to_string(),
                        destination: destination.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if mode == WriteMode::ErrorIfExists && self.backend.exists(destination).await? {
            return Err(StorageError::DestinationExists(self.backend.describe(destination)));
        }

        let run_id = Uuid::new_v4().simple().to_string();
        let table = destination
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(destination);
        let meta = FileMetadata { table, run_id: &run_id };
        let file_name = format!("part-00000-{run_id}.parquet");

        let slices = split_by_partition(batch, &partition_indices)?;
        let mut files = Vec::with_capacity(slices.len());
        let mut partitions = Vec::new();
        for slice in &slices {
            let rel = if slice.path.is_empty() {
                file_name.clone()
            } else {
                partitions.push(slice.path.clone());
                format!("{}/{}", slice.path, file_name)
            };
            files.push((rel, encode_parquet(&slice.batch, &meta, self.zstd_level)?));
        }

        let file_count = files.len();
        self.backend.replace_prefix(destination, files, &run_id).await?;

        info!(
            destination = %self.backend.describe(destination),
            rows = batch.num_rows(),
            files = file_count,
            partitions = partitions.len(),
            "Wrote table"
        );

        Ok(WriteSummary {
            destination: destination.to_string(),
            rows: batch.num_rows(),
            files: file_count,
            partitions,
        })
    }
}
