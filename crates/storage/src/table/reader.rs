//! Read a written table back, partition columns included.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{new_null_array, ArrayRef, StringArray};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{Field, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::debug;

use super::partition::parse_partition_segment;
use crate::backend::StorageBackend;
use crate::error::StorageError;

pub struct TableReader {
    backend: Arc<StorageBackend>,
}

impl TableReader {
    pub fn new(backend: Arc<StorageBackend>) -> Self {
        Self { backend }
    }

    /// Data files of the table at `destination`, skipping hidden entries.
    pub async fn data_files(&self, destination: &str) -> Result<Vec<String>, StorageError> {
        let base = destination.trim_end_matches('/');
        let keys = self.backend.list(base).await?;
        Ok(keys
            .into_iter()
            .filter(|key| key.ends_with(".parquet"))
            .filter(|key| {
                let rel = key.strip_prefix(base).unwrap_or(key).trim_start_matches('/');
                !rel.split('/').any(|seg| seg.starts_with('.') || seg.starts_with('_'))
            })
            .collect())
    }

    /// Load every file under `destination` into one batch shaped like
    /// `schema`. Partition values come from the `col=value` directories and
    /// are cast to the schema's type; columns found nowhere are null.
    pub async fn read(&self, destination: &str, schema: SchemaRef) -> Result<RecordBatch, StorageError> {
        let base = destination.trim_end_matches('/');
        let files = self.data_files(base).await?;

        let mut batches = Vec::new();
        for key in &files {
            let rel = key.strip_prefix(base).unwrap_or(key).trim_start_matches('/');
            let partitions: HashMap<String, Option<String>> = rel
                .split('/')
                .filter_map(parse_partition_segment)
                .collect();

            let data = self.backend.get(key).await?;
            let reader = ParquetRecordBatchReaderBuilder::try_new(data)?.build()?;
            for file_batch in reader {
                let file_batch = file_batch?;
                batches.push(conform(&file_batch, &partitions, &schema)?);
            }
        }

        debug!(destination = %base, files = files.len(), "read table back");
        Ok(concat_batches(&schema, &batches)?)
    }
}

fn conform(
    batch: &RecordBatch,
    partitions: &HashMap<String, Option<String>>,
    schema: &SchemaRef,
) -> Result<RecordBatch, StorageError> {
    let rows = batch.num_rows();
    let columns = schema
        .fields()
        .iter()
        .map(|field| column_for(batch, partitions, field, rows))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}

fn column_for(
    batch: &RecordBatch,
    partitions: &HashMap<String, Option<String>>,
    field: &Field,
    rows: usize,
) -> Result<ArrayRef, StorageError> {
    if let Some(column) = batch.column_by_name(field.name()) {
        if column.data_type() == field.data_type() {
            return Ok(column.clone());
        }
        return Ok(cast(column, field.data_type())?);
    }

    match partitions.get(field.name()) {
        Some(Some(value)) => {
            let repeated: ArrayRef = Arc::new(StringArray::from(vec![value.as_str(); rows]));
            Ok(cast(&repeated, field.data_type())?)
        }
        _ => Ok(new_null_array(field.data_type(), rows)),
    }
}
