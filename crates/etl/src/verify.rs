//! Read-back checks over the written tables.

use std::collections::HashSet;

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use sparkify_storage::StorageError;
use tracing::{info, warn};

use crate::context::LakeContext;
use crate::error::PipelineError;
use crate::tables::{TableSpec, ALL_TABLES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCheck {
    pub table: &'static str,
    pub rows: usize,
    /// Rows whose unique key repeats an earlier row's. Always 0 for tables
    /// without a unique key.
    pub duplicate_keys: usize,
}

impl TableCheck {
    pub fn is_clean(&self) -> bool {
        self.duplicate_keys == 0
    }
}

/// Rows sharing a key value with an earlier row. Nulls count as one value.
pub fn count_duplicates(batch: &RecordBatch, column: &str) -> Result<usize, StorageError> {
    let index = batch.schema().index_of(column)?;
    let array = batch.column(index);
    let mut seen = HashSet::with_capacity(array.len());
    let mut duplicates = 0;
    for row in 0..array.len() {
        let value = if array.is_null(row) {
            None
        } else {
            Some(array_value_to_string(array, row)?)
        };
        if !seen.insert(value) {
            duplicates += 1;
        }
    }
    Ok(duplicates)
}

async fn check_table(ctx: &LakeContext, spec: &TableSpec) -> Result<TableCheck, StorageError> {
    let batch = ctx.reader.read(spec.destination, (spec.schema)()).await?;
    let duplicate_keys = match spec.unique_key {
        Some(column) => count_duplicates(&batch, column)?,
        None => 0,
    };
    Ok(TableCheck {
        table: spec.name,
        rows: batch.num_rows(),
        duplicate_keys,
    })
}

/// Read every output table back and count rows and key duplicates.
pub async fn verify_outputs(ctx: &LakeContext) -> Result<Vec<TableCheck>, PipelineError> {
    let mut checks = Vec::with_capacity(ALL_TABLES.len());
    for spec in &ALL_TABLES {
        let check = check_table(ctx, spec)
            .await
            .map_err(|source| PipelineError::Verify {
                table: spec.name,
                source,
            })?;
        if check.is_clean() {
            info!(table = check.table, rows = check.rows, "table verified");
        } else {
            warn!(
                table = check.table,
                rows = check.rows,
                duplicates = check.duplicate_keys,
                "table has duplicate keys"
            );
        }
        checks.push(check);
    }
    Ok(checks)
}
