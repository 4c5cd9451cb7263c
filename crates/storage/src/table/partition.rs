//! Hive-style partition layout: `col=value/col=value/part-*.parquet`.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::Schema;
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::display::array_value_to_string;

/// Directory token for a null partition value.
pub const DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Characters that cannot appear verbatim in a partition directory name.
fn needs_escape(c: char) -> bool {
    c.is_control() || matches!(c, '"' | '#' | '%' | '\'' | '*' | '/' | ':' | '=' | '?' | '\\' | '{' | '[' | ']' | '^')
}

/// Percent-escape a partition value for use in a path segment.
pub fn escape_path_name(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", b));
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Inverse of [`escape_path_name`]. Malformed `%` sequences pass through.
pub fn unescape_path_name(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// One `col=value` directory segment.
pub fn partition_segment(column: &str, value: Option<&str>) -> String {
    match value {
        Some(v) => format!("{}={}", escape_path_name(column), escape_path_name(v)),
        None => format!("{}={}", escape_path_name(column), DEFAULT_PARTITION),
    }
}

/// Parse a `col=value` segment. Returns `None` for segments that are not
/// partition directories. The value is `None` for the default partition.
pub fn parse_partition_segment(segment: &str) -> Option<(String, Option<String>)> {
    let (column, value) = segment.split_once('=')?;
    if column.is_empty() {
        return None;
    }
    let value = if value == DEFAULT_PARTITION {
        None
    } else {
        Some(unescape_path_name(value))
    };
    Some((unescape_path_name(column), value))
}

/// Rows of one partition with the partition columns removed.
#[derive(Debug)]
pub struct PartitionSlice {
    /// Relative directory, e.g. `year=2018/month=11`; empty when unpartitioned.
    pub path: String,
    pub batch: RecordBatch,
}

fn cell_value(array: &ArrayRef, row: usize) -> Result<Option<String>, ArrowError> {
    if array.is_null(row) {
        Ok(None)
    } else {
        array_value_to_string(array, row).map(Some)
    }
}

/// Split `batch` by the distinct combination of values in `columns`
/// (given as indices into the batch schema). Row order inside each slice
/// follows the input; slices come out sorted by path.
pub fn split_by_partition(batch: &RecordBatch, columns: &[usize]) -> Result<Vec<PartitionSlice>, ArrowError> {
    if columns.is_empty() {
        return Ok(vec![PartitionSlice {
            path: String::new(),
            batch: batch.clone(),
        }]);
    }

    let schema = batch.schema();
    let keep: Vec<usize> = (0..schema.fields().len())
        .filter(|i| !columns.contains(i))
        .collect();
    let data_schema = Arc::new(Schema::new(
        keep.iter().map(|&i| schema.field(i).clone()).collect::<Vec<_>>(),
    ));

    // Grouping on the rendered directory keeps a null and a literal
    // DEFAULT_PARTITION value in one file; both read back as null.
    let mut groups: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let path = columns
            .iter()
            .map(|&c| {
                let value = cell_value(batch.column(c), row)?;
                Ok(partition_segment(schema.field(c).name(), value.as_deref()))
            })
            .collect::<Result<Vec<_>, ArrowError>>()?
            .join("/");
        groups.entry(path).or_default().push(row as u32);
    }

    let mut slices = Vec::with_capacity(groups.len());
    for (path, rows) in groups {
        let indices = UInt32Array::from(rows);
        let arrays = keep
            .iter()
            .map(|&i| take(batch.column(i).as_ref(), &indices, None))
            .collect::<Result<Vec<_>, _>>()?;
        // A batch whose only columns are partition columns still has rows.
        let options = RecordBatchOptions::new().with_row_count(Some(indices.len()));
        let slice = RecordBatch::try_new_with_options(data_schema.clone(), arrays, &options)?;

        slices.push(PartitionSlice { path, batch: slice });
    }

    Ok(slices)
}
