//! RecordBatch → in-memory Parquet file.

use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;

use crate::error::StorageError;

/// Footer metadata stamped on every written file.
#[derive(Debug, Clone)]
pub struct FileMetadata<'a> {
    pub table: &'a str,
    pub run_id: &'a str,
}

/// Encode one batch as a complete Parquet file (Zstd, footer key/values).
pub fn encode_parquet(
    batch: &RecordBatch,
    meta: &FileMetadata<'_>,
    zstd_level: i32,
) -> Result<Bytes, StorageError> {
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::try_new(zstd_level)?))
        .set_key_value_metadata(Some(vec![
            KeyValue::new("sparkify.table".to_string(), Some(meta.table.to_string())),
            KeyValue::new("sparkify.run_id".to_string(), Some(meta.run_id.to_string())),
            KeyValue::new("sparkify.rows".to_string(), Some(batch.num_rows().to_string())),
        ]))
        .build();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    Ok(Bytes::from(buf))
}
