use std::sync::Arc;

use sparkify_core::LakeConfig;
use sparkify_storage::{
    JsonLinesSource, StorageBackend, StorageError, TableReader, TableWriter, WriteMode, WriteSummary,
};

use crate::error::PipelineError;
use crate::tables::{TableRow, TableSpec};

/// Run-wide handles, built once from the config and passed to every
/// pipeline explicitly.
pub struct LakeContext {
    pub config: LakeConfig,
    /// Reads raw records under the input root.
    pub source: JsonLinesSource,
    /// Writes tables under the output root.
    pub writer: TableWriter,
    /// Reads tables back from the output root.
    pub reader: TableReader,
    /// Applied to every table write; overwrite unless asked otherwise.
    pub write_mode: WriteMode,
}

impl LakeContext {
    pub fn from_config(config: LakeConfig) -> Result<Self, StorageError> {
        let input = Arc::new(StorageBackend::for_root(&config.paths.input_root, &config.aws)?);
        let output = Arc::new(StorageBackend::for_root(&config.paths.output_root, &config.aws)?);

        Ok(Self {
            source: JsonLinesSource::new(input),
            writer: TableWriter::new(output.clone(), &config.parquet),
            reader: TableReader::new(output),
            write_mode: WriteMode::Overwrite,
            config,
        })
    }

    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Build the batch for `rows` and write it where `spec` says, using the
    /// context's write mode.
    pub async fn write_table<R: TableRow>(
        &self,
        spec: &TableSpec,
        rows: &[R],
    ) -> Result<WriteSummary, PipelineError> {
        let batch = R::to_batch(rows).map_err(|source| PipelineError::Build {
            table: spec.name,
            source,
        })?;

        self.writer
            .write(&batch, spec.destination, spec.partition_by, self.write_mode)
            .await
            .map_err(|source| PipelineError::Write {
                table: spec.name,
                source,
            })
    }
}
