//! Song-play data lake ETL: raw JSON-lines sources in, a partitioned
//! Parquet star schema out.

pub mod context;
pub mod dedup;
pub mod error;
pub mod join;
pub mod log_pipeline;
pub mod song_pipeline;
pub mod tables;
pub mod timekeys;
pub mod verify;

pub use context::LakeContext;
pub use error::PipelineError;
pub use log_pipeline::{process_log_data, ActivityLogSummary, LOG_DATA_PATTERN};
pub use song_pipeline::{process_song_data, SongCatalogSummary, SONG_DATA_PATTERN};
pub use verify::{verify_outputs, TableCheck};
