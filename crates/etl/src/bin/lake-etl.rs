//! lake-etl: builds the song-play star schema from raw activity data.
//!
//! Reads `song_data/` and `log_data/` under the input root and writes
//! `songs/`, `artists.parquet/`, `users/`, `time/` and `songplays/` under
//! the output root. Roots may be local paths or `s3://bucket/prefix`.

use clap::{Parser, ValueEnum};
use tracing::info;

use sparkify_core::config::load_dotenv;
use sparkify_core::LakeConfig;
use sparkify_etl::{process_log_data, process_song_data, verify_outputs, LakeContext};
use sparkify_storage::WriteMode;

// ── CLI ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Stage {
    Songs,
    Logs,
    All,
}

impl Stage {
    fn runs_songs(self) -> bool {
        matches!(self, Stage::Songs | Stage::All)
    }

    fn runs_logs(self) -> bool {
        matches!(self, Stage::Logs | Stage::All)
    }
}

/// Song-play data lake ETL.
#[derive(Parser, Debug)]
#[command(name = "lake-etl", version, about)]
struct Cli {
    /// Input root (local path or s3:// URI). Overrides INPUT_ROOT.
    #[arg(long)]
    input: Option<String>,

    /// Output root (local path or s3:// URI). Overrides OUTPUT_ROOT.
    #[arg(long)]
    output: Option<String>,

    /// Which pipelines to run.
    #[arg(long, env = "LAKE_ETL_ONLY", value_enum, default_value_t = Stage::All)]
    only: Stage,

    /// Read every table back after writing and check its unique key.
    #[arg(long, env = "LAKE_ETL_VERIFY")]
    verify: bool,

    /// Fail instead of replacing a table that already exists.
    #[arg(long, env = "LAKE_ETL_NO_OVERWRITE")]
    no_overwrite: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = LakeConfig::from_env();
    if let Some(input) = cli.input {
        config.paths.input_root = input;
    }
    if let Some(output) = cli.output {
        config.paths.output_root = output;
    }

    let mut ctx = LakeContext::from_config(config)?;
    if cli.no_overwrite {
        ctx = ctx.with_write_mode(WriteMode::ErrorIfExists);
    }
    ctx.config.log_summary();

    info!(stage = ?cli.only, mode = ?ctx.write_mode, "lake-etl starting");

    if cli.only.runs_songs() {
        let summary = process_song_data(&ctx).await?;
        info!(
            records = summary.records_read,
            songs = summary.songs.rows,
            artists = summary.artists.rows,
            "song data done"
        );
    }

    if cli.only.runs_logs() {
        let summary = process_log_data(&ctx).await?;
        info!(
            events = summary.events_read,
            plays = summary.song_plays,
            users = summary.users.rows,
            time = summary.time.rows,
            songplays = summary.songplays.rows,
            "log data done"
        );
    }

    if cli.verify {
        let checks = verify_outputs(&ctx).await?;
        let dirty: Vec<_> = checks
            .iter()
            .filter(|check| !check.is_clean())
            .map(|check| check.table)
            .collect();
        if !dirty.is_empty() {
            anyhow::bail!("duplicate keys found in: {}", dirty.join(", "));
        }
    }

    info!("lake-etl finished");
    Ok(())
}
