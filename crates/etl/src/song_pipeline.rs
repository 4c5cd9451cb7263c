//! Song catalog → `songs` and `artists` dimensions.

use sparkify_core::SongRecord;
use sparkify_storage::WriteSummary;
use tracing::info;

use crate::context::LakeContext;
use crate::dedup::dedup_by_key;
use crate::error::PipelineError;
use crate::tables::{ArtistRow, SongRow, ARTISTS, SONGS};

/// Catalog files, relative to the input root.
pub const SONG_DATA_PATTERN: &str = "song_data/*/*/*/*.json";

#[derive(Debug, Clone)]
pub struct SongCatalogSummary {
    pub records_read: usize,
    pub songs: WriteSummary,
    pub artists: WriteSummary,
}

pub fn songs_table(catalog: &[SongRecord]) -> Vec<SongRow> {
    let rows = catalog.iter().map(|song| SongRow {
        song_id: song.song_id.clone(),
        title: song.title.clone(),
        artist_id: song.artist_id.clone(),
        year: song.year,
        duration: song.duration,
    });
    dedup_by_key(rows, |row| row.song_id.clone())
}

pub fn artists_table(catalog: &[SongRecord]) -> Vec<ArtistRow> {
    let rows = catalog.iter().map(|song| ArtistRow {
        artist_id: song.artist_id.clone(),
        artist_name: song.artist_name.clone(),
        artist_location: song.artist_location.clone(),
        artist_latitude: song.artist_latitude,
        artist_longitude: song.artist_longitude,
    });
    dedup_by_key(rows, |row| row.artist_id.clone())
}

/// Read the catalog and write `songs` (partitioned by year, artist) and
/// `artists`, both in overwrite mode.
pub async fn process_song_data(ctx: &LakeContext) -> Result<SongCatalogSummary, PipelineError> {
    let catalog: Vec<SongRecord> = ctx
        .source
        .read(SONG_DATA_PATTERN)
        .await
        .map_err(|source| PipelineError::SourceRead {
            pattern: SONG_DATA_PATTERN.to_string(),
            source,
        })?;
    info!(records = catalog.len(), "song catalog loaded");

    let songs = ctx.write_table(&SONGS, &songs_table(&catalog)).await?;
    let artists = ctx.write_table(&ARTISTS, &artists_table(&catalog)).await?;

    info!(
        songs = songs.rows,
        song_partitions = songs.partitions.len(),
        artists = artists.rows,
        "song catalog processed"
    );

    Ok(SongCatalogSummary {
        records_read: catalog.len(),
        songs,
        artists,
    })
}
