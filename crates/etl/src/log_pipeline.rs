//! Activity logs → `users`, `time` dimensions and the `songplays` fact table.

use sparkify_core::{ActivityRecord, SongRecord};
use sparkify_storage::WriteSummary;
use tracing::{debug, info};

use crate::context::LakeContext;
use crate::dedup::dedup_by_key;
use crate::error::PipelineError;
use crate::join::CatalogIndex;
use crate::song_pipeline::SONG_DATA_PATTERN;
use crate::tables::{SongplayRow, TimeRow, UserRow, SONGPLAYS, TIME, USERS};
use crate::timekeys::{start_time, CalendarFields};

/// Activity log files, relative to the input root.
pub const LOG_DATA_PATTERN: &str = "log_data/*/*/*.json";

#[derive(Debug, Clone)]
pub struct ActivityLogSummary {
    pub events_read: usize,
    pub song_plays: usize,
    pub users: WriteSummary,
    pub time: WriteSummary,
    pub songplays: WriteSummary,
}

/// Keep only song-play events.
pub fn song_plays(events: Vec<ActivityRecord>) -> Vec<ActivityRecord> {
    events.into_iter().filter(ActivityRecord::is_song_play).collect()
}

pub fn users_table(plays: &[ActivityRecord]) -> Vec<UserRow> {
    let rows = plays.iter().map(|play| UserRow {
        user_id: play.user_id.clone(),
        first_name: play.first_name.clone(),
        last_name: play.last_name.clone(),
        gender: play.gender.clone(),
        level: play.level.clone(),
    });
    dedup_by_key(rows, |row| row.user_id.clone())
}

pub fn time_table(plays: &[ActivityRecord]) -> Result<Vec<TimeRow>, PipelineError> {
    let instants = dedup_by_key(plays.iter().map(|play| start_time(play.ts)), |s| *s);
    instants
        .into_iter()
        .map(|start_time| {
            let fields = CalendarFields::from_epoch_seconds(start_time)?;
            Ok(TimeRow {
                start_time,
                hour: fields.hour,
                day: fields.day,
                week: fields.week,
                month: fields.month,
                year: fields.year,
                weekday: fields.weekday,
            })
        })
        .collect()
}

/// One row per (play, matching catalog entry). Plays without a match are
/// dropped.
pub fn songplays_table(
    plays: &[ActivityRecord],
    catalog: &CatalogIndex<'_>,
) -> Result<Vec<SongplayRow>, PipelineError> {
    let mut rows = Vec::new();
    let mut unmatched = 0usize;

    for play in plays {
        let matches = catalog.matches(play);
        if matches.is_empty() {
            unmatched += 1;
            continue;
        }

        let start_time = start_time(play.ts);
        let fields = CalendarFields::from_epoch_seconds(start_time)?;
        for song in matches {
            rows.push(SongplayRow {
                start_time,
                user_id: play.user_id.clone(),
                level: play.level.clone(),
                song_id: song.song_id.clone(),
                artist_id: song.artist_id.clone(),
                session_id: play.session_id,
                location: play.location.clone(),
                user_agent: play.user_agent.clone(),
                year: fields.year,
                month: fields.month,
            });
        }
    }

    debug!(matched = rows.len(), unmatched, "song plays joined against catalog");
    Ok(rows)
}

/// Read the activity logs, write `users` and `time`, then join the plays
/// against a fresh read of the song catalog and write `songplays`.
pub async fn process_log_data(ctx: &LakeContext) -> Result<ActivityLogSummary, PipelineError> {
    let events: Vec<ActivityRecord> = ctx
        .source
        .read(LOG_DATA_PATTERN)
        .await
        .map_err(|source| PipelineError::SourceRead {
            pattern: LOG_DATA_PATTERN.to_string(),
            source,
        })?;
    let events_read = events.len();
    let plays = song_plays(events);
    info!(events = events_read, plays = plays.len(), "activity log loaded");

    let users = ctx.write_table(&USERS, &users_table(&plays)).await?;
    let time = ctx.write_table(&TIME, &time_table(&plays)?).await?;

    let catalog: Vec<SongRecord> = ctx
        .source
        .read(SONG_DATA_PATTERN)
        .await
        .map_err(|source| PipelineError::SourceRead {
            pattern: SONG_DATA_PATTERN.to_string(),
            source,
        })?;
    let index = CatalogIndex::build(&catalog);
    debug!(catalog = catalog.len(), keys = index.len(), "catalog index built");

    let songplays = ctx
        .write_table(&SONGPLAYS, &songplays_table(&plays, &index)?)
        .await?;

    info!(
        users = users.rows,
        time = time.rows,
        songplays = songplays.rows,
        "activity log processed"
    );

    Ok(ActivityLogSummary {
        events_read,
        song_plays: plays.len(),
        users,
        time,
        songplays,
    })
}
