//! Output tables of the star schema: row types, Arrow schemas and layout.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

/// A row type that can be turned into an Arrow batch.
pub trait TableRow: Sized {
    fn schema() -> SchemaRef;
    fn to_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError>;
}

/// Where and how a table is written.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    /// Key relative to the output root.
    pub destination: &'static str,
    pub partition_by: &'static [&'static str],
    /// Column that must be unique, if any.
    pub unique_key: Option<&'static str>,
    pub schema: fn() -> SchemaRef,
}

pub const SONGS: TableSpec = TableSpec {
    name: "songs",
    destination: "songs",
    partition_by: &["year", "artist_id"],
    unique_key: Some("song_id"),
    schema: <SongRow as TableRow>::schema,
};

pub const ARTISTS: TableSpec = TableSpec {
    name: "artists",
    destination: "artists.parquet",
    partition_by: &[],
    unique_key: Some("artist_id"),
    schema: <ArtistRow as TableRow>::schema,
};

pub const USERS: TableSpec = TableSpec {
    name: "users",
    destination: "users",
    partition_by: &[],
    unique_key: Some("user_id"),
    schema: <UserRow as TableRow>::schema,
};

pub const TIME: TableSpec = TableSpec {
    name: "time",
    destination: "time",
    partition_by: &["year", "month"],
    unique_key: Some("start_time"),
    schema: <TimeRow as TableRow>::schema,
};

pub const SONGPLAYS: TableSpec = TableSpec {
    name: "songplays",
    destination: "songplays",
    partition_by: &["year", "month"],
    unique_key: None,
    schema: <SongplayRow as TableRow>::schema,
};

pub const ALL_TABLES: [TableSpec; 5] = [SONGS, ARTISTS, USERS, TIME, SONGPLAYS];

// ── column helpers ────────────────────────────────────────────

fn utf8<'a, T: 'a>(rows: &'a [T], f: impl Fn(&'a T) -> Option<&'a str>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<StringArray>())
}

fn int64<T>(rows: &[T], f: impl Fn(&T) -> Option<i64>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<Int64Array>())
}

fn int32<T>(rows: &[T], f: impl Fn(&T) -> Option<i32>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<Int32Array>())
}

fn float64<T>(rows: &[T], f: impl Fn(&T) -> Option<f64>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<Float64Array>())
}

// ── songs ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SongRow {
    pub song_id: Option<String>,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub year: Option<i64>,
    pub duration: Option<f64>,
}

impl TableRow for SongRow {
    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("song_id", DataType::Utf8, true),
            Field::new("title", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("year", DataType::Int64, true),
            Field::new("duration", DataType::Float64, true),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        RecordBatch::try_new(
            Self::schema(),
            vec![
                utf8(rows, |r| r.song_id.as_deref()),
                utf8(rows, |r| r.title.as_deref()),
                utf8(rows, |r| r.artist_id.as_deref()),
                int64(rows, |r| r.year),
                float64(rows, |r| r.duration),
            ],
        )
    }
}

// ── artists ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRow {
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
    pub artist_location: Option<String>,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
}

impl TableRow for ArtistRow {
    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("artist_name", DataType::Utf8, true),
            Field::new("artist_location", DataType::Utf8, true),
            Field::new("artist_latitude", DataType::Float64, true),
            Field::new("artist_longitude", DataType::Float64, true),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        RecordBatch::try_new(
            Self::schema(),
            vec![
                utf8(rows, |r| r.artist_id.as_deref()),
                utf8(rows, |r| r.artist_name.as_deref()),
                utf8(rows, |r| r.artist_location.as_deref()),
                float64(rows, |r| r.artist_latitude),
                float64(rows, |r| r.artist_longitude),
            ],
        )
    }
}

// ── users ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

impl TableRow for UserRow {
    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("user_id", DataType::Utf8, true),
            Field::new("first_name", DataType::Utf8, true),
            Field::new("last_name", DataType::Utf8, true),
            Field::new("gender", DataType::Utf8, true),
            Field::new("level", DataType::Utf8, true),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        RecordBatch::try_new(
            Self::schema(),
            vec![
                utf8(rows, |r| r.user_id.as_deref()),
                utf8(rows, |r| r.first_name.as_deref()),
                utf8(rows, |r| r.last_name.as_deref()),
                utf8(rows, |r| r.gender.as_deref()),
                utf8(rows, |r| r.level.as_deref()),
            ],
        )
    }
}

// ── time ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRow {
    /// Epoch seconds.
    pub start_time: i64,
    pub hour: i32,
    pub day: i32,
    pub week: i32,
    pub month: i32,
    pub year: i32,
    pub weekday: i32,
}

impl TableRow for TimeRow {
    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("start_time", DataType::Int64, true),
            Field::new("hour", DataType::Int32, true),
            Field::new("day", DataType::Int32, true),
            Field::new("week", DataType::Int32, true),
            Field::new("month", DataType::Int32, true),
            Field::new("year", DataType::Int32, true),
            Field::new("weekday", DataType::Int32, true),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        RecordBatch::try_new(
            Self::schema(),
            vec![
                int64(rows, |r| Some(r.start_time)),
                int32(rows, |r| Some(r.hour)),
                int32(rows, |r| Some(r.day)),
                int32(rows, |r| Some(r.week)),
                int32(rows, |r| Some(r.month)),
                int32(rows, |r| Some(r.year)),
                int32(rows, |r| Some(r.weekday)),
            ],
        )
    }
}

// ── songplays ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SongplayRow {
    pub start_time: i64,
    pub user_id: Option<String>,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub year: i32,
    pub month: i32,
}

impl TableRow for SongplayRow {
    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("start_time", DataType::Int64, true),
            Field::new("user_id", DataType::Utf8, true),
            Field::new("level", DataType::Utf8, true),
            Field::new("song_id", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("session_id", DataType::Int64, true),
            Field::new("location", DataType::Utf8, true),
            Field::new("user_agent", DataType::Utf8, true),
            Field::new("year", DataType::Int32, true),
            Field::new("month", DataType::Int32, true),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        RecordBatch::try_new(
            Self::schema(),
            vec![
                int64(rows, |r| Some(r.start_time)),
                utf8(rows, |r| r.user_id.as_deref()),
                utf8(rows, |r| r.level.as_deref()),
                utf8(rows, |r| r.song_id.as_deref()),
                utf8(rows, |r| r.artist_id.as_deref()),
                int64(rows, |r| r.session_id),
                utf8(rows, |r| r.location.as_deref()),
                utf8(rows, |r| r.user_agent.as_deref()),
                int32(rows, |r| Some(r.year)),
                int32(rows, |r| Some(r.month)),
            ],
        )
    }
}
