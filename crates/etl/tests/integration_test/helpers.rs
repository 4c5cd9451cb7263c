use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use serde_json::{json, Value};
use uuid::Uuid;

use sparkify_core::LakeConfig;
use sparkify_etl::LakeContext;

/// Create a unique temp directory for each test.
pub fn test_data_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sparkify-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Context reading from `<dir>/input` and writing to `<dir>/output`.
pub fn make_context(dir: &Path) -> LakeContext {
    let mut config = LakeConfig::for_profile("");
    config.paths.input_root = dir.join("input").to_string_lossy().into_owned();
    config.paths.output_root = dir.join("output").to_string_lossy().into_owned();
    LakeContext::from_config(config).unwrap()
}

/// Write `records` as JSON lines to `<dir>/input/<rel>`.
pub fn write_json_lines(dir: &Path, rel: &str, records: &[Value]) {
    let path = dir.join("input").join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body: Vec<String> = records.iter().map(|r| r.to_string()).collect();
    std::fs::write(path, body.join("\n")).unwrap();
}

pub fn song_json(song_id: &str, title: &str, artist_id: &str, artist_name: &str, year: i64, duration: f64) -> Value {
    json!({
        "num_songs": 1,
        "song_id": song_id,
        "title": title,
        "artist_id": artist_id,
        "artist_name": artist_name,
        "artist_location": "",
        "artist_latitude": null,
        "artist_longitude": null,
        "year": year,
        "duration": duration,
    })
}

pub fn event_json(page: &str, user_id: &str, level: &str, song: &str, artist: &str, length: f64, ts: i64) -> Value {
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": "A",
        "gender": "F",
        "itemInSession": 0,
        "lastName": "B",
        "length": length,
        "level": level,
        "location": "",
        "method": "PUT",
        "page": page,
        "registration": 1540344794796.0,
        "sessionId": 1,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "",
        "userId": user_id,
    })
}

/// Every row rendered as one string, sorted, for order-insensitive
/// comparison of table contents.
pub fn sorted_rows(batch: &RecordBatch) -> Vec<String> {
    let mut rows: Vec<String> = (0..batch.num_rows())
        .map(|row| {
            batch
                .columns()
                .iter()
                .map(|column| array_value_to_string(column, row).unwrap())
                .collect::<Vec<_>>()
                .join("|")
        })
        .collect();
    rows.sort();
    rows
}

/// Values of a string column, in batch order.
pub fn string_column(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    use arrow::array::{Array, StringArray};

    let column = batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    (0..column.len())
        .map(|i| (!column.is_null(i)).then(|| column.value(i).to_string()))
        .collect()
}
