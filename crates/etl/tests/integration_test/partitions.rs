use sparkify_etl::process_song_data;
use sparkify_etl::tables::{ARTISTS, SONGS};

use crate::helpers::{make_context, song_json, sorted_rows, string_column, test_data_dir, write_json_lines};

#[tokio::test]
async fn test_songs_partition_layout() {
    let dir = test_data_dir();
    write_json_lines(
        &dir,
        "song_data/A/R/1/AR123.json",
        &[
            song_json("SO1", "First", "AR123", "Band", 2001, 100.0),
            song_json("SO2", "Second", "AR123", "Band", 2001, 200.0),
            song_json("SO3", "Third", "AR123", "Band", 2002, 300.0),
            song_json("SO4", "Fourth", "AR 9/x", "Odd", 2001, 400.0),
        ],
    );

    let ctx = make_context(&dir);
    process_song_data(&ctx).await.unwrap();

    let songs_dir = dir.join("output/songs");
    assert!(songs_dir.join("year=2001/artist_id=AR123").is_dir());
    assert!(songs_dir.join("year=2002/artist_id=AR123").is_dir());
    // '/' is escaped so the value stays one directory level.
    assert!(songs_dir.join("year=2001/artist_id=AR 9%2Fx").is_dir());

    // Partition columns live in the path, not in the files, and come back
    // on read with no loss or duplication.
    let songs = ctx.reader.read(SONGS.destination, (SONGS.schema)()).await.unwrap();
    assert_eq!(songs.num_rows(), 4);
    let rows = sorted_rows(&songs);
    assert!(rows[0].starts_with("SO1|First|AR123|2001|"), "{}", rows[0]);
    assert!(rows[3].starts_with("SO4|Fourth|AR 9/x|2001|"), "{}", rows[3]);

    // No staging or trash directories are left behind.
    let leftovers: Vec<_> = std::fs::read_dir(dir.join("output"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_null_partition_value_round_trips() {
    let dir = test_data_dir();
    let mut song = song_json("SO9", "Nameless", "AR1", "Band", 1990, 1.0);
    song["year"] = serde_json::Value::Null;
    write_json_lines(&dir, "song_data/A/B/C/nameless.json", &[song]);

    let ctx = make_context(&dir);
    process_song_data(&ctx).await.unwrap();

    assert!(dir
        .join("output/songs/year=__HIVE_DEFAULT_PARTITION__/artist_id=AR1")
        .is_dir());
    let songs = ctx.reader.read(SONGS.destination, (SONGS.schema)()).await.unwrap();
    assert_eq!(songs.num_rows(), 1);
    assert_eq!(songs.column_by_name("year").unwrap().null_count(), 1);

    let artists = ctx.reader.read(ARTISTS.destination, (ARTISTS.schema)()).await.unwrap();
    assert_eq!(string_column(&artists, "artist_id"), vec![Some("AR1".to_string())]);
}
