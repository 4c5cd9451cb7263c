use std::collections::HashSet;

use sparkify_etl::tables::{ARTISTS, SONGPLAYS, SONGS, TIME, USERS};
use sparkify_etl::{process_log_data, process_song_data, verify_outputs};

use crate::helpers::{event_json, make_context, song_json, sorted_rows, string_column, test_data_dir, write_json_lines};

fn seed(dir: &std::path::Path) {
    write_json_lines(
        dir,
        "song_data/A/A/A/one.json",
        &[
            song_json("S1", "X", "A1", "Band", 2000, 210.5),
            song_json("S2", "Y", "A1", "Band", 2001, 180.0),
        ],
    );
    write_json_lines(
        dir,
        "song_data/A/A/B/two.json",
        &[
            // Same song again, with a different year: one row survives.
            song_json("S1", "X", "A1", "Band", 1999, 210.5),
            song_json("S3", "Z", "A2", "Other", 0, 95.25),
        ],
    );
    write_json_lines(
        dir,
        "log_data/2018/11/events.json",
        &[
            event_json("Home", "7", "free", "X", "Band", 210.5, 1541990000000),
            event_json("Next Song", "10", "free", "X", "Band", 210.5, 1541990258796),
            event_json("Next Song", "10", "paid", "Y", "Band", 180.0, 1541990258900),
            event_json("Next Song", "11", "free", "Y", "Band", 180.000001, 1541990300000),
            event_json("Logout", "12", "free", "Z", "Other", 95.25, 1541990400000),
        ],
    );
}

#[tokio::test]
async fn test_dimension_keys_unique() {
    let dir = test_data_dir();
    seed(&dir);
    let ctx = make_context(&dir);
    process_song_data(&ctx).await.unwrap();
    process_log_data(&ctx).await.unwrap();

    let checks = verify_outputs(&ctx).await.unwrap();
    assert_eq!(checks.len(), 5);
    assert!(checks.iter().all(|c| c.is_clean()), "{checks:?}");

    let songs = ctx.reader.read(SONGS.destination, (SONGS.schema)()).await.unwrap();
    assert_eq!(songs.num_rows(), 3);
    let artists = ctx.reader.read(ARTISTS.destination, (ARTISTS.schema)()).await.unwrap();
    assert_eq!(artists.num_rows(), 2);
}

#[tokio::test]
async fn test_only_song_plays_reach_log_tables() {
    let dir = test_data_dir();
    seed(&dir);
    let ctx = make_context(&dir);
    process_song_data(&ctx).await.unwrap();
    let summary = process_log_data(&ctx).await.unwrap();
    assert_eq!(summary.events_read, 5);
    assert_eq!(summary.song_plays, 3);

    // Users 7 and 12 never played a song.
    let users = ctx.reader.read(USERS.destination, (USERS.schema)()).await.unwrap();
    let ids: HashSet<_> = string_column(&users, "user_id").into_iter().flatten().collect();
    assert_eq!(ids, HashSet::from(["10".to_string(), "11".to_string()]));

    // Two plays share second 1541990258.
    let time = ctx.reader.read(TIME.destination, (TIME.schema)()).await.unwrap();
    assert_eq!(time.num_rows(), 2);
}

#[tokio::test]
async fn test_songplays_need_exact_match() {
    let dir = test_data_dir();
    seed(&dir);
    let ctx = make_context(&dir);
    process_song_data(&ctx).await.unwrap();
    process_log_data(&ctx).await.unwrap();

    // The S1 entry appears twice in the catalog, so its play joins twice.
    // User 11's length is off by 1e-6 and finds nothing.
    let songplays = ctx.reader.read(SONGPLAYS.destination, (SONGPLAYS.schema)()).await.unwrap();
    let mut pairs: Vec<_> = string_column(&songplays, "song_id")
        .into_iter()
        .zip(string_column(&songplays, "user_id"))
        .collect();
    pairs.sort();
    assert_eq!(
        pairs,
        vec![
            (Some("S1".to_string()), Some("10".to_string())),
            (Some("S1".to_string()), Some("10".to_string())),
            (Some("S2".to_string()), Some("10".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_rerun_gives_same_tables() {
    let dir = test_data_dir();
    seed(&dir);
    let ctx = make_context(&dir);

    let mut first = Vec::new();
    process_song_data(&ctx).await.unwrap();
    process_log_data(&ctx).await.unwrap();
    for spec in [SONGS, ARTISTS, USERS, TIME, SONGPLAYS] {
        let batch = ctx.reader.read(spec.destination, (spec.schema)()).await.unwrap();
        first.push(sorted_rows(&batch));
    }

    process_song_data(&ctx).await.unwrap();
    process_log_data(&ctx).await.unwrap();
    for (i, spec) in [SONGS, ARTISTS, USERS, TIME, SONGPLAYS].into_iter().enumerate() {
        let batch = ctx.reader.read(spec.destination, (spec.schema)()).await.unwrap();
        assert_eq!(sorted_rows(&batch), first[i], "{}", spec.name);
    }

    // Overwrite leaves exactly one file per songs partition.
    let leaf = dir.join("output/songs/year=2000/artist_id=A1");
    let files: Vec<_> = std::fs::read_dir(leaf).unwrap().collect();
    assert_eq!(files.len(), 1);
}
