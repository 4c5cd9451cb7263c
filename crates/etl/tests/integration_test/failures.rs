use sparkify_etl::tables::SONGS;
use sparkify_etl::{process_log_data, process_song_data, PipelineError};
use sparkify_storage::{StorageError, WriteMode};

use crate::helpers::{make_context, song_json, test_data_dir, write_json_lines};

#[tokio::test]
async fn test_malformed_record_fails_with_line() {
    let dir = test_data_dir();
    let path = dir.join("input/song_data/A/B/C/bad.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let good = song_json("S1", "X", "A1", "Band", 2000, 1.0).to_string();
    std::fs::write(&path, format!("{good}\n{{\"song_id\": \"S2\", \"duration\": \n")).unwrap();

    let ctx = make_context(&dir);
    let err = process_song_data(&ctx).await.unwrap_err();
    match err {
        PipelineError::SourceRead {
            source: StorageError::MalformedRecord { key, line, .. },
            ..
        } => {
            assert!(key.ends_with("bad.json"), "{key}");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.join("output/songs").exists());
}

#[tokio::test]
async fn test_missing_log_source_fails() {
    let dir = test_data_dir();
    write_json_lines(
        &dir,
        "song_data/A/B/C/one.json",
        &[song_json("S1", "X", "A1", "Band", 2000, 1.0)],
    );

    let ctx = make_context(&dir);
    process_song_data(&ctx).await.unwrap();
    let err = process_log_data(&ctx).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::SourceRead {
            source: StorageError::NoMatchingFiles { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_files_at_wrong_depth_are_not_sources() {
    let dir = test_data_dir();
    write_json_lines(
        &dir,
        "song_data/A/B/shallow.json",
        &[song_json("S1", "X", "A1", "Band", 2000, 1.0)],
    );

    let ctx = make_context(&dir);
    let err = process_song_data(&ctx).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::SourceRead {
            source: StorageError::NoMatchingFiles { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_failed_rerun_keeps_previous_tables() {
    let dir = test_data_dir();
    write_json_lines(
        &dir,
        "song_data/A/B/C/one.json",
        &[song_json("S1", "X", "A1", "Band", 2000, 1.0)],
    );
    let ctx = make_context(&dir);
    process_song_data(&ctx).await.unwrap();

    std::fs::write(dir.join("input/song_data/A/B/C/two.json"), "not json\n").unwrap();
    assert!(process_song_data(&ctx).await.is_err());

    let songs = ctx.reader.read(SONGS.destination, (SONGS.schema)()).await.unwrap();
    assert_eq!(songs.num_rows(), 1);
}

#[tokio::test]
async fn test_unwritable_output_fails_write() {
    let dir = test_data_dir();
    write_json_lines(
        &dir,
        "song_data/A/B/C/one.json",
        &[song_json("S1", "X", "A1", "Band", 2000, 1.0)],
    );
    // The output root is a regular file, so no table directory can be made.
    std::fs::write(dir.join("output"), "occupied").unwrap();

    let ctx = make_context(&dir);
    let err = process_song_data(&ctx).await.unwrap_err();
    match err {
        PipelineError::Write {
            table,
            source: StorageError::Io(_),
        } => assert_eq!(table, "songs"),
        other => panic!("unexpected error: {other}"),
    }

    let hidden = std::fs::read_dir(&dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
        .count();
    assert_eq!(hidden, 0);
    assert!(dir.join("output").is_file());
}

#[tokio::test]
async fn test_no_overwrite_refuses_existing_tables() {
    let dir = test_data_dir();
    write_json_lines(
        &dir,
        "song_data/A/B/C/one.json",
        &[song_json("S1", "X", "A1", "Band", 2000, 1.0)],
    );

    let ctx = make_context(&dir).with_write_mode(WriteMode::ErrorIfExists);
    process_song_data(&ctx).await.unwrap();

    let err = process_song_data(&ctx).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Write {
            table: "songs",
            source: StorageError::DestinationExists(_),
        }
    ));

    let songs = ctx.reader.read(SONGS.destination, (SONGS.schema)()).await.unwrap();
    assert_eq!(songs.num_rows(), 1);
}
