use arrow::array::{Array, Int32Array, Int64Array};

use sparkify_etl::tables::{SONGPLAYS, TIME, USERS};
use sparkify_etl::{process_log_data, process_song_data};

use crate::helpers::{event_json, make_context, song_json, string_column, test_data_dir, write_json_lines};

#[tokio::test]
async fn test_single_play_end_to_end() {
    let dir = test_data_dir();
    write_json_lines(
        &dir,
        "song_data/A/B/C/TRABCEI128F424C983.json",
        &[song_json("S1", "X", "A1", "Band", 2000, 210.5)],
    );
    write_json_lines(
        &dir,
        "log_data/2018/11/2018-11-12-events.json",
        &[event_json("Next Song", "10", "free", "X", "Band", 210.5, 1541990258796)],
    );

    let ctx = make_context(&dir);
    let songs = process_song_data(&ctx).await.unwrap();
    assert_eq!(songs.records_read, 1);
    assert_eq!(songs.songs.rows, 1);
    assert_eq!(songs.artists.rows, 1);

    let logs = process_log_data(&ctx).await.unwrap();
    assert_eq!(logs.song_plays, 1);
    assert_eq!(logs.songplays.rows, 1);

    let songplays = ctx
        .reader
        .read(SONGPLAYS.destination, (SONGPLAYS.schema)())
        .await
        .unwrap();
    assert_eq!(songplays.num_rows(), 1);
    assert_eq!(string_column(&songplays, "song_id"), vec![Some("S1".to_string())]);
    assert_eq!(string_column(&songplays, "artist_id"), vec![Some("A1".to_string())]);
    assert_eq!(string_column(&songplays, "user_id"), vec![Some("10".to_string())]);

    let start_time = songplays
        .column_by_name("start_time")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(start_time.value(0), 1541990258);

    // Partitioned by the play's year and month.
    let out = dir.join("output");
    assert!(out.join("songplays/year=2018/month=11").is_dir());
    assert!(out.join("time/year=2018/month=11").is_dir());
    assert!(out.join("artists.parquet").is_dir());

    let time = ctx.reader.read(TIME.destination, (TIME.schema)()).await.unwrap();
    assert_eq!(time.num_rows(), 1);
    let int32 = |name: &str| {
        time.column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<Int32Array>()
            .unwrap()
            .value(0)
    };
    assert_eq!(int32("hour"), 2);
    assert_eq!(int32("day"), 12);
    assert_eq!(int32("week"), 46);
    assert_eq!(int32("month"), 11);
    assert_eq!(int32("year"), 2018);
    assert_eq!(int32("weekday"), 2);

    let users = ctx.reader.read(USERS.destination, (USERS.schema)()).await.unwrap();
    assert_eq!(string_column(&users, "first_name"), vec![Some("A".to_string())]);
    assert_eq!(users.column_by_name("level").unwrap().null_count(), 0);
}
