//! Transform semantics against a throwaway Postgres instance.

use integration_tests::containers::TestWarehouse;
use integration_tests::fixtures::{
    clear_staging, seed_event, seed_song, StagingEvent, StagingSong,
};
use warehouse::transform::run_transform;

#[tokio::test]
async fn user_insert_excludes_rows_without_user_id() {
    let dwh = TestWarehouse::start().await;
    let client = dwh.fresh_client().await;

    seed_event(
        &client,
        &StagingEvent {
            user_id: None,
            ..Default::default()
        },
    )
    .await;
    seed_event(&client, &StagingEvent::default()).await;

    run_transform(&client).await.unwrap();

    let rows = client
        .inner()
        .query("SELECT user_id FROM analytics.users", &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let user_id: i32 = rows[0].get(0);
    assert_eq!(user_id, 8);
}

#[tokio::test]
async fn user_upsert_overwrites_level_without_duplicating() {
    let dwh = TestWarehouse::start().await;
    let client = dwh.fresh_client().await;

    seed_event(
        &client,
        &StagingEvent {
            level: "free".to_string(),
            ..Default::default()
        },
    )
    .await;
    run_transform(&client).await.unwrap();

    // Same user comes back later as a paid subscriber.
    clear_staging(&client).await;
    seed_event(
        &client,
        &StagingEvent {
            level: "paid".to_string(),
            ts: 1541990000000,
            ..Default::default()
        },
    )
    .await;
    run_transform(&client).await.unwrap();

    let rows = client
        .inner()
        .query("SELECT user_id, level FROM analytics.users", &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1, "upsert must not duplicate the user");
    let level: String = rows[0].get(1);
    assert_eq!(level, "paid");
}

#[tokio::test]
async fn latest_staging_row_wins_within_one_run() {
    let dwh = TestWarehouse::start().await;
    let client = dwh.fresh_client().await;

    seed_event(
        &client,
        &StagingEvent {
            level: "free".to_string(),
            ts: 1541106673796,
            ..Default::default()
        },
    )
    .await;
    seed_event(
        &client,
        &StagingEvent {
            level: "paid".to_string(),
            ts: 1541990000000,
            ..Default::default()
        },
    )
    .await;

    run_transform(&client).await.unwrap();

    let row = client
        .inner()
        .query_one("SELECT level FROM analytics.users WHERE user_id = 8", &[])
        .await
        .unwrap();
    let level: String = row.get(0);
    assert_eq!(level, "paid");
}

#[tokio::test]
async fn artist_upsert_overwrites_name_in_place() {
    let dwh = TestWarehouse::start().await;
    let client = dwh.fresh_client().await;

    seed_song(&client, &StagingSong::default()).await;
    run_transform(&client).await.unwrap();

    clear_staging(&client).await;
    seed_song(
        &client,
        &StagingSong {
            artist_name: "Des'ree (remastered)".to_string(),
            year: 2004,
            ..Default::default()
        },
    )
    .await;
    run_transform(&client).await.unwrap();

    let rows = client
        .inner()
        .query("SELECT name FROM analytics.artists", &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let name: String = rows[0].get(0);
    assert_eq!(name, "Des'ree (remastered)");
}

#[tokio::test]
async fn fact_insert_keeps_only_completed_playbacks_and_fills_references() {
    let dwh = TestWarehouse::start().await;
    let client = dwh.fresh_client().await;

    let song = StagingSong::default();
    seed_song(&client, &song).await;

    // One completed playback matching the catalog, one page visit.
    seed_event(&client, &StagingEvent::default()).await;
    seed_event(
        &client,
        &StagingEvent {
            page: "Home".to_string(),
            song: None,
            ts: 1541106700000,
            ..Default::default()
        },
    )
    .await;

    run_transform(&client).await.unwrap();

    let rows = client
        .inner()
        .query(
            "SELECT start_time, user_id, song_id, artist_id
             FROM analytics.songplays",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1, "only the NextSong row becomes a fact");

    let user_id: i32 = rows[0].get(1);
    let song_id: String = rows[0].get(2);
    let artist_id: String = rows[0].get(3);
    assert_eq!(user_id, 8);
    assert_eq!(song_id, song.song_id);
    assert_eq!(artist_id, song.artist_id);

    // The referenced dimension rows all exist (the declared foreign keys
    // would have rejected the insert otherwise, this just spells it out).
    let time_rows = client
        .inner()
        .query("SELECT hour FROM analytics.time", &[])
        .await
        .unwrap();
    assert_eq!(time_rows.len(), 1);
}

#[tokio::test]
async fn unmatched_playbacks_produce_no_fact_row() {
    let dwh = TestWarehouse::start().await;
    let client = dwh.fresh_client().await;

    // No catalog row seeded, so the title join finds nothing.
    seed_event(&client, &StagingEvent::default()).await;
    run_transform(&client).await.unwrap();

    let count = client
        .inner()
        .query_one("SELECT COUNT(*) FROM analytics.songplays", &[])
        .await
        .unwrap();
    let count: i64 = count.get(0);
    assert_eq!(count, 0);
}

#[tokio::test]
async fn time_rows_are_distinct_per_timestamp() {
    let dwh = TestWarehouse::start().await;
    let client = dwh.fresh_client().await;

    // Two playbacks at the same millisecond, one at another.
    seed_event(&client, &StagingEvent::default()).await;
    seed_event(
        &client,
        &StagingEvent {
            session_id: 140,
            ..Default::default()
        },
    )
    .await;
    seed_event(
        &client,
        &StagingEvent {
            ts: 1541990000000,
            ..Default::default()
        },
    )
    .await;

    run_transform(&client).await.unwrap();

    let row = client
        .inner()
        .query_one("SELECT COUNT(*) FROM analytics.time", &[])
        .await
        .unwrap();
    let count: i64 = row.get(0);
    assert_eq!(count, 2);
}

#[tokio::test]
async fn rerunning_the_whole_transform_is_stable_for_dimensions() {
    let dwh = TestWarehouse::start().await;
    let client = dwh.fresh_client().await;

    seed_song(&client, &StagingSong::default()).await;
    seed_event(&client, &StagingEvent::default()).await;

    run_transform(&client).await.unwrap();
    run_transform(&client).await.unwrap();

    for table in ["users", "songs", "artists", "time"] {
        let row = client
            .inner()
            .query_one(&format!("SELECT COUNT(*) FROM analytics.{}", table), &[])
            .await
            .unwrap();
        let count: i64 = row.get(0);
        assert_eq!(count, 1, "{} grew on rerun", table);
    }

    // The fact table is append-only by design, so it does grow.
    let row = client
        .inner()
        .query_one("SELECT COUNT(*) FROM analytics.songplays", &[])
        .await
        .unwrap();
    let count: i64 = row.get(0);
    assert_eq!(count, 2);
}
