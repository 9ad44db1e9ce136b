//! Staging-to-star transform statements.
//!
//! Five statements, run in dependency order and each committing on its own:
//! a failure leaves earlier statements applied, and the run is simply
//! restarted from the top (the schema is rebuilt every run anyway).

use crate::client::WarehouseClient;
use etl_core::Result;
use tracing::info;

/// Users, latest staging row per user id wins; the subscription `level`
/// (and display names) are overwritten on conflict.
pub const INSERT_USERS: &str = r#"
INSERT INTO analytics.users (user_id, first_name, last_name, gender, level)
SELECT DISTINCT ON (user_id)
       user_id, first_name, last_name, gender, level
FROM analytics.staging_events
WHERE user_id IS NOT NULL
ORDER BY user_id, ts DESC
ON CONFLICT (user_id) DO UPDATE SET
    first_name = EXCLUDED.first_name,
    last_name  = EXCLUDED.last_name,
    gender     = EXCLUDED.gender,
    level      = EXCLUDED.level
"#;

/// Artists, deduplicated per artist id; name and location overwritten on
/// conflict.
pub const INSERT_ARTISTS: &str = r#"
INSERT INTO analytics.artists (artist_id, name, location, latitude, longitude)
SELECT DISTINCT ON (artist_id)
       artist_id, artist_name, artist_location, artist_latitude, artist_longitude
FROM analytics.staging_songs
WHERE artist_id IS NOT NULL
ORDER BY artist_id, year DESC
ON CONFLICT (artist_id) DO UPDATE SET
    name      = EXCLUDED.name,
    location  = EXCLUDED.location,
    latitude  = EXCLUDED.latitude,
    longitude = EXCLUDED.longitude
"#;

/// Songs, deduplicated per song id.
pub const INSERT_SONGS: &str = r#"
INSERT INTO analytics.songs (song_id, title, artist_id, year, duration)
SELECT DISTINCT ON (song_id)
       song_id, title, artist_id, year, duration
FROM analytics.staging_songs
WHERE song_id IS NOT NULL
ON CONFLICT (song_id) DO UPDATE SET
    title     = EXCLUDED.title,
    artist_id = EXCLUDED.artist_id,
    year      = EXCLUDED.year,
    duration  = EXCLUDED.duration
"#;

/// Time dimension: one row per distinct timestamp of a completed playback,
/// decomposed into calendar parts. Epoch millis in staging become a plain
/// UTC timestamp here.
pub const INSERT_TIME: &str = r#"
INSERT INTO analytics.time (start_time, hour, day, week, month, year, weekday)
SELECT start_time,
       EXTRACT(HOUR FROM start_time)::INT,
       EXTRACT(DAY FROM start_time)::INT,
       EXTRACT(WEEK FROM start_time)::INT,
       EXTRACT(MONTH FROM start_time)::INT,
       EXTRACT(YEAR FROM start_time)::INT,
       EXTRACT(DOW FROM start_time)::INT
FROM (
    SELECT DISTINCT to_timestamp(ts / 1000.0) AT TIME ZONE 'UTC' AS start_time
    FROM analytics.staging_events
    WHERE page = 'NextSong' AND ts IS NOT NULL
) AS event_times
ON CONFLICT (start_time) DO NOTHING
"#;

/// Songplay facts: completed playbacks only, matched to the catalog by song
/// title. Append-only, no conflict target.
pub const INSERT_SONGPLAYS: &str = r#"
INSERT INTO analytics.songplays
    (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT to_timestamp(se.ts / 1000.0) AT TIME ZONE 'UTC',
       se.user_id,
       se.level,
       ss.song_id,
       ss.artist_id,
       se.session_id,
       se.location,
       se.user_agent
FROM analytics.staging_events se
JOIN analytics.staging_songs ss ON se.song = ss.title
WHERE se.page = 'NextSong'
  AND se.user_id IS NOT NULL
  AND se.ts IS NOT NULL
"#;

/// Completed-playback marker in the activity log.
pub const COMPLETED_PLAYBACK_PAGE: &str = "NextSong";

/// Transform statements in dependency order: dimensions first so the fact
/// insert's references resolve.
pub fn transform_statements() -> Vec<(&'static str, &'static str)> {
    vec![
        ("insert users", INSERT_USERS),
        ("insert artists", INSERT_ARTISTS),
        ("insert songs", INSERT_SONGS),
        ("insert time", INSERT_TIME),
        ("insert songplays", INSERT_SONGPLAYS),
    ]
}

/// Populate the dimension and fact tables from the staging tables.
pub async fn run_transform(client: &WarehouseClient) -> Result<()> {
    for (name, sql) in transform_statements() {
        let rows = client.execute_named(name, sql).await?;
        info!(statement = name, rows, "Transform statement applied");
    }
    Ok(())
}
