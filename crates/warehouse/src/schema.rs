//! Star-schema table definitions.
//!
//! Seven tables: two staging tables mirroring the raw source-file shapes,
//! four dimensions (users, songs, artists, time) and one append-only fact
//! (songplays). Staging and final tables are all dropped and recreated on
//! every run; this is a full rebuild, not a migration.

use crate::client::WarehouseClient;
use etl_core::Result;
use tracing::{debug, info};

/// Schema holding every table.
pub const SCHEMA_NAME: &str = "analytics";

/// SQL for creating the schema.
pub const CREATE_SCHEMA: &str = "CREATE SCHEMA IF NOT EXISTS analytics";

/// Raw user-activity log lines, one row per event. `ts` is epoch millis.
pub const CREATE_STAGING_EVENTS: &str = r#"
CREATE TABLE IF NOT EXISTS analytics.staging_events (
    artist          TEXT,
    auth            TEXT,
    first_name      TEXT,
    gender          TEXT,
    item_in_session INT,
    last_name       TEXT,
    length          DOUBLE PRECISION,
    level           TEXT,
    location        TEXT,
    method          TEXT,
    page            TEXT,
    registration    BIGINT,
    session_id      INT,
    song            TEXT,
    status          INT,
    ts              BIGINT,
    user_agent      TEXT,
    user_id         INT
)
"#;

/// Raw song-catalog entries, one row per song file.
pub const CREATE_STAGING_SONGS: &str = r#"
CREATE TABLE IF NOT EXISTS analytics.staging_songs (
    num_songs        INT,
    artist_id        TEXT,
    artist_latitude  DOUBLE PRECISION,
    artist_longitude DOUBLE PRECISION,
    artist_location  TEXT,
    artist_name      TEXT,
    song_id          TEXT,
    title            TEXT,
    duration         DOUBLE PRECISION,
    year             INT
)
"#;

/// User dimension, keyed by the natural user id. `level` is the mutable
/// subscription attribute overwritten on conflict.
pub const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS analytics.users (
    user_id    INT PRIMARY KEY,
    first_name TEXT,
    last_name  TEXT,
    gender     TEXT,
    level      TEXT NOT NULL
)
"#;

/// Song dimension.
pub const CREATE_SONGS: &str = r#"
CREATE TABLE IF NOT EXISTS analytics.songs (
    song_id   TEXT PRIMARY KEY,
    title     TEXT NOT NULL,
    artist_id TEXT NOT NULL,
    year      INT,
    duration  DOUBLE PRECISION
)
"#;

/// Artist dimension.
pub const CREATE_ARTISTS: &str = r#"
CREATE TABLE IF NOT EXISTS analytics.artists (
    artist_id TEXT PRIMARY KEY,
    name      TEXT NOT NULL,
    location  TEXT,
    latitude  DOUBLE PRECISION,
    longitude DOUBLE PRECISION
)
"#;

/// Time dimension, one row per distinct event timestamp, decomposed into
/// calendar parts.
pub const CREATE_TIME: &str = r#"
CREATE TABLE IF NOT EXISTS analytics.time (
    start_time TIMESTAMP PRIMARY KEY,
    hour       INT NOT NULL,
    day        INT NOT NULL,
    week       INT NOT NULL,
    month      INT NOT NULL,
    year       INT NOT NULL,
    weekday    INT NOT NULL
)
"#;

/// Songplay fact table, append-only. Every row must reference existing
/// dimension rows, so the four references are declared; the transform load
/// order makes them satisfiable.
pub const CREATE_SONGPLAYS: &str = r#"
CREATE TABLE IF NOT EXISTS analytics.songplays (
    songplay_id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    start_time  TIMESTAMP NOT NULL REFERENCES analytics.time (start_time),
    user_id     INT NOT NULL REFERENCES analytics.users (user_id),
    level       TEXT,
    song_id     TEXT REFERENCES analytics.songs (song_id),
    artist_id   TEXT REFERENCES analytics.artists (artist_id),
    session_id  INT,
    location    TEXT,
    user_agent  TEXT
)
"#;

/// Every table name, staging first.
pub const ALL_TABLES: &[&str] = &[
    "staging_events",
    "staging_songs",
    "users",
    "songs",
    "artists",
    "time",
    "songplays",
];

/// Ordered create statements: schema, staging, dimensions, then the fact
/// table (its foreign keys need the dimensions in place).
pub fn create_statements() -> Vec<(&'static str, &'static str)> {
    vec![
        ("create schema", CREATE_SCHEMA),
        ("create staging_events", CREATE_STAGING_EVENTS),
        ("create staging_songs", CREATE_STAGING_SONGS),
        ("create users", CREATE_USERS),
        ("create songs", CREATE_SONGS),
        ("create artists", CREATE_ARTISTS),
        ("create time", CREATE_TIME),
        ("create songplays", CREATE_SONGPLAYS),
    ]
}

/// Ordered drop statements: the fact table goes first so its foreign keys
/// never dangle mid-drop.
pub fn drop_statements() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "drop songplays",
            "DROP TABLE IF EXISTS analytics.songplays",
        ),
        ("drop users", "DROP TABLE IF EXISTS analytics.users"),
        ("drop songs", "DROP TABLE IF EXISTS analytics.songs"),
        ("drop artists", "DROP TABLE IF EXISTS analytics.artists"),
        ("drop time", "DROP TABLE IF EXISTS analytics.time"),
        (
            "drop staging_events",
            "DROP TABLE IF EXISTS analytics.staging_events",
        ),
        (
            "drop staging_songs",
            "DROP TABLE IF EXISTS analytics.staging_songs",
        ),
    ]
}

/// Create the schema and all seven tables.
pub async fn init_schema(client: &WarehouseClient) -> Result<()> {
    for (name, sql) in create_statements() {
        debug!(statement = name, "Executing DDL");
        client.batch_execute(name, sql).await?;
    }
    info!("Warehouse schema created");
    Ok(())
}

/// Drop all seven tables if present.
pub async fn drop_schema(client: &WarehouseClient) -> Result<()> {
    for (name, sql) in drop_statements() {
        debug!(statement = name, "Executing DDL");
        client.batch_execute(name, sql).await?;
    }
    info!("Warehouse schema dropped");
    Ok(())
}
