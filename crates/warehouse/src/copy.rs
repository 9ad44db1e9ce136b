//! Bulk COPY statements for the staging tables.
//!
//! COPY has no parameter binding for its source path or credentials, so the
//! statement text is rendered by a typed builder that quotes its values,
//! rather than assembled ad hoc at the call sites.

use crate::client::WarehouseClient;
use etl_core::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Object-store locations of the two source datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Prefix of the user-activity log files
    #[serde(default = "default_event_data")]
    pub event_data: String,
    /// Prefix of the song-catalog files
    #[serde(default = "default_song_data")]
    pub song_data: String,
    /// Path-mapping file describing the activity log layout
    #[serde(default = "default_event_json_paths")]
    pub event_json_paths: String,
    /// Region the source bucket lives in
    #[serde(default = "default_source_region")]
    pub region: String,
}

fn default_event_data() -> String {
    "s3://udacity-dend/log_data".to_string()
}

fn default_song_data() -> String {
    "s3://udacity-dend/song_data".to_string()
}

fn default_event_json_paths() -> String {
    "s3://udacity-dend/log_json_path.json".to_string()
}

fn default_source_region() -> String {
    "us-west-2".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            event_data: default_event_data(),
            song_data: default_song_data(),
            event_json_paths: default_event_json_paths(),
            region: default_source_region(),
        }
    }
}

/// JSON layout handling for a COPY.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonFormat {
    /// Let the database map fields to columns by name.
    Auto,
    /// Explicit path-mapping file.
    Paths(String),
}

/// A single bulk-load statement.
#[derive(Debug, Clone)]
pub struct CopyStatement {
    table: &'static str,
    source: String,
    role_arn: String,
    format: JsonFormat,
    region: String,
}

impl CopyStatement {
    pub fn new(
        table: &'static str,
        source: impl Into<String>,
        role_arn: impl Into<String>,
    ) -> Self {
        Self {
            table,
            source: source.into(),
            role_arn: role_arn.into(),
            format: JsonFormat::Auto,
            region: default_source_region(),
        }
    }

    pub fn with_json_paths(mut self, paths: impl Into<String>) -> Self {
        self.format = JsonFormat::Paths(paths.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Render the COPY statement text.
    pub fn render(&self) -> String {
        let format = match &self.format {
            JsonFormat::Auto => "JSON 'auto'".to_string(),
            JsonFormat::Paths(paths) => format!("JSON {}", quote_literal(paths)),
        };

        format!(
            "COPY analytics.{table}\nFROM {source}\nIAM_ROLE {role}\nFORMAT AS {format}\nREGION {region}\nCOMPUPDATE OFF",
            table = self.table,
            source = quote_literal(&self.source),
            role = quote_literal(&self.role_arn),
            format = format,
            region = quote_literal(&self.region),
        )
    }
}

/// Single-quote a literal, doubling embedded quotes.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// The two staging loads for a run.
pub fn staging_copies(sources: &SourceConfig, role_arn: &str) -> Vec<(&'static str, CopyStatement)> {
    vec![
        (
            "copy staging_events",
            CopyStatement::new("staging_events", &sources.event_data, role_arn)
                .with_json_paths(&sources.event_json_paths)
                .with_region(&sources.region),
        ),
        (
            "copy staging_songs",
            CopyStatement::new("staging_songs", &sources.song_data, role_arn)
                .with_region(&sources.region),
        ),
    ]
}

/// Bulk-load both staging tables from object storage.
pub async fn load_staging(
    client: &WarehouseClient,
    sources: &SourceConfig,
    role_arn: &str,
) -> Result<()> {
    for (name, statement) in staging_copies(sources, role_arn) {
        info!(statement = name, source = %statement.source, "Bulk loading");
        // Simple-query protocol: COPY from object storage cannot be prepared.
        client.batch_execute(name, &statement.render()).await?;
        info!(statement = name, "Bulk load complete");
    }
    Ok(())
}
