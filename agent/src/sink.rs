// Output sinks for completed laps: local JSON files or the backend API.
// Invariants: sinks receive fully formed, immutable records and never feed
// anything back into the ingestion pipeline.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info};

use gt7_telemetry_core::{Lap, TrackOutline};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("lap record i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("lap record serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("backend request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend rejected bearer token")]
    Unauthorized,
    #[error("backend returned status {status}")]
    Backend { status: u16 },
}

/// One unit of output: a full-telemetry lap or a positional track outline.
#[derive(Clone, Debug)]
pub enum LapRecord {
    Telemetry(Lap),
    Track(TrackOutline),
}

impl LapRecord {
    /// Stable record identifier, also used as the local file name. Lap
    /// files are keyed by lap time, as in `lap_01-31-205.json`.
    pub fn file_name(&self) -> String {
        match self {
            LapRecord::Telemetry(lap) => {
                let time = format_lap_time(lap.duration_ms.unwrap_or(0));
                if lap.partial {
                    format!("lap_{time}_partial.json")
                } else {
                    format!("lap_{time}.json")
                }
            }
            LapRecord::Track(outline) => {
                if outline.closed {
                    "track_outline.json".to_string()
                } else {
                    "track_outline_partial.json".to_string()
                }
            }
        }
    }

    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            LapRecord::Telemetry(lap) => serde_json::to_value(lap),
            LapRecord::Track(outline) => serde_json::to_value(outline),
        }
    }
}

/// Formats a lap time in milliseconds as MM-SS-MMM.
pub fn format_lap_time(lap_time_ms: i32) -> String {
    let total_ms = lap_time_ms.max(0);
    let seconds = total_ms / 1000;
    let ms = total_ms % 1000;
    let minutes = seconds / 60;
    let seconds = seconds % 60;
    format!("{minutes:02}-{seconds:02}-{ms:03}")
}

/// Boundary to the storage collaborator. `submit` must not block the
/// ingestion loop indefinitely; the writer task enforces that by consuming
/// records off a channel.
#[async_trait]
pub trait LapSink: Send + Sync {
    async fn submit(&self, record: &LapRecord) -> Result<(), SinkError>;
}

/// Writes each record as pretty-printed JSON under the laps directory.
pub struct LocalSink {
    dir: PathBuf,
}

impl LocalSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn unique_path(&self, file_name: &str) -> PathBuf {
        let path = self.dir.join(file_name);
        if !path.exists() {
            return path;
        }
        // Same lap time twice in one session; disambiguate by wall clock.
        let stem = file_name.trim_end_matches(".json");
        self.dir.join(format!("{stem}_{}.json", epoch_ms()))
    }
}

#[async_trait]
impl LapSink for LocalSink {
    async fn submit(&self, record: &LapRecord) -> Result<(), SinkError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.unique_path(&record.file_name());
        let body = serde_json::to_vec_pretty(&record.to_value()?)?;
        tokio::fs::write(&path, body).await?;
        info!(path = %path.display(), "lap record saved locally");
        Ok(())
    }
}

/// Uploads records to the backend with a bearer token.
pub struct RemoteSink {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RemoteSink {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Checks the bearer token against the lap listing endpoint before the
    /// session starts streaming.
    pub async fn validate_token(&self) -> Result<(), SinkError> {
        let resp = self
            .client
            .get(format!("{}/laps/", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check_status(resp.status())?;
        debug!("bearer token validated");
        Ok(())
    }

    /// Keeps the backend session alive while the agent runs.
    pub async fn session_heartbeat(&self) -> Result<(), SinkError> {
        let resp = self
            .client
            .post(format!("{}/session/heartbeat", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check_status(resp.status())?;
        debug!("backend session heartbeat ok");
        Ok(())
    }
}

#[async_trait]
impl LapSink for RemoteSink {
    async fn submit(&self, record: &LapRecord) -> Result<(), SinkError> {
        let payload = serde_json::json!({
            "lap_id": record.file_name(),
            "data": record.to_value()?,
        });
        let resp = self
            .client
            .post(format!("{}/laps", self.base_url))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        check_status(resp.status())?;
        info!(lap_id = %record.file_name(), "lap uploaded to backend");
        Ok(())
    }
}

fn check_status(status: StatusCode) -> Result<(), SinkError> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SinkError::Unauthorized),
        other => Err(SinkError::Backend {
            status: other.as_u16(),
        }),
    }
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
