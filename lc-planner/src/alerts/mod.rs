//! Service alerts.
//!
//! Routes are annotated with alerts published for the trips and routes they
//! use. Alerts are looked up by URI: a trip URI yields trip alerts, a route
//! URI yields vehicle alerts.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::Message;

/// Supplies alerts for a trip or route URI.
pub trait AlertsProvider: Send + Sync {
    /// Alerts published for `uri`, in publication order. Unknown URIs have
    /// no alerts.
    fn alerts_for(&self, uri: &str) -> impl Future<Output = Vec<Message>> + Send;
}

/// Provider with nothing to report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAlerts;

impl AlertsProvider for NoAlerts {
    async fn alerts_for(&self, _uri: &str) -> Vec<Message> {
        Vec::new()
    }
}

/// Errors loading an alerts file.
#[derive(Debug, thiserror::Error)]
pub enum AlertsError {
    #[error("failed to read alerts file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse alerts file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct AlertFile {
    alerts: Vec<AlertRecord>,
}

#[derive(Debug, Deserialize)]
struct AlertRecord {
    uri: String,
    header: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    lead: String,
    #[serde(default)]
    link: Option<String>,
}

impl From<AlertRecord> for Message {
    fn from(record: AlertRecord) -> Self {
        Message {
            header: record.header,
            description: record.description,
            lead: record.lead,
            link: record.link,
        }
    }
}

fn parse_alerts(json: &str) -> Result<HashMap<String, Vec<Message>>, AlertsError> {
    let file: AlertFile = serde_json::from_str(json)?;
    let mut map: HashMap<String, Vec<Message>> = HashMap::new();
    for record in file.alerts {
        map.entry(record.uri.clone())
            .or_default()
            .push(Message::from(record));
    }
    Ok(map)
}

/// Thread-safe in-memory alert board.
///
/// Cloning shares the board, so alerts posted through one handle are seen by
/// every planner holding another.
#[derive(Debug, Clone, Default)]
pub struct AlertBoard {
    inner: Arc<RwLock<HashMap<String, Vec<Message>>>>,
}

impl AlertBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from a JSON document of the form
    /// `{"alerts": [{"uri": ..., "header": ..., "description": ...}]}`.
    pub fn from_json(json: &str) -> Result<Self, AlertsError> {
        Ok(Self {
            inner: Arc::new(RwLock::new(parse_alerts(json)?)),
        })
    }

    /// Load a board from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AlertsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let board = Self::from_json(&json)?;
        info!(path = %path.display(), "loaded alerts");
        Ok(board)
    }

    /// Replace every alert with the contents of a JSON file, returning the
    /// number of URIs with alerts. On error the board is left unchanged.
    pub async fn reload(&self, path: impl AsRef<Path>) -> Result<usize, AlertsError> {
        let json = std::fs::read_to_string(path)?;
        let map = parse_alerts(&json)?;
        let count = map.len();
        *self.inner.write().await = map;
        Ok(count)
    }

    /// Post an alert for a URI.
    pub async fn insert(&self, uri: impl Into<String>, message: Message) {
        let mut guard = self.inner.write().await;
        guard.entry(uri.into()).or_default().push(message);
    }

    /// Remove all alerts for a URI, returning how many were removed.
    pub async fn clear(&self, uri: &str) -> usize {
        let mut guard = self.inner.write().await;
        guard.remove(uri).map_or(0, |messages| messages.len())
    }

    /// Number of URIs with alerts.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the board is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl AlertsProvider for AlertBoard {
    async fn alerts_for(&self, uri: &str) -> Vec<Message> {
        let guard = self.inner.read().await;
        guard.get(uri).cloned().unwrap_or_default()
    }
}
