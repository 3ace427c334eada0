use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::model::MapData;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Network(String),
    #[error("server answered HTTP {0}")]
    Status(u16),
    #[error("invalid location data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the location document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Http(String),
}

impl DataSource {
    /// `http://` and `https://` values are URLs, anything else is a path.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.starts_with("http://") || value.starts_with("https://") {
            DataSource::Http(value.to_string())
        } else {
            DataSource::File(PathBuf::from(value))
        }
    }

    /// Performs the single fetch and parses the document.
    pub async fn load(&self) -> Result<MapData, LoadError> {
        let bytes = match self {
            DataSource::File(path) => tokio::fs::read(path).await.map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?,
            DataSource::Http(url) => fetch_bytes(url).await?,
        };
        Ok(MapData::from_json_slice(&bytes)?)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Http(url) => f.write_str(url),
        }
    }
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, LoadError> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| LoadError::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(LoadError::Status(response.status().as_u16()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| LoadError::Network(e.to_string()))?;
    Ok(bytes.to_vec())
}

#[derive(Debug, Clone)]
pub enum LoadState {
    NotLoaded,
    Loaded {
        data: Arc<MapData>,
        loaded_at: DateTime<Utc>,
    },
    Failed(String),
}

/// Proof that a load was started for a particular mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Holds the loaded dataset for the current mount.
///
/// Every mount and unmount bumps `generation`; a result carrying an older
/// ticket belongs to a view that no longer exists and is dropped.
#[derive(Debug)]
pub struct LocationStore {
    source: DataSource,
    state: LoadState,
    generation: u64,
    mounted: bool,
}

impl LocationStore {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            state: LoadState::NotLoaded,
            generation: 0,
            mounted: false,
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn data(&self) -> Option<&Arc<MapData>> {
        match &self.state {
            LoadState::Loaded { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Starts a new mount: any previous data is discarded and the caller must
    /// run exactly one fetch for the returned ticket.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.mounted = true;
        self.state = LoadState::NotLoaded;
        debug!(generation = self.generation, source = %self.source, "load started");
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Applies a fetch result. Returns `false` if the ticket is stale.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<MapData, LoadError>) -> bool {
        if !self.mounted || ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding load result for a torn-down mount"
            );
            return false;
        }

        self.state = match result {
            Ok(data) => {
                info!("Loaded {} locations from {}", data.locations.len(), self.source);
                LoadState::Loaded {
                    data: Arc::new(data),
                    loaded_at: Utc::now(),
                }
            }
            Err(e) => {
                error!("Error loading location data from {}: {}", self.source, e);
                LoadState::Failed(e.to_string())
            }
        };
        true
    }

    pub fn unmount(&mut self) {
        self.generation += 1;
        self.mounted = false;
        self.state = LoadState::NotLoaded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{lighthouse, map_data, LIGHTHOUSE_JSON};
    use std::io::Write;

    fn store() -> LocationStore {
        LocationStore::new(DataSource::File(PathBuf::from("unused.json")))
    }

    #[test]
    fn parses_source_kind() {
        assert_eq!(
            DataSource::parse("https://example.com/data/locations.json"),
            DataSource::Http("https://example.com/data/locations.json".to_string())
        );
        assert_eq!(
            DataSource::parse(" public/data/locations.json "),
            DataSource::File(PathBuf::from("public/data/locations.json"))
        );
    }

    #[test]
    fn starts_not_loaded() {
        let store = store();
        assert!(matches!(store.state(), LoadState::NotLoaded));
        assert!(store.data().is_none());
    }

    #[test]
    fn success_moves_to_loaded() {
        let mut store = store();
        let ticket = store.begin_load();
        assert!(store.finish_load(ticket, Ok(map_data(vec![lighthouse()]))));
        assert_eq!(store.data().map(|d| d.locations.len()), Some(1));
    }

    #[test]
    fn failure_moves_to_failed() {
        let mut store = store();
        let ticket = store.begin_load();
        let err = LoadError::Network("connection refused".to_string());
        assert!(store.finish_load(ticket, Err(err)));
        match store.state() {
            LoadState::Failed(reason) => assert!(reason.contains("connection refused")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn result_after_unmount_is_discarded() {
        let mut store = store();
        let ticket = store.begin_load();
        store.unmount();
        assert!(!store.finish_load(ticket, Ok(map_data(vec![lighthouse()]))));
        assert!(matches!(store.state(), LoadState::NotLoaded));
    }

    #[test]
    fn result_from_previous_mount_is_discarded() {
        let mut store = store();
        let old = store.begin_load();
        let current = store.begin_load();
        assert!(!store.finish_load(old, Ok(map_data(vec![]))));
        assert!(store.data().is_none());
        assert!(store.finish_load(current, Ok(map_data(vec![lighthouse()]))));
        assert_eq!(store.data().map(|d| d.locations.len()), Some(1));
    }

    #[tokio::test]
    async fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LIGHTHOUSE_JSON.as_bytes()).unwrap();
        let data = DataSource::File(file.path().to_path_buf()).load().await.unwrap();
        assert_eq!(data.locations, vec![lighthouse()]);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = DataSource::File(dir.path().join("nope.json"));
        assert!(matches!(source.load().await, Err(LoadError::Io { .. })));
    }

    #[tokio::test]
    async fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let source = DataSource::File(file.path().to_path_buf());
        assert!(matches!(source.load().await, Err(LoadError::Parse(_))));
    }

    #[tokio::test]
    async fn unreachable_url_is_network_error() {
        // Port 9 on loopback has nothing listening.
        let source = DataSource::Http("http://127.0.0.1:9/data/locations.json".to_string());
        assert!(matches!(source.load().await, Err(LoadError::Network(_))));
    }

    /// Serves `router` on an ephemeral loopback port and returns its base URL.
    async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn http_error_status_is_status_error() {
        // No routes, so every path answers 404
        let base = serve(axum::Router::new()).await;
        let source = DataSource::Http(format!("{}/data/locations.json", base));
        assert!(matches!(source.load().await, Err(LoadError::Status(404))));
    }

    #[tokio::test]
    async fn loads_from_url() {
        let router = axum::Router::new().route(
            "/data/locations.json",
            axum::routing::get(|| async { LIGHTHOUSE_JSON }),
        );
        let base = serve(router).await;
        let source = DataSource::Http(format!("{}/data/locations.json", base));
        assert_eq!(source.load().await.unwrap().locations, vec![lighthouse()]);
    }
}
