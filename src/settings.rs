use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants::{API_KEY_ENV_VARS, DEFAULT_DATA_FILE, DEFAULT_PORT, DEFAULT_PUBLIC_DIR};
use crate::store::DataSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub port: u16,
    /// File path or http(s) URL of the locations document.
    pub data_source: String,
    /// Directory served as static files (images, data file).
    pub public_dir: String,
    #[serde(default, skip_serializing)]
    pub maps_api_key: Option<String>,
    #[serde(default)]
    pub auto_open_browser: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_source: DEFAULT_DATA_FILE.to_string(),
            public_dir: DEFAULT_PUBLIC_DIR.to_string(),
            maps_api_key: None,
            auto_open_browser: false,
        }
    }
}

impl Settings {
    /// Reads `poimap.ini` (if any) and then applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::config_path())?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut settings = Settings::default();
        if !config_path.exists() {
            return Ok(settings);
        }

        let file = File::open(config_path).context("Failed to open config file")?;
        let reader = BufReader::new(file);
        let mut config_map = HashMap::new();

        for line in reader.lines() {
            let line = line.context("Failed to read line from config")?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config_map.insert(
                    key.trim().to_string(),
                    value.trim().trim_matches('"').to_string(),
                );
            }
        }

        if let Some(port_str) = config_map.get("port") {
            if let Ok(port) = port_str.parse::<u16>() {
                settings.port = port;
            }
        }
        if let Some(source) = config_map.get("data_source") {
            settings.data_source = source.clone();
        }
        if let Some(dir) = config_map.get("public_dir") {
            settings.public_dir = dir.clone();
        }
        if let Some(key) = config_map.get("maps_api_key") {
            settings.maps_api_key = Some(key.clone());
        }
        if let Some(auto_open_str) = config_map.get("auto_open_browser") {
            if let Ok(auto_open) = auto_open_str.parse::<bool>() {
                settings.auto_open_browser = auto_open;
            }
        }

        Ok(settings)
    }

    /// Environment wins over the file. `lookup` is `std::env::var` outside tests.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("POIMAP_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(source) = lookup("POIMAP_DATA_SOURCE") {
            self.data_source = source;
        }
        if let Some(dir) = lookup("POIMAP_PUBLIC_DIR") {
            self.public_dir = dir;
        }
        if let Some(key) = API_KEY_ENV_VARS
            .iter()
            .filter_map(|var| lookup(var))
            .find(|v| !v.trim().is_empty())
        {
            self.maps_api_key = Some(key);
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Creating config directory")?;
        }
        std::fs::write(&config_path, self.to_ini()).context("Failed to write to config file")?;
        Ok(())
    }

    fn to_ini(&self) -> String {
        let mut content = String::new();
        content.push_str("# PoiMap Configuration File\n");
        content.push_str(&format!("port = {}\n", self.port));
        content.push_str(&format!("data_source = \"{}\"\n", self.data_source));
        content.push_str(&format!("public_dir = \"{}\"\n", self.public_dir));
        if let Some(ref key) = self.maps_api_key {
            content.push_str(&format!("maps_api_key = \"{}\"\n", key));
        }
        content.push_str(&format!("auto_open_browser = {}\n", self.auto_open_browser));
        content
    }

    pub fn data_source(&self) -> DataSource {
        DataSource::parse(&self.data_source)
    }

    pub fn credential(&self) -> Result<MapsCredential, CredentialError> {
        MapsCredential::new(self.maps_api_key.as_deref())
    }

    pub fn config_path() -> PathBuf {
        let mut path = std::env::current_exe()
            .unwrap_or_default()
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        if path.ends_with("target/debug") || path.ends_with("target/release") {
            path.pop();
            path.pop();
        }
        path.push("poimap.ini");
        path
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no map provider API key configured (set {} or maps_api_key in poimap.ini)", API_KEY_ENV_VARS[0])]
    Missing,
    #[error("map provider API key may only contain letters, digits, '-', '_' and '.'")]
    Malformed,
}

/// Map provider API key. Opaque to everything except the page template.
#[derive(Clone, PartialEq, Eq)]
pub struct MapsCredential(String);

impl MapsCredential {
    pub fn new(raw: Option<&str>) -> Result<Self, CredentialError> {
        let key = raw.map(str::trim).unwrap_or_default();
        if key.is_empty() {
            return Err(CredentialError::Missing);
        }
        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(CredentialError::Malformed);
        }
        Ok(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MapsCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MapsCredential(***)")
    }
}
