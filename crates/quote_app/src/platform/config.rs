//! Layered configuration: defaults, then `stealthquote.ron`, then environment
//! variables, then command-line flags.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quote_client::{live_url, ClientSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::logging::LogDestination;

pub const CONFIG_FILENAME: &str = "stealthquote.ron";
pub const API_URL_ENV: &str = "STEALTHQUOTE_API_URL";
pub const WS_URL_ENV: &str = "STEALTHQUOTE_WS_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub ws_url: String,
    pub log_destination: LogDestination,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let settings = ClientSettings::default();
        Self {
            api_url: settings.api_base_url,
            ws_url: settings.ws_url_template,
            log_destination: LogDestination::default(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            output_dir: settings.output_dir,
        }
    }
}

/// Values given on the command line; `None` leaves the lower layer in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub ws_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub log_destination: Option<LogDestination>,
}

impl AppConfig {
    /// Reads the file layer and applies the environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(CONFIG_FILENAME);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(api_url) = env(API_URL_ENV).filter(|value| !value.trim().is_empty()) {
            config.api_url = api_url;
        }
        if let Some(ws_url) = env(WS_URL_ENV).filter(|value| !value.trim().is_empty()) {
            config.ws_url = ws_url;
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(api_url) = &overrides.api_url {
            self.api_url = api_url.clone();
        }
        if let Some(ws_url) = &overrides.ws_url {
            self.ws_url = ws_url.clone();
        }
        if let Some(output_dir) = &overrides.output_dir {
            self.output_dir = output_dir.clone();
        }
        if let Some(destination) = overrides.log_destination {
            self.log_destination = destination;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let api = Url::parse(&self.api_url).map_err(|err| ConfigError::Invalid {
            field: "api_url",
            message: format!("{}: {err}", self.api_url),
        })?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "api_url",
                message: format!("{} is not an http(s) URL", self.api_url),
            });
        }

        let ws = live_url(&self.ws_url, "probe").map_err(|err| ConfigError::Invalid {
            field: "ws_url",
            message: format!("{}: {err}", self.ws_url),
        })?;
        if !matches!(ws.scheme(), "ws" | "wss") {
            return Err(ConfigError::Invalid {
                field: "ws_url",
                message: format!("{} is not a ws(s) URL", self.ws_url),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            api_base_url: self.api_url.clone(),
            ws_url_template: self.ws_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            output_dir: self.output_dir.clone(),
            ..ClientSettings::default()
        }
    }
}
