//! Configuration manager for userdir.

use std::fmt;
use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Listening address, `host:port`.
    pub address: String,
    /// Record store backing the user directory.
    pub store: StoreKind,
    #[serde(skip_deserializing)]
    pub version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: String::default(),
            address: DEFAULT_ADDRESS.to_owned(),
            store: StoreKind::default(),
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            postgres: None,
        }
    }
}

/// Which [`crate::user::UserStore`] to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Postgres,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreKind::Memory => write!(f, "memory"),
            StoreKind::Postgres => write!(f, "postgres"),
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Arc<Self> {
        let file_path = if self.path.is_file() {
            self.path.clone()
        } else {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let config = match File::open(&file_path) {
            Ok(file) => match serde_yaml::from_reader(file) {
                Ok(config) => Self::from_file(config),
                Err(err) => self.error(err),
            },
            Err(err) => self.error(err),
        };

        Arc::new(config)
    }

    /// Parse a configuration from YAML text.
    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml).map(Self::from_file)
    }

    /// Override the port of `address`.
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            let host = self
                .address
                .rsplit_once(':')
                .map_or(self.address.as_str(), |(host, _)| host);
            self.address = format!("{host}:{port}");
        }
        self
    }

    /// Select the record store.
    pub fn with_store(mut self, store: StoreKind) -> Self {
        self.store = store;
        self
    }

    /// Parsed listening address.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.address.parse()
    }

    fn from_file(mut config: Configuration) -> Self {
        // set app version.
        config.version = VERSION.to_owned();
        config
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file not found or invalid");
        Self {
            path: self.path.clone(),
            ..Default::default()
        }
    }
}
