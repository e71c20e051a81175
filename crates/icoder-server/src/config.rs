//! Server configuration for iCoder.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `ICODER_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8001;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Storage backend type.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Directory served verbatim under `/static`.
    pub static_dir: PathBuf,
    /// Session cookie settings.
    pub session: SessionSettings,
}

/// Supported storage backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// redb database file.
    Redb { path: PathBuf },
    /// `RocksDB` database directory.
    RocksDb { path: PathBuf },
}

impl StorageBackendType {
    /// Short name reported by `/health`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb { .. } => "redb",
            Self::RocksDb { .. } => "rocksdb",
        }
    }
}

/// Where the session cookie signing key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionSecret {
    /// A random key per process start; every restart logs all users out.
    Ephemeral,
    /// A hex-encoded key that survives restarts.
    Persisted(String),
}

impl std::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ephemeral => f.write_str("Ephemeral"),
            Self::Persisted(_) => f.write_str("Persisted([redacted])"),
        }
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Signing key source.
    pub secret: SessionSecret,
    /// Whether to set the `Secure` cookie attribute (HTTPS deployments).
    pub secure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            secret: SessionSecret::Ephemeral,
            secure: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ICODER_BIND_ADDR`: full bind address (default: `127.0.0.1:8001`)
    /// - `PORT`: port to bind on `0.0.0.0`, used when `ICODER_BIND_ADDR` is unset
    /// - `ICODER_STORAGE`: `memory`, `redb`, or `rocksdb` (default: `redb`)
    /// - `ICODER_STORAGE_PATH`: directory for persistent backends (default: `./data`)
    /// - `ICODER_STATIC_DIR`: directory served under `/static` (default: `./static`)
    /// - `ICODER_LOG_LEVEL`: log filter (default: `info`)
    /// - `ICODER_SESSION_SECRET`: hex cookie signing key, at least 64 bytes (default: ephemeral)
    /// - `ICODER_SECURE_COOKIES`: set the `Secure` cookie attribute (default: `false`)
    #[must_use]
    pub fn from_env() -> Self {
        let default_addr = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT));
        let bind_addr = if let Ok(addr) = std::env::var("ICODER_BIND_ADDR") {
            addr.parse().unwrap_or(default_addr)
        } else if let Ok(port_str) = std::env::var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(DEFAULT_PORT);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            default_addr
        };

        let storage_path = PathBuf::from(
            std::env::var("ICODER_STORAGE_PATH").unwrap_or_else(|_| "./data".to_owned()),
        );

        let storage_backend = match std::env::var("ICODER_STORAGE")
            .unwrap_or_else(|_| "redb".to_owned())
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackendType::Memory,
            "rocksdb" => StorageBackendType::RocksDb {
                path: storage_path.join("rocksdb"),
            },
            _ => StorageBackendType::Redb {
                path: storage_path.join("icoder.redb"),
            },
        };

        let static_dir = PathBuf::from(
            std::env::var("ICODER_STATIC_DIR").unwrap_or_else(|_| "./static".to_owned()),
        );

        let log_level = std::env::var("ICODER_LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());

        let secret = std::env::var("ICODER_SESSION_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map_or(SessionSecret::Ephemeral, |s| {
                SessionSecret::Persisted(s.trim().to_owned())
            });

        let secure = std::env::var("ICODER_SECURE_COOKIES")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Self {
            bind_addr,
            storage_backend,
            log_level,
            static_dir,
            session: SessionSettings { secret, secure },
        }
    }
}
