//! Server configuration.
//!
//! Read once from environment variables at startup. Every setting has a
//! default suitable for local development.

use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Directory holding the lookup tables.
    pub data_dir: PathBuf,

    /// DCAT catalog file name inside `data_dir`.
    pub dcat_file: String,

    /// OPC UA hierarchy file name inside `data_dir`.
    pub opcua_file: String,

    /// Where submitted asset descriptions are written.
    pub output_dir: PathBuf,

    /// Idle time after which a form session is dropped.
    pub session_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
            data_dir: PathBuf::from("assets"),
            dcat_file: "dcat3.csv".to_string(),
            opcua_file: "opcua_robotics_object_hierarchy.csv".to_string(),
            output_dir: PathBuf::from("output"),
            session_ttl: Duration::from_secs(3600),
        }
    }
}

impl ServerConfig {
    /// Configuration from environment variables
    ///
    /// `HOST`, `PORT`, `DATA_DIR`, `DCAT_CSV`, `OPCUA_CSV`, `OUTPUT_DIR`,
    /// `SESSION_TTL_SECS`. Unparseable numbers fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: lookup("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            dcat_file: lookup("DCAT_CSV").unwrap_or(defaults.dcat_file),
            opcua_file: lookup("OPCUA_CSV").unwrap_or(defaults.opcua_file),
            output_dir: lookup("OUTPUT_DIR").map(PathBuf::from).unwrap_or(defaults.output_dir),
            session_ttl: lookup("SESSION_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
        }
    }

    /// `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
