//! Server configuration loaded from environment variables.

use std::path::PathBuf;

use anyhow::Result;

const DEFAULT_BIND: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// SQLite file (from TRACKMEET_DB_PATH). `None` uses the platform data directory.
    pub db_path: Option<PathBuf>,
    /// Listen address (from TRACKMEET_BIND)
    pub bind: String,
    /// HTTP port (from TRACKMEET_PORT)
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("TRACKMEET_DB_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let bind = lookup("TRACKMEET_BIND")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let port = match lookup("TRACKMEET_PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid TRACKMEET_PORT {:?}", raw);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            db_path,
            bind,
            port,
        }
    }

    /// Applies command-line overrides on top of the environment.
    pub fn with_overrides(mut self, port: Option<u16>, db_path: Option<PathBuf>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        if db_path.is_some() {
            self.db_path = db_path;
        }
        self
    }

    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => crate::db::default_path(),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]);
        assert!(config.db_path.is_none());
        assert_eq!(config.listen_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn reads_all_variables() {
        let config = config_from(&[
            ("TRACKMEET_DB_PATH", "/tmp/meet.db"),
            ("TRACKMEET_BIND", "0.0.0.0"),
            ("TRACKMEET_PORT", "8080"),
        ]);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/meet.db")));
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn invalid_port_falls_back_to_default() {
        let config = config_from(&[("TRACKMEET_PORT", "not-a-port")]);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn cli_overrides_win() {
        let config = config_from(&[("TRACKMEET_PORT", "8080")])
            .with_overrides(Some(9000), Some(PathBuf::from("/data/meet.db")));
        assert_eq!(config.port, 9000);
        assert_eq!(config.resolved_db_path().unwrap(), PathBuf::from("/data/meet.db"));
    }
}
