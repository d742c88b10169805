// src/config.rs

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Redis => write!(f, "redis"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Resolved server settings. Defaults live on the CLI flags in `main.rs`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,         // Default: 0.0.0.0
    pub port: u16,            // Default: 5000
    pub store: StoreBackend,  // Default: redis
    pub redis_url: String,    // Default: redis://redis:6379
    pub history_key: String,  // Default: metrics
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            store: StoreBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            history_key: "metrics".to_string(),
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
        assert_eq!(config.store.to_string(), "memory");
    }
}
