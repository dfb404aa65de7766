//! Server configuration.

use std::time::Duration;

/// Top-level configuration for the HTTP server and its series stores.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// How long points stay in a series' hot buffer before a flush
    /// promotes them to the archive.
    pub retention: Duration,
    /// Interval at which the scheduler flushes every series.
    pub flush_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            retention: Duration::from_secs(15 * 60),
            flush_interval: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.retention, Duration::from_secs(900));
        assert_eq!(config.flush_interval, Duration::from_secs(60));
    }
}
