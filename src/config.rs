use clap::Parser;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT secret key cannot be empty")]
    EmptySecret,
    #[error("client timeout ({timeout}s) must exceed the heartbeat interval ({interval}s)")]
    TimeoutTooShort { timeout: u64, interval: u64 },
}

/// Server settings, read from the command line or the environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Settings {
    /// Server IP address to bind to
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to listen on
    #[arg(short, long, env = "SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// HMAC secret used to verify access tokens
    #[arg(long, env = "JWT_SECRET_KEY", hide_env_values = true)]
    pub jwt_secret: String,

    /// Seconds between server pings
    #[arg(long, env = "HEARTBEAT_INTERVAL_SECS", default_value = "10")]
    pub heartbeat_interval_secs: u64,

    /// Seconds without any client frame before the connection is closed
    #[arg(long, env = "CLIENT_TIMEOUT_SECS", default_value = "60")]
    pub client_timeout_secs: u64,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.client_timeout_secs <= self.heartbeat_interval_secs {
            return Err(ConfigError::TimeoutTooShort {
                timeout: self.client_timeout_secs,
                interval: self.heartbeat_interval_secs,
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
