use std::time::Duration;

use redis::RedisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(#[source] RedisError),
    #[error("Command error: {0}")]
    Command(#[source] RedisError),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("Connection pool error: {0}")]
    Pool(String),
    #[error("No connection is held")]
    NotAcquired,
    #[error("Idle connection expired")]
    IdleExpired,
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<RedisError> for ClientError {
    fn from(e: RedisError) -> Self {
        if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
            ClientError::Connection(e)
        } else {
            ClientError::Command(e)
        }
    }
}

impl ClientError {
    pub fn is_connection(&self) -> bool {
        matches!(self, ClientError::Connection(_))
    }

    pub fn is_command(&self) -> bool {
        matches!(self, ClientError::Command(_))
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
