//! Error types for the session server
//!
//! [`CommandError`] covers everything a request can fail with. Its `Display`
//! text is exactly what the client receives, since the protocol carries
//! failures as ordinary response lines. [`ServerError`] covers failures of
//! the server process itself (binding, configuration).

use shared::ConfigError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("{0} is not a valid action")]
    UnknownCommand(String),

    #[error("wrong number of arguments passed to {command}, expected {expected}, got {got}")]
    ArityMismatch {
        command: String,
        expected: usize,
        got: usize,
    },

    #[error("user {0} already exists")]
    UserExists(String),

    #[error("user {0} does not exist")]
    NoSuchUser(String),

    #[error("invalid password for {0}")]
    BadPassword(String),

    #[error("user name {0} not allowed")]
    InvalidUserName(String),

    #[error("user {0} not authorized")]
    NotAuthorized(String),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("session with the name {0} already exists")]
    SessionExists(String),

    #[error("no session with the name {0} found")]
    NoSuchSession(String),

    #[error("session {0} is already running")]
    AlreadyRunning(String),

    #[error("session {0} is already stopped")]
    AlreadyStopped(String),

    #[error("the session {0} has not been started")]
    NotStarted(String),

    #[error("the configuration you specified does not exist")]
    ConfigNotFound,

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound => Self::ConfigNotFound,
            ConfigError::Invalid(reason) => Self::InvalidConfig(reason),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for ServerError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
