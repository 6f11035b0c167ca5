use thiserror::Error;

/// Main error type for the stats bot
#[derive(Error, Debug)]
pub enum BotError {
    /// Name or id had no match at the provider
    #[error("{0}")]
    NotFound(String),

    /// Wargaming API answered with `status: "error"`
    #[error("Wargaming API returned the following error: {code} {message}")]
    Api { code: i64, message: String },

    /// Network / connection failure talking to a remote service
    #[error("Error while contacting the Wargaming API: {0}")]
    Transport(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Caller passed an empty required field
    #[error("{0} is empty!")]
    MissingArgument(&'static str),

    /// Malformed chat command
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// JSON errors (match file or API payloads)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML config errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Filesystem errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File watcher errors
    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Missing or invalid settings, fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chat platform rejected a message
    #[error("Channel error: {0}")]
    Channel(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl BotError {
    /// Errors raised by a provider lookup. These are turned into a failure
    /// block or a single reply, never propagated past the point of use.
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            BotError::NotFound(_)
                | BotError::Api { .. }
                | BotError::Transport(_)
                | BotError::HttpRequest(_)
                | BotError::Json(_)
        )
    }

    /// Errors caught before any network call is issued
    pub fn is_validation_error(&self) -> bool {
        matches!(self, BotError::MissingArgument(_) | BotError::InvalidFormat(_))
    }
}

impl From<String> for BotError {
    fn from(s: String) -> Self {
        BotError::Other(s)
    }
}

impl From<&str> for BotError {
    fn from(s: &str) -> Self {
        BotError::Other(s.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BotError>;
