use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Date/time parsing failed for '{value}': {source}")]
    DateTime {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Unknown timezone: {0}")]
    Timezone(String),

    #[error("Portal error: {0}")]
    Portal(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn date_time(value: impl Into<String>, source: chrono::ParseError) -> Self {
        Self::DateTime {
            value: value.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
