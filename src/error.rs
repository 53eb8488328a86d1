use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to the user by the translator client.
///
/// Every variant is terminal for the action that produced it; nothing here is
/// retried and none of them take down the UI.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Please enter a natural language query")]
    EmptyQuery,

    #[error("A request is already in progress")]
    Busy,

    #[error("No command to execute.")]
    NoCommand,

    #[error("Please provide an API key to use this feature.")]
    CredentialsRequired,

    #[error("Network error: could not reach {endpoint}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {endpoint} timed out after {}s", .after.as_secs())]
    Timeout { endpoint: String, after: Duration },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ClientError {
    /// True for failures caught before any request was sent.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::EmptyQuery | Self::Busy | Self::NoCommand | Self::CredentialsRequired
        )
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
