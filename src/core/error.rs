#[derive(Debug, thiserror::Error)]
pub enum MinerError {
    /// Network-related errors talking to the generation backend
    #[error("Network error: {0}")]
    Network(reqwest::Error),
    /// Backend response did not have the expected shape
    #[error("Failed to parse response: {0}")]
    ResponseFormat(String),
    /// Backend rejected the request (bad parameters, overloaded, etc)
    #[error("API error: {0}")]
    ApiError(String),
    /// Authentication-specific errors
    #[error("Authentication error: {0}")]
    Authentication(String),
    /// Stream-related errors
    #[error("Stream error: {0}")]
    StreamError(String),
    /// I/O error
    #[error("I/O error: {0}")]
    IOError(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// The chat history handed to the miner could not be read
    #[error("Invalid chat history: {0}")]
    InvalidHistory(String),
}

impl From<std::io::Error> for MinerError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err.to_string())
    }
}

// The backend client maps HTTP status codes itself; what is left here is transport.
impl From<reqwest::Error> for MinerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err)
    }
}
