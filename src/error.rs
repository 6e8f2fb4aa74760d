use thiserror::Error;

/// Failures talking to the external geocoding provider.
///
/// These never cross the crate boundary: every public geocoding
/// operation recovers them to an empty result and logs the cause.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error("provider payload did not parse: {0}")]
    Deserialize(String),

    #[error("provider coordinate did not parse: {0}")]
    InvalidCoordinate(String),
}

/// Failures reading reference data from the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store does not implement this optional server-side query.
    /// Callers branch to the documented fallback, never surface it.
    #[error("store query not supported: {0}")]
    Unsupported(&'static str),

    #[error("store query failed: {0}")]
    Query(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}
