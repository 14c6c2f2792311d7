use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Failed to build geocoding HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Geocoding request failed for '{0}'")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("Geocoding request for '{query}' failed with status {status}")]
    HttpStatus {
        query: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse geocoding response for '{0}'")]
    JsonParse(String, #[source] serde_json::Error),

    #[error("Geocoding hit for '{query}' has invalid coordinate '{value}'")]
    InvalidCoordinate { query: String, value: String },
}
