//! Error types for the Hacker News API client.

#[derive(Debug, thiserror::Error)]
pub enum HnApiError {
    #[error("Request to {url} failed")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest_middleware::Error,
    },
    #[error("{url} responded with status {status}")]
    BadStatus { url: String, status: u16 },
    #[error("Failed to parse response from {url}")]
    ParseFailed {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Item {id} does not exist upstream")]
    Missing { id: u64 },
}
