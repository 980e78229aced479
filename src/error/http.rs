use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to encode request body: {source}")]
    EncodeBody {
        #[source]
        source: serde_json::Error,
    },
}
