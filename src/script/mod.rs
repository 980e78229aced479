//! Iteration functions and the capabilities they are handed.
//!
//! A script never owns a client or a metrics sink: every iteration receives an
//! [`HttpCapability`] to issue requests and a [`Recorder`] to report checks and
//! rate observations. The VU driver decides how often and how concurrently an
//! iteration runs.
mod headers;
mod predict;

#[cfg(test)]
pub(crate) mod test_support;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;

use crate::args::{HttpMethod, ScriptKind};
use crate::error::{AppError, AppResult, ValidationError};

pub use headers::HeadersScript;
pub use predict::PredictScript;

/// Check name recorded for every status assertion.
pub const STATUS_CHECK: &str = "status was 200";
/// Status a response must carry for its check to pass.
pub const EXPECTED_STATUS: u16 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponse {
    /// Response status; `0` when no response arrived (timeout, refused, reset).
    pub status: u16,
}

impl HttpResponse {
    pub const TRANSPORT_FAILURE: Self = Self { status: 0 };

    #[must_use]
    pub const fn is_expected(self) -> bool {
        self.status == EXPECTED_STATUS
    }
}

#[async_trait]
pub trait HttpCapability: Send + Sync {
    /// Sends a request and waits for the full response. Never fails: transport
    /// errors surface as [`HttpResponse::TRANSPORT_FAILURE`].
    async fn send(&self, request: &RequestDescriptor) -> HttpResponse;
}

pub trait Recorder: Send + Sync {
    fn check(&self, name: &str, passed: bool);
    fn add_rate(&self, name: &str, value: bool);
}

#[async_trait]
pub trait Script: Send + Sync {
    fn kind(&self) -> ScriptKind;

    /// Rate metrics this script may feed, used to validate thresholds before
    /// the run starts.
    fn rate_metrics(&self) -> Vec<String>;

    async fn iterate(&self, http: &dyn HttpCapability, recorder: &dyn Recorder);
}

/// Builds the selected script, replacing its target URLs when `urls` is not empty.
///
/// # Errors
///
/// Returns an error when a URL is malformed or the URL count does not match
/// what the script calls.
pub fn build_script(kind: ScriptKind, urls: &[String]) -> AppResult<Arc<dyn Script>> {
    for url in urls {
        validate_url(url)?;
    }
    let script: Arc<dyn Script> = match kind {
        ScriptKind::Predict => {
            let url = match urls {
                [] => PredictScript::DEFAULT_URL.to_owned(),
                [url] => url.clone(),
                [_, _, ..] => {
                    return Err(AppError::validation(ValidationError::UrlCountMismatch {
                        script: kind.as_str(),
                        expected: 1,
                        actual: urls.len(),
                    }));
                }
            };
            Arc::new(PredictScript::new(url)?)
        }
        ScriptKind::Headers => {
            let urls = if urls.is_empty() {
                HeadersScript::DEFAULT_URLS
                    .iter()
                    .map(|url| (*url).to_owned())
                    .collect()
            } else {
                urls.to_vec()
            };
            Arc::new(HeadersScript::new(urls)?)
        }
    };
    Ok(script)
}

fn validate_url(url: &str) -> AppResult<()> {
    let parsed = url::Url::parse(url).map_err(|err| {
        AppError::validation(ValidationError::InvalidUrl {
            url: url.to_owned(),
            source: err,
        })
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(AppError::validation(ValidationError::UnsupportedUrlScheme {
            url: url.to_owned(),
        })),
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("Content-Type".to_owned(), "application/json".to_owned())]
}
