use async_trait::async_trait;

use crate::args::{HttpMethod, ScriptKind};
use crate::error::{AppError, AppResult, ValidationError};

use super::{HttpCapability, Recorder, RequestDescriptor, STATUS_CHECK, Script, json_headers};

const ENDPOINT_COUNT: usize = 3;

#[derive(Debug, Clone)]
struct Probe {
    request: RequestDescriptor,
    failure_rate: String,
}

/// GETs `/headers` on three endpoints in turn. Each endpoint feeds its own
/// `failed_requests_N` rate with `true` when the call did not return 200.
#[derive(Debug, Clone)]
pub struct HeadersScript {
    probes: Vec<Probe>,
}

impl HeadersScript {
    pub const DEFAULT_URLS: [&'static str; ENDPOINT_COUNT] = [
        "https://httpbin.org/headers",
        "https://httpbingo.org/headers",
        "https://postman-echo.com/headers",
    ];

    /// # Errors
    ///
    /// Returns an error unless exactly three URLs are given.
    pub fn new(urls: Vec<String>) -> AppResult<Self> {
        if urls.len() != ENDPOINT_COUNT {
            return Err(AppError::validation(ValidationError::UrlCountMismatch {
                script: ScriptKind::Headers.as_str(),
                expected: ENDPOINT_COUNT,
                actual: urls.len(),
            }));
        }
        let probes = urls
            .into_iter()
            .enumerate()
            .map(|(idx, url)| Probe {
                request: RequestDescriptor {
                    url,
                    method: HttpMethod::Get,
                    headers: json_headers(),
                    body: None,
                },
                failure_rate: failure_rate_name(idx),
            })
            .collect();
        Ok(Self { probes })
    }

    pub fn requests(&self) -> impl Iterator<Item = &RequestDescriptor> {
        self.probes.iter().map(|probe| &probe.request)
    }
}

fn failure_rate_name(idx: usize) -> String {
    format!("failed_requests_{}", idx.saturating_add(1))
}

#[async_trait]
impl Script for HeadersScript {
    fn kind(&self) -> ScriptKind {
        ScriptKind::Headers
    }

    fn rate_metrics(&self) -> Vec<String> {
        self.probes
            .iter()
            .map(|probe| probe.failure_rate.clone())
            .collect()
    }

    async fn iterate(&self, http: &dyn HttpCapability, recorder: &dyn Recorder) {
        for probe in &self.probes {
            let response = http.send(&probe.request).await;
            let passed = response.is_expected();
            recorder.check(STATUS_CHECK, passed);
            recorder.add_rate(&probe.failure_rate, !passed);
        }
    }
}
