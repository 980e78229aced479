use async_trait::async_trait;
use serde_json::json;

use crate::args::{HttpMethod, ScriptKind};
use crate::error::{AppError, AppResult, HttpError};

use super::{HttpCapability, Recorder, RequestDescriptor, STATUS_CHECK, Script, json_headers};

const INPUTS: [&str; 3] = ["I am happy", "I am angry", "I am sad"];

/// Posts the same three-sentence batch to a prediction endpoint on every
/// iteration and checks for a 200.
#[derive(Debug, Clone)]
pub struct PredictScript {
    request: RequestDescriptor,
}

impl PredictScript {
    pub const DEFAULT_URL: &'static str =
        "https://emotion-class-svc-raman-ws-8000.zurichlabs-cluster.truefoundry.tfy.app/predict";

    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn new(url: String) -> AppResult<Self> {
        let payload = json!({
            "inputs": INPUTS,
            "parameters": {},
        });
        let body = serde_json::to_string(&payload)
            .map_err(|err| AppError::http(HttpError::EncodeBody { source: err }))?;
        Ok(Self {
            request: RequestDescriptor {
                url,
                method: HttpMethod::Post,
                headers: json_headers(),
                body: Some(body),
            },
        })
    }

    #[must_use]
    pub const fn request(&self) -> &RequestDescriptor {
        &self.request
    }
}

#[async_trait]
impl Script for PredictScript {
    fn kind(&self) -> ScriptKind {
        ScriptKind::Predict
    }

    fn rate_metrics(&self) -> Vec<String> {
        Vec::new()
    }

    async fn iterate(&self, http: &dyn HttpCapability, recorder: &dyn Recorder) {
        let response = http.send(&self.request).await;
        recorder.check(STATUS_CHECK, response.is_expected());
    }
}
