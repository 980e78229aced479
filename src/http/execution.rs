use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Method, Request};
use tokio::time::Instant;
use tracing::{debug, error};

use crate::args::HttpMethod;
use crate::metrics::{ChannelRecorder, RequestSample};
use crate::script::{HttpCapability, HttpResponse, RequestDescriptor};

/// Sends requests through a shared reqwest client and reports one
/// [`RequestSample`] per call.
#[derive(Debug, Clone)]
pub struct ReqwestHttp {
    client: Client,
    recorder: ChannelRecorder,
}

impl ReqwestHttp {
    #[must_use]
    pub const fn new(client: Client, recorder: ChannelRecorder) -> Self {
        Self { client, recorder }
    }

    fn build_request(&self, descriptor: &RequestDescriptor) -> Result<Request, reqwest::Error> {
        let mut builder = self
            .client
            .request(method_of(descriptor.method), descriptor.url.as_str());
        for (name, value) in &descriptor.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = descriptor.body.as_ref() {
            builder = builder.body(body.clone());
        }
        builder.build()
    }
}

#[async_trait]
impl HttpCapability for ReqwestHttp {
    async fn send(&self, request: &RequestDescriptor) -> HttpResponse {
        let start = Instant::now();
        let (status, timed_out) = match self.build_request(request) {
            Ok(built) => execute_request_status(&self.client, built).await,
            Err(err) => {
                error!(
                    "Failed to build {} request for {}: {}",
                    request.method.as_str(),
                    request.url,
                    err
                );
                (HttpResponse::TRANSPORT_FAILURE.status, false)
            }
        };
        self.recorder.record_request(RequestSample {
            latency: start.elapsed(),
            status,
            timed_out,
        });
        HttpResponse { status }
    }
}

const fn method_of(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
    }
}

/// Executes the request and drains the body so the connection can be reused.
/// Returns the status (0 on transport failure) and whether it timed out.
async fn execute_request_status(client: &Client, request: Request) -> (u16, bool) {
    match client.execute(request).await {
        Ok(response) => {
            let status = response.status().as_u16();
            match drain_response_body(response).await {
                Ok(_) => (status, false),
                Err(err) => {
                    debug!("Failed to read response body: {}", err);
                    (HttpResponse::TRANSPORT_FAILURE.status, err.is_timeout())
                }
            }
        }
        Err(err) => {
            debug!("Request failed: {}", err);
            (HttpResponse::TRANSPORT_FAILURE.status, err.is_timeout())
        }
    }
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
