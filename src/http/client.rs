use reqwest::Client;

use crate::args::{DEFAULT_USER_AGENT, TesterArgs};
use crate::error::{AppError, AppResult, HttpError};

/// Builds the client shared by every virtual user. Connection pooling and
/// keep-alive are left to reqwest.
///
/// # Errors
///
/// Returns an error when the TLS backend or client cannot be initialized.
pub fn build_client(args: &TesterArgs) -> AppResult<Client> {
    let mut client_builder = Client::builder()
        .timeout(args.request_timeout)
        .connect_timeout(args.connect_timeout);

    if !args.no_ua {
        client_builder = client_builder.user_agent(DEFAULT_USER_AGENT);
    }

    if args.insecure {
        tracing::warn!("TLS certificate verification is disabled (--insecure).");
        client_builder = client_builder.danger_accept_invalid_certs(true);
    }

    client_builder
        .build()
        .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))
}
