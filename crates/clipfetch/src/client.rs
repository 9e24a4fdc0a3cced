use reqwest::{Client, ClientBuilder};
use rustls::{ClientConfig, crypto::ring};
use rustls_platform_verifier::BuilderVerifierExt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::FetchError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Options shared by every client: user agent, connect bound, and a read
/// timeout so a peer that stops sending mid-response cannot stall a request.
pub fn client_builder(config: &FetchConfig) -> ClientBuilder {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(CONNECT_TIMEOUT.min(config.http_timeout))
        .read_timeout(config.http_timeout)
}

/// Shared HTTP client for every source, verifying TLS with the platform store.
pub fn build_client(config: &FetchConfig) -> Result<Client, FetchError> {
    let provider = Arc::new(ring::default_provider());
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| FetchError::internal(format!("TLS protocol setup failed: {e}")))?
        .with_platform_verifier()
        .map_err(|e| FetchError::internal(format!("TLS verifier setup failed: {e}")))?
        .with_no_client_auth();

    client_builder(config)
        .use_preconfigured_tls(tls_config)
        .build()
        .map_err(|e| FetchError::internal(format!("failed to create HTTP client: {e}")))
}
