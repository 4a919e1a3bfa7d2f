use super::client::ApiClient;
use super::request::RequestBuilder;
use super::signer::EsbSigner;
use super::{BASE_URL, SERVICE_NAME};
use crate::core::config::ClientConfig;
use crate::core::errors::EsbError;
use crate::core::kernel::{
    DigestRegistry, RequestLogger, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig,
    RetryPolicy, TracingLogger, Transport,
};
use std::sync::Arc;

/// Builder for `ApiClient` with custom transport settings
pub struct ApiClientBuilder {
    config: ClientConfig,
    timeout_seconds: u64,
    accept_invalid_certs: bool,
    retry: RetryPolicy,
    logger: Arc<dyn RequestLogger>,
    registry: Arc<DigestRegistry>,
}

impl ApiClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            timeout_seconds: 30,
            accept_invalid_certs: true,
            retry: RetryPolicy::default(),
            logger: Arc::new(TracingLogger),
            registry: Arc::new(DigestRegistry::default()),
        }
    }

    /// Set the per-attempt request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Enable or disable TLS certificate verification
    pub fn with_accept_invalid_certs(mut self, accept_invalid_certs: bool) -> Self {
        self.accept_invalid_certs = accept_invalid_certs;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Use a custom set of sign methods
    pub fn with_digest_registry(mut self, registry: DigestRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Build a client backed by reqwest
    pub fn build(self) -> Result<ApiClient<ReqwestRest>, EsbError> {
        self.config.validate()?;

        let base_url = self.config.base_url().unwrap_or(BASE_URL).to_string();
        let rest_config = RestClientConfig::new(base_url, SERVICE_NAME.to_string())
            .with_timeout(self.timeout_seconds)
            .with_accept_invalid_certs(self.accept_invalid_certs);
        let rest = RestClientBuilder::new(rest_config).build()?;

        self.build_with_rest(rest)
    }

    /// Build a client on top of a caller-supplied `RestClient`
    pub fn build_with_rest<R: RestClient>(self, rest: R) -> Result<ApiClient<R>, EsbError> {
        self.config.validate()?;

        let signer = Arc::new(EsbSigner::with_registry(
            self.config.secret().to_string(),
            self.registry,
        ));
        let requests = RequestBuilder::new(self.config, signer);
        let transport = Transport::new(rest)
            .with_logger(self.logger)
            .with_retry_policy(self.retry);

        Ok(ApiClient::from_parts(requests, transport))
    }
}
