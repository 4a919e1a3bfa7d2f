use crate::core::errors::EsbError;
use crate::core::kernel::logger::{RequestLogger, TracingLogger};
use crate::core::kernel::rest::{request_url, RestClient};
use crate::core::types::{ResponseBody, SignedRequest};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Bounded retry policy for transport failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    exponential_backoff: bool,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(3),
            exponential_backoff: false,
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` total attempts (at least one)
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Set the delay before the second attempt
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Double the delay after every failed attempt, up to `max_delay`
    pub fn with_exponential_backoff(mut self, max_delay: Duration) -> Self {
        self.exponential_backoff = true;
        self.max_delay = max_delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff {
            return self.delay;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        std::cmp::min(self.delay.saturating_mul(factor), self.max_delay)
    }
}

/// Sends signed requests with bounded retry and request/response logging
///
/// A `SignedRequest` is never modified between attempts; every attempt sends
/// the same URL and body.
pub struct Transport<R: RestClient> {
    rest: R,
    logger: Arc<dyn RequestLogger>,
    retry: RetryPolicy,
}

impl<R: RestClient + Clone> Clone for Transport<R> {
    fn clone(&self) -> Self {
        Self {
            rest: self.rest.clone(),
            logger: Arc::clone(&self.logger),
            retry: self.retry.clone(),
        }
    }
}

impl<R: RestClient> Transport<R> {
    /// Create a transport with the default retry policy and `TracingLogger`
    pub fn new(rest: R) -> Self {
        Self {
            rest,
            logger: Arc::new(TracingLogger),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn rest(&self) -> &R {
        &self.rest
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Send a signed request, retrying transport failures
    ///
    /// Returns `EsbError::TransportError` wrapping the last failure once every
    /// attempt has failed.
    #[instrument(skip(self, request), fields(method = %request.method, api_method = request.params.get("method").unwrap_or_default()))]
    pub async fn send(&self, request: &SignedRequest) -> Result<ResponseBody, EsbError> {
        let url = request_url(self.rest.base_url(), &request.params);
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.send_once(request, &url).await {
                Ok(response) => {
                    debug!(attempt, status = response.status(), "Request succeeded");
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(attempt, max_attempts, ?delay, "Request attempt failed: {}", e);
                    sleep(delay).await;
                }
                Err(e) if e.is_retryable() => {
                    warn!(attempt, "Giving up after {} attempt(s): {}", attempt, e);
                    return Err(EsbError::TransportError {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, request: &SignedRequest, url: &Url) -> Result<ResponseBody, EsbError> {
        if let Err(e) = self.logger.log_request(
            request.method.as_str(),
            url.path(),
            url.query().unwrap_or_default(),
            &request.body,
        ) {
            warn!("Request logger failed: {:#}", e);
        }

        let response = self
            .rest
            .send_once(
                request.method.clone(),
                url,
                &request.body,
                request.format.content_type(),
            )
            .await?;

        let text = response.text();
        if let Err(e) = self.logger.log_response(response.status(), &text) {
            warn!("Response logger failed: {:#}", e);
        }

        if (200..300).contains(&response.status()) {
            Ok(response)
        } else {
            Err(EsbError::ApiError {
                status: response.status(),
                body: text,
            })
        }
    }
}
