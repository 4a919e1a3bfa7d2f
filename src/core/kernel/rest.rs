use crate::core::config::ConfigError;
use crate::core::errors::EsbError;
use crate::core::types::{BaseParams, ResponseBody};
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};
use std::time::Duration;
use tracing::{instrument, trace};

/// Characters left as-is by form encoding; everything else is `%XX`
const FORM_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// REST client trait for issuing a single HTTP exchange
///
/// Retries and logging live in `Transport`; implementations only perform one
/// attempt and report any HTTP response, whatever its status, as `Ok`.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Base URL requests are sent to
    fn base_url(&self) -> &Url;

    /// Perform one HTTP exchange
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `url` - Full URL, query included
    /// * `body` - Request body
    /// * `content_type` - Value for the `Content-Type` header
    async fn send_once(
        &self,
        method: Method,
        url: &Url,
        body: &str,
        content_type: &str,
    ) -> Result<ResponseBody, EsbError>;
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Service name for logging and tracing
    pub service_name: String,
    /// Per-attempt request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

impl RestClientConfig {
    /// Create a new configuration
    ///
    /// # Arguments
    /// * `base_url` - Base URL for the API
    /// * `service_name` - Name of the service
    pub fn new(base_url: String, service_name: String) -> Self {
        Self {
            base_url,
            service_name,
            timeout_seconds: 30,
            user_agent: format!("esbcenter/{}", env!("CARGO_PKG_VERSION")),
            accept_invalid_certs: true,
        }
    }

    /// Set the per-attempt request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Enable or disable TLS certificate verification
    pub fn with_accept_invalid_certs(mut self, accept_invalid_certs: bool) -> Self {
        self.accept_invalid_certs = accept_invalid_certs;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
}

impl RestClientBuilder {
    /// Create a new builder with the given configuration
    pub fn new(config: RestClientConfig) -> Self {
        Self { config }
    }

    /// Build the REST client
    ///
    /// Fails with a configuration error if the base URL does not parse or the
    /// HTTP client cannot be created.
    pub fn build(self) -> Result<ReqwestRest, EsbError> {
        let base_url = Url::parse(&self.config.base_url).map_err(|e| {
            ConfigError::InvalidConfiguration(format!(
                "Invalid base URL '{}': {}",
                self.config.base_url, e
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .danger_accept_invalid_certs(self.config.accept_invalid_certs)
            .build()
            .map_err(|e| {
                ConfigError::InvalidConfiguration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            base_url,
            config: self.config,
        })
    }
}

/// Implementation of `RestClient` using reqwest
///
/// Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    base_url: Url,
    config: RestClientConfig,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[instrument(skip(self, body), fields(service = %self.config.service_name, method = %method))]
    async fn send_once(
        &self,
        method: Method,
        url: &Url,
        body: &str,
        content_type: &str,
    ) -> Result<ResponseBody, EsbError> {
        let response = self
            .client
            .request(method, url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body.to_owned())
            .send()
            .await?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        trace!(status, len = bytes.len(), "Received response");

        Ok(ResponseBody::new(status, bytes))
    }
}

/// Form-encode a string: `A-Z a-z 0-9 - _ .` are kept, space becomes `+`,
/// every other byte is `%XX` (uppercase)
pub fn form_urlencode(input: &str) -> String {
    utf8_percent_encode(input, FORM_UNRESERVED)
        .to_string()
        .replace("%20", "+")
}

/// Create `k1=v1&k2=v2` from pairs, form-encoding each key and value
pub fn build_query_string<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", form_urlencode(k), form_urlencode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Full request URL for a set of envelope parameters
///
/// The assembled query string is form-encoded once more as a whole before
/// it is attached, so `=` and `&` travel as `%3D` and `%26`.
pub fn request_url(base_url: &Url, params: &BaseParams) -> Url {
    let query = form_urlencode(&build_query_string(params.iter()));
    let mut url = base_url.clone();
    url.set_query(Some(&query));
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_urlencode() {
        assert_eq!(form_urlencode("abc-_.XYZ09"), "abc-_.XYZ09");
        assert_eq!(form_urlencode("2024-01-01 00:00:00"), "2024-01-01+00%3A00%3A00");
        assert_eq!(form_urlencode("a&b=c*~/"), "a%26b%3Dc%2A%7E%2F");
        assert_eq!(form_urlencode("订单"), "%E8%AE%A2%E5%8D%95");
        assert_eq!(form_urlencode("100%"), "100%25");
    }

    #[test]
    fn test_build_query_string() {
        let query = build_query_string([("method", "a.b"), ("note", "x y")]);
        assert_eq!(query, "method=a.b&note=x+y");
        assert_eq!(build_query_string(std::iter::empty()), "");
    }

    #[test]
    fn test_request_url_double_encodes_query() {
        let base = Url::parse("http://exchange.example.com/esbcenter/api/esb/").unwrap();
        let params: BaseParams = [("method", "deliveryorder.create"), ("timestamp", "2024-01-01 00:00:00")]
            .into_iter()
            .collect();

        let url = request_url(&base, &params);
        assert_eq!(url.path(), "/esbcenter/api/esb/");
        assert_eq!(
            url.query(),
            Some("method%3Ddeliveryorder.create%26timestamp%3D2024-01-01%2B00%253A00%253A00")
        );
    }

    #[test]
    fn test_builder_rejects_bad_base_url() {
        let result = RestClientBuilder::new(RestClientConfig::new(
            "not a url".to_string(),
            "esbcenter".to_string(),
        ))
        .build();

        assert!(matches!(
            result,
            Err(EsbError::ConfigurationError(ConfigError::InvalidConfiguration(_)))
        ));
    }

    #[test]
    fn test_builder_applies_config() {
        let rest = RestClientBuilder::new(
            RestClientConfig::new("http://localhost:8080/esb/".to_string(), "esbcenter".to_string())
                .with_timeout(5)
                .with_user_agent("wms-bridge/2.1".to_string())
                .with_accept_invalid_certs(false),
        )
        .build()
        .unwrap();

        assert_eq!(rest.base_url().as_str(), "http://localhost:8080/esb/");
        assert_eq!(rest.config().timeout_seconds, 5);
        assert_eq!(rest.config().user_agent, "wms-bridge/2.1");
        assert!(!rest.config().accept_invalid_certs);
    }
}
