/// ESB center kernel - transport layer for signed requests
///
/// This module provides the service-agnostic pieces a signed request passes
/// through. The kernel contains only encoding, hashing and transport logic;
/// the envelope layout and the signature recipe live in
/// `exchanges::esbcenter`.
///
/// # Architecture
///
/// ## Encoding
/// - `BodyEncoder`: Field mapping to request body
/// - `XmlEncoder`: `<request>` XML bodies
///
/// ## Authentication
/// - `Signer`: Pluggable signature interface
/// - `DigestRegistry`: Closed name-to-digest registry (`md5`, `sha1`, `sha256`, `HMAC-SHA256`)
///
/// ## Transport
/// - `RestClient`: One HTTP exchange per call
/// - `ReqwestRest`: reqwest-backed `RestClient`
/// - `Transport`: Bounded retry and request/response logging around a `RestClient`
/// - `RequestLogger`: Logging collaborator (`TracingLogger` by default)
///
/// # Example
/// ```rust,no_run
/// use esbcenter::core::kernel::*;
/// use esbcenter::core::types::{BaseParams, BodyFormat, SignedRequest};
/// use reqwest::Method;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rest_config = RestClientConfig::new(
///     "http://exchange.highstore.cn/esbcenter/api/esb/".to_string(),
///     "esbcenter".to_string(),
/// );
/// let transport = Transport::new(RestClientBuilder::new(rest_config).build()?)
///     .with_retry_policy(RetryPolicy::new(3));
///
/// let mut params = BaseParams::new();
/// params.insert("method", "deliveryorder.create");
/// params.insert("sign", "0123456789ABCDEF");
///
/// let request = SignedRequest {
///     method: Method::POST,
///     params,
///     body: XmlEncoder::new().encode(&serde_json::json!({}), BodyFormat::Xml.header())?,
///     format: BodyFormat::Xml,
/// };
/// let response = transport.send(&request).await?;
/// println!("{}", response.text());
/// # Ok(())
/// # }
/// ```
pub mod codec;
pub mod logger;
pub mod rest;
pub mod signer;
pub mod transport;

// Re-export key types for convenience
pub use codec::{BodyEncoder, XmlEncoder};
pub use logger::{NoopLogger, RequestLogger, TracingLogger};
pub use rest::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{DigestFn, DigestRegistry, Signer};
pub use transport::{RetryPolicy, Transport};
