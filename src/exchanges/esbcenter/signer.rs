use crate::core::errors::EsbError;
use crate::core::kernel::rest::build_query_string;
use crate::core::kernel::{DigestRegistry, Signer};
use crate::core::types::BaseParams;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;

/// Canonical form of the envelope used for signing.
///
/// Parameters are sorted by key, form-encoded as `k=v` pairs and joined with
/// no delimiter at all. The server strips the `&` separators the same way, so
/// this must not be "fixed".
pub fn canonical_query(params: &BaseParams) -> String {
    build_query_string(params.sorted()).replace('&', "")
}

/// Compute the uppercase hex signature for an envelope and body
///
/// The digest input is `secret + canonical_query(params) + body + secret`.
/// `algorithm` is looked up in the standard `DigestRegistry`.
pub fn sign(
    params: &BaseParams,
    secret_key: &str,
    body: &str,
    algorithm: &str,
) -> Result<String, EsbError> {
    sign_with_registry(DigestRegistry::standard(), params, secret_key, body, algorithm)
}

pub fn sign_with_registry(
    registry: &DigestRegistry,
    params: &BaseParams,
    secret_key: &str,
    body: &str,
    algorithm: &str,
) -> Result<String, EsbError> {
    let digest = registry.resolve(algorithm)?;
    let payload = format!(
        "{}{}{}{}",
        secret_key,
        canonical_query(params),
        body,
        secret_key
    );
    digest(secret_key.as_bytes(), payload.as_bytes())
}

/// `Signer` for the ESB center envelope
pub struct EsbSigner {
    secret: Secret<String>,
    registry: Arc<DigestRegistry>,
}

impl EsbSigner {
    pub fn new(secret: String) -> Self {
        Self::with_registry(secret, Arc::new(DigestRegistry::default()))
    }

    pub fn with_registry(secret: String, registry: Arc<DigestRegistry>) -> Self {
        Self {
            secret: Secret::new(secret),
            registry,
        }
    }
}

impl Signer for EsbSigner {
    fn sign_request(
        &self,
        params: &BaseParams,
        body: &str,
        sign_method: &str,
    ) -> Result<String, EsbError> {
        sign_with_registry(
            &self.registry,
            params,
            self.secret.expose_secret(),
            body,
            sign_method,
        )
    }
}
