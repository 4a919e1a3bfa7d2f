use crate::core::config::ConfigError;
use crate::core::errors::EsbError;
use crate::core::types::BaseParams;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Digest function: `(key, payload) -> uppercase hex`.
///
/// Plain digests ignore `key`; keyed ones (HMAC) use it.
pub type DigestFn = fn(key: &[u8], payload: &[u8]) -> Result<String, EsbError>;

/// Signer trait for request authentication
///
/// Implementations compute the `sign` value for an envelope and body. Signing
/// must be byte-for-byte reproducible because the remote service recomputes it.
pub trait Signer: Send + Sync {
    /// Compute the signature for a request
    ///
    /// # Arguments
    /// * `params` - Envelope parameters, without `sign`
    /// * `body` - The encoded request body
    /// * `sign_method` - Name of the digest algorithm to use
    fn sign_request(
        &self,
        params: &BaseParams,
        body: &str,
        sign_method: &str,
    ) -> Result<String, EsbError>;
}

/// Closed registry mapping sign-method names to digest functions
///
/// Lookups are exact and case-sensitive. Unknown names fail with
/// `EsbError::UnsupportedAlgorithm`.
#[derive(Debug, Clone)]
pub struct DigestRegistry {
    entries: BTreeMap<String, DigestFn>,
}

impl Default for DigestRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("md5", md5_hex);
        registry.register("sha1", sha1_hex);
        registry.register("sha256", sha256_hex);
        registry.register("HMAC-SHA256", hmac_sha256_hex);
        registry
    }
}

impl DigestRegistry {
    /// Registry with no algorithms
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Shared registry with the standard algorithms
    pub fn standard() -> &'static Self {
        static STANDARD: OnceLock<DigestRegistry> = OnceLock::new();
        STANDARD.get_or_init(Self::default)
    }

    /// Register (or replace) an algorithm under `name`
    pub fn register(&mut self, name: impl Into<String>, digest: DigestFn) {
        self.entries.insert(name.into(), digest);
    }

    pub fn resolve(&self, name: &str) -> Result<DigestFn, EsbError> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| EsbError::UnsupportedAlgorithm(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }
}

pub fn md5_hex(_key: &[u8], payload: &[u8]) -> Result<String, EsbError> {
    Ok(hex::encode_upper(Md5::digest(payload)))
}

pub fn sha1_hex(_key: &[u8], payload: &[u8]) -> Result<String, EsbError> {
    Ok(hex::encode_upper(Sha1::digest(payload)))
}

pub fn sha256_hex(_key: &[u8], payload: &[u8]) -> Result<String, EsbError> {
    Ok(hex::encode_upper(Sha256::digest(payload)))
}

pub fn hmac_sha256_hex(key: &[u8], payload: &[u8]) -> Result<String, EsbError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(|_| {
        ConfigError::InvalidConfiguration("Invalid secret key for HMAC-SHA256".to_string())
    })?;
    mac.update(payload);
    Ok(hex::encode_upper(mac.finalize().into_bytes()))
}
