use crate::core::config::ClientConfig;
use crate::core::errors::EsbError;
use crate::core::kernel::{BodyEncoder, Signer, XmlEncoder};
use crate::core::types::{BaseParams, BodyFormat, RequestOptions, SignedRequest};
use chrono::Local;
use serde_json::Value;
use std::sync::Arc;
use tracing::{instrument, trace};

/// Textual timestamp layout expected by the service
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in `TIMESTAMP_FORMAT`
pub fn current_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Assembles signed requests: encodes the body, builds the envelope and
/// attaches `sign`. Performs no I/O.
#[derive(Clone)]
pub struct RequestBuilder {
    config: ClientConfig,
    signer: Arc<dyn Signer>,
    xml: XmlEncoder,
}

impl RequestBuilder {
    pub fn new(config: ClientConfig, signer: Arc<dyn Signer>) -> Self {
        Self {
            config,
            signer,
            xml: XmlEncoder::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a signed request stamped with the current time
    pub fn build(
        &self,
        api_method: &str,
        params: &Value,
        options: &RequestOptions,
    ) -> Result<SignedRequest, EsbError> {
        self.build_at(api_method, params, options, &current_timestamp())
    }

    /// Build a signed request with an explicit timestamp
    ///
    /// # Arguments
    /// * `api_method` - Service method name, e.g. `deliveryorder.create`
    /// * `params` - Business payload encoded into the body
    /// * `options` - HTTP method, body format and sign method
    /// * `timestamp` - Value for the `timestamp` parameter
    #[instrument(skip(self, params, options), fields(sign_method = %options.sign_method))]
    pub fn build_at(
        &self,
        api_method: &str,
        params: &Value,
        options: &RequestOptions,
        timestamp: &str,
    ) -> Result<SignedRequest, EsbError> {
        let format: BodyFormat = options.format.parse()?;
        let body = self.encode_body(format, params)?;

        let mut base = BaseParams::new();
        base.insert("method", api_method);
        base.insert("timestamp", timestamp);
        base.insert("format", format.as_str());
        base.insert("app_key", self.config.app_key());
        base.insert("v", self.config.version());
        base.insert("sign_method", options.sign_method.as_str());
        base.insert("customerId", self.config.customer_id());

        let sign = self
            .signer
            .sign_request(&base, &body, &options.sign_method)?;
        trace!(%sign, "Signed request");
        base.insert("sign", sign);

        Ok(SignedRequest {
            method: options.method.clone(),
            params: base,
            body,
            format,
        })
    }

    fn encode_body(&self, format: BodyFormat, params: &Value) -> Result<String, EsbError> {
        match format {
            BodyFormat::Xml => self.xml.encode(params, format.header()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::esbcenter::signer::{sign, EsbSigner};
    use reqwest::Method;
    use serde_json::json;

    fn builder() -> RequestBuilder {
        let config = ClientConfig::new("k1", "c1", "s3cr3t").unwrap();
        RequestBuilder::new(config, Arc::new(EsbSigner::new("s3cr3t".to_string())))
    }

    #[test]
    fn test_envelope_layout() {
        let request = builder()
            .build_at(
                "deliveryorder.create",
                &json!({}),
                &RequestOptions::default(),
                "2024-01-01 00:00:00",
            )
            .unwrap();

        let keys: Vec<_> = request.params.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "method",
                "timestamp",
                "format",
                "app_key",
                "v",
                "sign_method",
                "customerId",
                "sign"
            ]
        );
        assert_eq!(request.params.get("v"), Some("1.0"));
        assert_eq!(request.params.get("format"), Some("xml"));
        assert_eq!(request.method, Method::POST);
        assert_eq!(
            request.body,
            r#"<?xml version="1.0" encoding="utf-8"?><request></request>"#
        );
    }

    #[test]
    fn test_sign_covers_envelope_and_body() {
        let request = builder()
            .build_at(
                "deliveryorder.create",
                &json!({"deliveryOrderCode": "DO-1"}),
                &RequestOptions::default(),
                "2024-01-01 00:00:00",
            )
            .unwrap();

        let mut unsigned: BaseParams = request
            .params
            .iter()
            .filter(|(k, _)| *k != "sign")
            .collect();
        let expected = sign(&unsigned, "s3cr3t", &request.body, "md5").unwrap();
        assert_eq!(request.params.get("sign"), Some(expected.as_str()));

        unsigned.insert("timestamp", "2024-01-01 00:00:01");
        let other = sign(&unsigned, "s3cr3t", &request.body, "md5").unwrap();
        assert_ne!(request.params.get("sign"), Some(other.as_str()));
    }

    #[test]
    fn test_options_flow_into_envelope() {
        let options = RequestOptions::default()
            .with_method(Method::PUT)
            .with_sign_method("HMAC-SHA256");
        let request = builder()
            .build_at("entryorder.create", &json!({}), &options, "2024-01-01 00:00:00")
            .unwrap();

        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.params.get("method"), Some("entryorder.create"));
        assert_eq!(request.params.get("sign_method"), Some("HMAC-SHA256"));
        assert_eq!(request.params.get("sign").map(str::len), Some(64));
    }

    #[test]
    fn test_failures_are_reported() {
        let builder = builder();

        let unknown_sign = RequestOptions::default().with_sign_method("crc32");
        assert!(matches!(
            builder.build("deliveryorder.create", &json!({}), &unknown_sign),
            Err(EsbError::UnsupportedAlgorithm(_))
        ));

        let unknown_format = RequestOptions::default().with_format("json");
        assert!(matches!(
            builder.build("deliveryorder.create", &json!({}), &unknown_format),
            Err(EsbError::SerializationError(_))
        ));

        assert!(matches!(
            builder.build("deliveryorder.create", &json!("text"), &RequestOptions::default()),
            Err(EsbError::SerializationError(_))
        ));
    }

    #[test]
    fn test_current_timestamp_layout() {
        let ts = current_timestamp();
        assert_eq!(ts.len(), 19);
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
    }
}
