use super::builder::ApiClientBuilder;
use super::request::RequestBuilder;
use super::DELIVERY_ORDER_CREATE;
use crate::core::config::ClientConfig;
use crate::core::errors::EsbError;
use crate::core::kernel::{ReqwestRest, RestClient, Transport};
use crate::core::types::{RequestOptions, ResponseBody};
use serde::Serialize;
use tracing::instrument;

/// ESB center client: encodes, signs and sends requests
///
/// Holds no per-request state, so one client can serve concurrent callers.
pub struct ApiClient<R: RestClient = ReqwestRest> {
    requests: RequestBuilder,
    transport: Transport<R>,
}

impl<R: RestClient + Clone> Clone for ApiClient<R> {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
            transport: self.transport.clone(),
        }
    }
}

impl ApiClient<ReqwestRest> {
    /// Create a client with default transport settings
    ///
    /// The configuration is validated before any HTTP client is created.
    pub fn new(config: ClientConfig) -> Result<Self, EsbError> {
        ApiClientBuilder::new(config).build()
    }

    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }
}

impl<R: RestClient> ApiClient<R> {
    /// Create a client from already-built parts
    pub fn from_parts(requests: RequestBuilder, transport: Transport<R>) -> Self {
        Self {
            requests,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.requests.config()
    }

    pub fn transport(&self) -> &Transport<R> {
        &self.transport
    }

    /// Send `params` to `api_method` as a POST with an XML body signed with md5
    pub async fn request<P>(&self, api_method: &str, params: &P) -> Result<ResponseBody, EsbError>
    where
        P: Serialize + ?Sized,
    {
        self.request_with(api_method, params, &RequestOptions::default())
            .await
    }

    /// Send `params` to `api_method` with explicit options
    #[instrument(skip(self, params, options), fields(api_method = %api_method, method = %options.method))]
    pub async fn request_with<P>(
        &self,
        api_method: &str,
        params: &P,
        options: &RequestOptions,
    ) -> Result<ResponseBody, EsbError>
    where
        P: Serialize + ?Sized,
    {
        let fields = serde_json::to_value(params).map_err(|e| {
            EsbError::SerializationError(format!("Failed to serialize request fields: {}", e))
        })?;

        let request = self.requests.build(api_method, &fields, options)?;
        self.transport.send(&request).await
    }

    /// Create a delivery order (`deliveryorder.create`)
    pub async fn create_delivery_order<P>(&self, params: &P) -> Result<ResponseBody, EsbError>
    where
        P: Serialize + ?Sized,
    {
        self.request(DELIVERY_ORDER_CREATE, params).await
    }
}
