pub mod builder;
pub mod client;
pub mod request;
pub mod signer;

use crate::core::config::ClientConfig;
use crate::core::errors::EsbError;
use crate::core::kernel::ReqwestRest;

// Re-export main types for easier importing
pub use builder::ApiClientBuilder;
pub use client::ApiClient;
pub use request::{current_timestamp, RequestBuilder, TIMESTAMP_FORMAT};
pub use signer::{canonical_query, sign, EsbSigner};

/// Production endpoint of the ESB center service
pub const BASE_URL: &str = "http://exchange.highstore.cn/esbcenter/api/esb/";

/// Service name used in logs and tracing spans
pub const SERVICE_NAME: &str = "esbcenter";

/// API method for creating a delivery order
pub const DELIVERY_ORDER_CREATE: &str = "deliveryorder.create";

/// Create an ESB center client with default transport settings
pub fn create_esbcenter_client(config: ClientConfig) -> Result<ApiClient<ReqwestRest>, EsbError> {
    ApiClient::new(config)
}
