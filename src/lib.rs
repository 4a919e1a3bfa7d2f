pub mod core;
pub mod exchanges;

pub use core::{
    config::ClientConfig,
    errors::EsbError,
    types::{BaseParams, RequestOptions, ResponseBody, SignedRequest},
};
pub use exchanges::esbcenter::{ApiClient, ApiClientBuilder};
