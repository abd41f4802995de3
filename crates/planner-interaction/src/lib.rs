//! Outbound HTTP for the study planner: the request gateway and the
//! authentication API built on it.

pub mod auth_api;
pub mod http;

pub use auth_api::HttpAuthApi;
pub use http::{HttpService, QueryParams, QueryValue, RequestConfig, UploadFile};
pub use reqwest::Method;
