//! Transport layer for the Glider SDK.

pub mod http;
pub mod sse;

pub use http::HttpTransport;
