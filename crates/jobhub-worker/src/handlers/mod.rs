//! Built-in job handlers.

pub mod http;

pub use http::HttpDelegateHandler;
