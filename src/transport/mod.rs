//! Transport implementations for the deposition API

pub mod http;

pub use http::HttpTransport;
