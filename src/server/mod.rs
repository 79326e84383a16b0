//! HTTP transport for the prediction service.

pub mod routes;

pub use routes::*;
