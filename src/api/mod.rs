//! HTTP boundary
//!
//! Thin actix-web handlers that translate requests into service calls and
//! service errors into status codes.

pub mod services;

pub use services::{AppStartTime, app_routes};
