//! shortmint - a URL shortener core
//!
//! Turns long URLs into short codes and resolves them back, keeping a
//! consistent two-way mapping under concurrent create, lookup and delete.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line interface (default)
//!
//! # Architecture
//! - `generator`: Short code candidate strategies (random, counter, hash)
//! - `storage`: Sharded two-index mapping store, optional JSON snapshot
//! - `cache`: Redirect cache in front of the store
//! - `services`: Allocation service and the expiry sweeper
//! - `api`: HTTP handlers
//! - `config`: Configuration loading
//! - `runtime`: Startup, shutdown and execution modes
//! - `system`: Logging setup

#[cfg(feature = "server")]
pub mod api;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod generator;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
