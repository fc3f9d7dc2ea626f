//! Service infrastructure: stores, HTTP API, background sweeper and the
//! ambient configuration, logging and metrics layers.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod services;
pub mod sweeper;
