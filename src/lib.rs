//! Kabu - market analysis gateway
//!
//! Classifies inbound analysis requests, calls a generative-AI endpoint
//! with a retry policy for rate limiting, and normalizes what comes back
//! into JSON or text results.

pub mod analysis;
pub mod api;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod resilience;
pub mod upstream;
