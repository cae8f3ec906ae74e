//! Tabula server library.
//!
//! Exposes the configuration, logging, middleware, and lifecycle modules so
//! integration tests can assemble the same application the binary runs.

pub mod config;
pub mod lifecycle;
pub mod logging;
pub mod middleware;
