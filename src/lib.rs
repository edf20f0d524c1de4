//! Embedded HTTP host for a CFML script engine.
//!
//! The crate is a thin bootstrap around axum/tokio: resolve CLI arguments
//! into an immutable configuration, start one listener for the process
//! lifetime, route the engine's URL patterns to it, gate the admin prefix
//! to loopback origins, and answer everything else with a static
//! placeholder page.

pub mod config;
pub mod engine;
pub mod error;
pub mod html;
pub mod params;
pub mod routes;
pub mod server;
