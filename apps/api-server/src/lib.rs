//! # Yatube API Server
//!
//! Actix-web application: configuration, shared state, middleware and the
//! `/api/v1` handlers. The binary in `main.rs` only wires these together.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;
