//! HTTP gateway: configuration, routing, auth middleware and provider wiring.

pub mod app;
pub mod config;
pub mod middleware;
