//! iCoder HTTP server.
//!
//! Wires together the core collections, storage backend, session layer, and
//! HTTP routes into a running Axum server. Serves the rendered pages, the
//! contact/signup/login forms, and static assets under `/static`.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;
