//! Session-gated welcome page.
//!
//! Serves a static welcome document to clients holding a logged-in session
//! and redirects everyone else to the login page. Sessions are owned by an
//! external login flow; this crate only reads them.

pub mod config;
pub mod routes;
pub mod services;
pub mod state;
