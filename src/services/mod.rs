//! Session access used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own storage and decoding concerns so route handlers can
//! stay focused on protocol translation.

pub mod php_session;
pub mod session;
