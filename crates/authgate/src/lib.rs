//! Authgate Library
//!
//! Request-time authentication gate for a reverse proxy: every inbound
//! request is checked against an exempt-path registry and a signed session
//! credential, mutated accordingly, and forwarded to the configured
//! upstream.

pub mod api;
pub mod auth;
pub mod discovery;
pub mod proxy;
