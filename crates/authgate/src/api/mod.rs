//! HTTP pipeline assembly.
//!
//! Wires the authentication gate in front of the upstream forwarder and
//! exposes the endpoints the proxy answers itself.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, UpstreamState};
