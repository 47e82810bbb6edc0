//! Token Module - Zugangsdaten für Room-Calls
//!
//! Dieses Modul holt Room-URL und Access-Token vom Backend:
//! - Request-/Response-Typen der Token-API
//! - HTTP-Client mit Organisations- und API-Key-Headern
//!

mod messages;
mod provider;

pub use messages::*;
pub use provider::{HttpTokenProvider, TokenError, TokenProvider};
