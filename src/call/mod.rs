//! Call Module - Lebenszyklus eines Calls
//!
//! Dieses Modul verwaltet:
//! - Start über die Token-API und Join mit vorhandenen Zugangsdaten
//! - Den Call-Status (Idle, Connecting, Active)
//! - Reaktionen auf Room-Events (Tracks, Teilnehmer, Verbindungsende)

mod manager;

pub use manager::{CallError, CallEvent, CallSessionManager, CallState};
