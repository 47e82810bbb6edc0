//! UI Module - Ein-Button-Oberfläche für Calls
//!
//! Dieses Modul verwaltet:
//! - Seitenwahl anhand der Page-URL (Start oder Join)
//! - Beschriftung und Aktion des Call-Buttons
//! - Die Terminal-Oberfläche des Binaries

mod page;
mod shell;
mod terminal;

pub use page::{Page, JOIN_PATH};
pub use shell::{ButtonView, CallAction, CallShell};
pub use terminal::run_terminal;
