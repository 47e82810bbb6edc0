//! Session Module - Room-Client Abstraktion
//!
//! Dieses Modul beschreibt den externen Room-Client, über den der Call läuft:
//! - Trait für Verbindungsaufbau, Mikrofon und Track-Rendering
//! - Room-Events (Tracks, Teilnehmer, Verbindungsende)
//! - WebSocket-basierter Standard-Client
//!

mod client;
mod events;
mod ws_client;

pub use client::{
    AudioCaptureOptions, PublishOptions, RoomOptions, SessionClient, SessionClientFactory,
    SessionError,
};
pub use events::*;
pub use ws_client::{WsRoomClient, WsRoomClientFactory};
