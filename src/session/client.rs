//! Session Client Trait
//!
//! Der Room-Client ist ein externer Baustein: Medienverhandlung, Codecs und
//! Transport liegen komplett bei ihm. Der Call-Manager sieht nur diese
//! schmale Schnittstelle.

use super::events::{RoomEvent, TrackInfo};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid room URL: {0}")]
    InvalidUrl(String),

    #[error("Room connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Not connected to a room")]
    NotConnected,

    #[error("Failed to send message: {0}")]
    SendFailed(String),
}

// ============================================================================
// ROOM OPTIONS
// ============================================================================

/// Einstellungen für die Mikrofon-Aufnahme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioCaptureOptions {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
}

/// Einstellungen für veröffentlichte Tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOptions {
    /// Discontinuous Transmission (Stille wird nicht gesendet)
    pub dtx: bool,
}

/// Optionen, mit denen ein neuer Room-Client erstellt wird
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomOptions {
    pub audio_capture: AudioCaptureOptions,
    pub publish: PublishOptions,
}

impl RoomOptions {
    /// Feste Optionen für Voice-Calls
    pub fn voice_call() -> Self {
        Self {
            audio_capture: AudioCaptureOptions {
                echo_cancellation: true,
                noise_suppression: false,
            },
            publish: PublishOptions { dtx: false },
        }
    }
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self::voice_call()
    }
}

// ============================================================================
// SESSION CLIENT
// ============================================================================

/// Room-Client für genau eine Verbindung
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Gibt einen Event-Receiver zurück
    fn subscribe(&self) -> broadcast::Receiver<RoomEvent>;

    /// Wärmt die Verbindung zum Room-Server vor (DNS, TLS)
    async fn prepare_connection(&self, url: &str, token: &str) -> Result<(), SessionError>;

    /// Verbindet mit dem Room
    async fn connect(&self, url: &str, token: &str) -> Result<(), SessionError>;

    /// Trennt die Verbindung
    async fn disconnect(&self) -> Result<(), SessionError>;

    /// Aktiviert oder deaktiviert das lokale Mikrofon
    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), SessionError>;

    /// Bindet einen Track an die Wiedergabe
    fn attach_track(&self, track: &TrackInfo);

    /// Löst einen Track von allen Wiedergabe-Elementen
    fn detach_track(&self, track: &TrackInfo);
}

/// Erzeugt pro Verbindungsversuch einen neuen Room-Client
pub trait SessionClientFactory: Send + Sync {
    fn create(&self, options: RoomOptions) -> Arc<dyn SessionClient>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_call_options() {
        let options = RoomOptions::default();

        assert!(options.audio_capture.echo_cancellation);
        assert!(!options.audio_capture.noise_suppression);
        assert!(!options.publish.dtx);
    }
}
