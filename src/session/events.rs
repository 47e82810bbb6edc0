//! Room Events und Track-Typen
//!
//! `RoomEvent` ist das, was der Call-Manager vom Room-Client sieht.
//! `RoomMessage` ist die JSON-Form, in der der Room-Server diese Events
//! über den WebSocket schickt.

use serde::{Deserialize, Serialize};

// ============================================================================
// TRACKS
// ============================================================================

/// Art eines Media-Tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Audio,
    Video,
    #[serde(other)]
    Unknown,
}

impl TrackKind {
    /// Nur Audio und Video werden gerendert
    pub fn is_renderable(self) -> bool {
        matches!(self, Self::Audio | Self::Video)
    }
}

/// Quelle eines lokalen Tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSource {
    Microphone,
    Camera,
    ScreenShare,
    #[serde(other)]
    Unknown,
}

/// Ein Media-Track im Room
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackInfo {
    pub sid: String,
    pub kind: TrackKind,
}

impl TrackInfo {
    pub fn new(sid: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            sid: sid.into(),
            kind,
        }
    }
}

/// Veröffentlichung eines lokalen Tracks
///
/// `track` ist `None`, wenn der Track bereits gestoppt wurde.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTrackPublication {
    pub sid: String,
    pub source: TrackSource,
    pub track: Option<TrackInfo>,
}

// ============================================================================
// ROOM EVENTS
// ============================================================================

/// Events die vom Room-Client ausgelöst werden
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// Remote-Track abonniert
    TrackSubscribed(TrackInfo),

    /// Remote-Track abbestellt
    TrackUnsubscribed(TrackInfo),

    /// Lokaler Track nicht mehr veröffentlicht
    LocalTrackUnpublished(LocalTrackPublication),

    /// Remote-Teilnehmer hat den Room verlassen
    ParticipantDisconnected { identity: String },

    /// Verbindung zum Room beendet
    Disconnected,
}

// ============================================================================
// SERVER → CLIENT MESSAGES
// ============================================================================

/// Nachrichten des Room-Servers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomMessage {
    TrackSubscribed {
        #[serde(rename = "trackSid")]
        track_sid: String,
        kind: TrackKind,
    },

    TrackUnsubscribed {
        #[serde(rename = "trackSid")]
        track_sid: String,
        kind: TrackKind,
    },

    ParticipantDisconnected { identity: String },

    /// Server beendet die Session
    Leave {
        #[serde(default)]
        reason: Option<String>,
    },
}

impl RoomMessage {
    /// Übersetzt die Nachricht in ein Room-Event
    ///
    /// `Leave` wird vom Client selbst als Verbindungsende behandelt.
    pub fn into_event(self) -> Option<RoomEvent> {
        match self {
            Self::TrackSubscribed { track_sid, kind } => {
                Some(RoomEvent::TrackSubscribed(TrackInfo::new(track_sid, kind)))
            }
            Self::TrackUnsubscribed { track_sid, kind } => {
                Some(RoomEvent::TrackUnsubscribed(TrackInfo::new(track_sid, kind)))
            }
            Self::ParticipantDisconnected { identity } => {
                Some(RoomEvent::ParticipantDisconnected { identity })
            }
            Self::Leave { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderable_kinds() {
        assert!(TrackKind::Audio.is_renderable());
        assert!(TrackKind::Video.is_renderable());
        assert!(!TrackKind::Unknown.is_renderable());
    }

    #[test]
    fn test_parse_room_messages() {
        let msg: RoomMessage =
            serde_json::from_str(r#"{"type":"track_subscribed","trackSid":"TR_1","kind":"audio"}"#)
                .unwrap();
        assert_eq!(
            msg.into_event(),
            Some(RoomEvent::TrackSubscribed(TrackInfo::new("TR_1", TrackKind::Audio)))
        );

        let msg: RoomMessage =
            serde_json::from_str(r#"{"type":"track_unsubscribed","trackSid":"TR_2","kind":"data"}"#)
                .unwrap();
        assert_eq!(
            msg.into_event(),
            Some(RoomEvent::TrackUnsubscribed(TrackInfo::new("TR_2", TrackKind::Unknown)))
        );

        let msg: RoomMessage =
            serde_json::from_str(r#"{"type":"participant_disconnected","identity":"agent"}"#)
                .unwrap();
        assert_eq!(
            msg.into_event(),
            Some(RoomEvent::ParticipantDisconnected {
                identity: "agent".to_string()
            })
        );

        let msg: RoomMessage = serde_json::from_str(r#"{"type":"leave"}"#).unwrap();
        assert_eq!(msg, RoomMessage::Leave { reason: None });
        assert_eq!(msg.into_event(), None);
    }

    #[test]
    fn test_unknown_message_type() {
        assert!(serde_json::from_str::<RoomMessage>(r#"{"type":"speaker_changed"}"#).is_err());
    }
}
