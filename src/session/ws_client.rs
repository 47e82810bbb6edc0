//! WebSocket Room-Client
//!
//! Standard-Implementierung des Session Clients:
//! - WebSocket-Verbindung zum Room-Server aufbauen und halten
//! - Room-Nachrichten parsen und als Events weiterleiten
//! - Mikrofon-Publication und gerenderte Tracks verwalten
//!
//! Medien selbst (RTP, Codecs) werden hier nicht verarbeitet.

use super::client::{RoomOptions, SessionClient, SessionClientFactory, SessionError};
use super::events::{
    LocalTrackPublication, RoomEvent, RoomMessage, TrackInfo, TrackKind, TrackSource,
};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

// ============================================================================
// URL HELPERS
// ============================================================================

/// Baut die WebSocket-URL für den Room-Endpoint
pub(crate) fn rtc_url(url: &str, token: &str) -> Result<Url, SessionError> {
    let mut rtc = Url::parse(url).map_err(|e| SessionError::InvalidUrl(e.to_string()))?;

    let scheme = match rtc.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => return Err(SessionError::InvalidUrl(format!("unsupported scheme: {other}"))),
    };
    rtc.set_scheme(scheme)
        .map_err(|_| SessionError::InvalidUrl(url.to_string()))?;

    rtc.path_segments_mut()
        .map_err(|_| SessionError::InvalidUrl(url.to_string()))?
        .pop_if_empty()
        .push("rtc");

    rtc.query_pairs_mut()
        .clear()
        .append_pair("access_token", token)
        .append_pair("auto_subscribe", "1");

    Ok(rtc)
}

/// Übersetzt eine Room-URL in die HTTP-Variante
pub(crate) fn http_url(url: &str) -> Result<Url, SessionError> {
    let mut http = Url::parse(url).map_err(|e| SessionError::InvalidUrl(e.to_string()))?;

    let scheme = match http.scheme() {
        "ws" | "http" => "http",
        "wss" | "https" => "https",
        other => return Err(SessionError::InvalidUrl(format!("unsupported scheme: {other}"))),
    };
    http.set_scheme(scheme)
        .map_err(|_| SessionError::InvalidUrl(url.to_string()))?;

    Ok(http)
}

// ============================================================================
// CLIENT STATE
// ============================================================================

#[derive(Debug, Default)]
struct ClientState {
    is_connected: bool,
    microphone: Option<LocalTrackPublication>,
    attached: HashSet<String>,
}

// ============================================================================
// WS ROOM CLIENT
// ============================================================================

/// Room-Client über WebSocket
pub struct WsRoomClient {
    options: RoomOptions,
    http: reqwest::Client,
    state: Arc<RwLock<ClientState>>,
    tx: Mutex<Option<mpsc::Sender<Message>>>,
    event_tx: broadcast::Sender<RoomEvent>,
}

impl WsRoomClient {
    /// Erstellt einen neuen WsRoomClient
    pub fn new(options: RoomOptions) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        Self {
            options,
            http: reqwest::Client::new(),
            state: Arc::new(RwLock::new(ClientState::default())),
            tx: Mutex::new(None),
            event_tx,
        }
    }

    /// Optionen, mit denen der Client erstellt wurde
    pub fn options(&self) -> RoomOptions {
        self.options
    }

    /// Prüft ob verbunden
    pub fn is_connected(&self) -> bool {
        self.state.read().is_connected
    }

    /// Prüft ob das Mikrofon veröffentlicht ist
    pub fn is_microphone_enabled(&self) -> bool {
        self.state.read().microphone.is_some()
    }

    /// Prüft ob ein Track gerade gerendert wird
    pub fn is_attached(&self, track_sid: &str) -> bool {
        self.state.read().attached.contains(track_sid)
    }

    /// Verarbeitet eine Text-Nachricht des Servers
    ///
    /// Gibt `false` zurück, wenn der Server die Session beendet.
    fn handle_server_message(text: &str, event_tx: &broadcast::Sender<RoomEvent>) -> bool {
        match serde_json::from_str::<RoomMessage>(text) {
            Ok(RoomMessage::Leave { reason }) => {
                tracing::info!("Room server requested leave (reason: {:?})", reason);
                false
            }
            Ok(msg) => {
                if let Some(event) = msg.into_event() {
                    let _ = event_tx.send(event);
                }
                true
            }
            Err(e) => {
                tracing::debug!("Ignoring room message: {}", e);
                true
            }
        }
    }
}

#[async_trait]
impl SessionClient for WsRoomClient {
    fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.event_tx.subscribe()
    }

    async fn prepare_connection(&self, url: &str, _token: &str) -> Result<(), SessionError> {
        let http = http_url(url)?;

        // Nur Vorwärmen: Fehler hier verhindern den Connect nicht
        match self.http.head(http.clone()).send().await {
            Ok(response) => {
                tracing::debug!("Prepared connection to {} ({})", http, response.status());
            }
            Err(e) => {
                tracing::warn!("Could not prepare connection to {}: {}", http, e);
            }
        }

        Ok(())
    }

    async fn connect(&self, url: &str, token: &str) -> Result<(), SessionError> {
        if self.is_connected() {
            tracing::debug!("Room already connected");
            return Ok(());
        }

        let ws_url = rtc_url(url, token)?;
        tracing::info!("Connecting to room: {}", url);

        let (ws_stream, _) = connect_async(ws_url.as_str())
            .await
            .map_err(|e| SessionError::ConnectionFailed(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        // Message-Sender erstellen
        let (tx, mut rx) = mpsc::channel::<Message>(100);
        let close_tx = tx.clone();
        *self.tx.lock() = Some(tx);

        self.state.write().is_connected = true;

        // Read-Task starten
        let state = Arc::clone(&self.state);
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            while let Some(msg_result) = read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        if !Self::handle_server_message(&text, &event_tx) {
                            // Leave mit Close-Frame bestätigen
                            let _ = close_tx.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Ok(Message::Binary(data)) => {
                        tracing::trace!("Skipping {} bytes of binary room data", data.len());
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("Room connection closed by server");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("Room connection error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }

            // Nur melden, wenn nicht bereits lokal getrennt wurde
            let was_connected = {
                let mut s = state.write();
                let was_connected = s.is_connected;
                s.is_connected = false;
                s.microphone = None;
                s.attached.clear();
                was_connected
            };
            if was_connected {
                let _ = event_tx.send(RoomEvent::Disconnected);
            }
        });

        // Write-Task starten
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let is_close = matches!(msg, Message::Close(_));
                if let Err(e) = write.send(msg).await {
                    tracing::error!("Failed to send room message: {}", e);
                    break;
                }
                if is_close {
                    break;
                }
            }
        });

        tracing::info!("Connected to room");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SessionError> {
        let tx = self.tx.lock().take();

        let (was_connected, microphone) = {
            let mut s = self.state.write();
            let was_connected = s.is_connected;
            s.is_connected = false;
            s.attached.clear();
            (was_connected, s.microphone.take())
        };

        if !was_connected {
            return Ok(());
        }

        let result = match tx {
            Some(tx) => tx
                .send(Message::Close(None))
                .await
                .map_err(|e| SessionError::SendFailed(e.to_string())),
            None => Ok(()),
        };

        // Lokal ist die Verbindung in jedem Fall beendet
        if let Some(publication) = microphone {
            let _ = self.event_tx.send(RoomEvent::LocalTrackUnpublished(publication));
        }
        let _ = self.event_tx.send(RoomEvent::Disconnected);

        match &result {
            Ok(()) => tracing::info!("Disconnected from room"),
            Err(e) => tracing::warn!("Disconnected from room without close frame: {}", e),
        }
        result
    }

    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        let unpublished = {
            let mut s = self.state.write();
            if !s.is_connected {
                return Err(SessionError::NotConnected);
            }

            if enabled {
                if s.microphone.is_none() {
                    let sid = format!("TR_{}", uuid::Uuid::new_v4().simple());
                    tracing::info!(
                        "Publishing microphone {} (echo cancellation: {}, noise suppression: {}, dtx: {})",
                        sid,
                        self.options.audio_capture.echo_cancellation,
                        self.options.audio_capture.noise_suppression,
                        self.options.publish.dtx
                    );
                    s.microphone = Some(LocalTrackPublication {
                        sid: sid.clone(),
                        source: TrackSource::Microphone,
                        track: Some(TrackInfo::new(sid, TrackKind::Audio)),
                    });
                }
                None
            } else {
                s.microphone.take()
            }
        };

        if let Some(publication) = unpublished {
            tracing::info!("Unpublished microphone {}", publication.sid);
            let _ = self.event_tx.send(RoomEvent::LocalTrackUnpublished(publication));
        }

        Ok(())
    }

    fn attach_track(&self, track: &TrackInfo) {
        if self.state.write().attached.insert(track.sid.clone()) {
            tracing::info!("Attached {:?} track {}", track.kind, track.sid);
        }
    }

    fn detach_track(&self, track: &TrackInfo) {
        if self.state.write().attached.remove(&track.sid) {
            tracing::info!("Detached {:?} track {}", track.kind, track.sid);
        }
    }
}

impl std::fmt::Debug for WsRoomClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsRoomClient")
            .field("options", &self.options)
            .field("state", &*self.state.read())
            .finish()
    }
}

/// Factory für WsRoomClients
#[derive(Debug, Default, Clone, Copy)]
pub struct WsRoomClientFactory;

impl SessionClientFactory for WsRoomClientFactory {
    fn create(&self, options: RoomOptions) -> Arc<dyn SessionClient> {
        Arc::new(WsRoomClient::new(options))
    }
}
