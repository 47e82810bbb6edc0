//! Call Session Manager
//!
//! Vermittelt zwischen UI-Aktionen und dem Room-Client und hält den
//! Call-Status konsistent mit der tatsächlichen Verbindung.
//!
//! Zustände: `Idle` → `Connecting` → `Active` → `Idle`.
//! Jeder Verbindungsversuch bekommt eine eigene Generation; Events eines
//! abgelösten Room-Clients werden ignoriert.

use crate::session::{RoomEvent, RoomOptions, SessionClient, SessionClientFactory, SessionError};
use crate::token::{ConnectOptions, TokenError, TokenProvider};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone)]
pub enum CallError {
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Token fetch failed: {0}")]
    TokenFetch(#[from] TokenError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Already in a call")]
    AlreadyInCall,

    #[error("Call is still connecting")]
    ConnectInProgress,

    #[error("Room closed before the call was established")]
    SessionClosed,
}

// ============================================================================
// CALL STATE
// ============================================================================

/// Aktueller Status des Calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Kein aktiver Call
    Idle,
    /// Token-Abfrage oder Verbindungsaufbau läuft
    Connecting,
    /// Verbunden, Mikrofon aktiv
    Active,
}

/// Events die vom CallSessionManager ausgelöst werden
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    StateChanged(CallState),
    /// Fehler aus einem Hintergrund-Pfad, den kein Aufrufer sieht
    Error(String),
}

struct ActiveSession {
    id: u64,
    client: Arc<dyn SessionClient>,
}

struct SessionSlot {
    state: CallState,
    generation: u64,
    session: Option<ActiveSession>,
    /// Gegenstelle hat den Room während des Verbindungsaufbaus verlassen
    end_requested: bool,
}

// ============================================================================
// CALL SESSION MANAGER
// ============================================================================

/// Verwaltet genau einen Call zur Zeit
#[derive(Clone)]
pub struct CallSessionManager {
    slot: Arc<Mutex<SessionSlot>>,
    event_tx: broadcast::Sender<CallEvent>,
    token_provider: Arc<dyn TokenProvider>,
    client_factory: Arc<dyn SessionClientFactory>,
}

impl CallSessionManager {
    /// Erstellt einen neuen CallSessionManager
    pub fn new(
        token_provider: Arc<dyn TokenProvider>,
        client_factory: Arc<dyn SessionClientFactory>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        Self {
            slot: Arc::new(Mutex::new(SessionSlot {
                state: CallState::Idle,
                generation: 0,
                session: None,
                end_requested: false,
            })),
            event_tx,
            token_provider,
            client_factory,
        }
    }

    /// Gibt einen Event-Receiver zurück
    pub fn subscribe(&self) -> broadcast::Receiver<CallEvent> {
        self.event_tx.subscribe()
    }

    /// Gibt den aktuellen Call-Status zurück
    pub fn state(&self) -> CallState {
        self.slot.lock().state
    }

    /// `true` zwischen Start/Join und dem Ende des Calls
    pub fn is_call_ongoing(&self) -> bool {
        self.state() != CallState::Idle
    }

    /// `true` nur wenn die Verbindung steht
    pub fn is_connected(&self) -> bool {
        self.state() == CallState::Active
    }

    /// Prüft ob ein Room-Client gehalten wird
    pub fn has_session(&self) -> bool {
        self.slot.lock().session.is_some()
    }

    /// Startet einen Call über die Token-API
    pub async fn start_call(
        &self,
        organization_id: &str,
        use_case_id: &str,
    ) -> Result<(), CallError> {
        let id = self.begin_connect()?;
        tracing::info!(
            "Starting call (organization {}, use case {})",
            organization_id,
            use_case_id
        );

        let options = match self
            .token_provider
            .fetch_token(organization_id, use_case_id)
            .await
        {
            Ok(options) => options,
            Err(e) => {
                tracing::error!("Failed to get access token: {}", e);
                self.abort_connect(id);
                return Err(e.into());
            }
        };

        self.connect(id, options).await
    }

    /// Tritt einem Room mit vorhandenen Zugangsdaten bei
    ///
    /// Fehlende oder leere Parameter werden abgelehnt, bevor irgendeine
    /// Verbindung aufgebaut wird.
    pub async fn join_call(
        &self,
        room_url: Option<&str>,
        token: Option<&str>,
    ) -> Result<(), CallError> {
        let room_url = non_empty(room_url).ok_or(CallError::MissingParameter("room_url"))?;
        let token = non_empty(token).ok_or(CallError::MissingParameter("token"))?;

        let id = self.begin_connect()?;
        tracing::info!("Joining room {}", room_url);

        self.connect(id, ConnectOptions::new(room_url, token)).await
    }

    /// Beendet den aktuellen Call
    ///
    /// Ohne Call ist das ein No-op. Während des Verbindungsaufbaus wird
    /// abgelehnt. Der Room-Client wird auch bei Fehlern verworfen.
    pub async fn end_call(&self) -> Result<(), CallError> {
        let session = {
            let mut slot = self.slot.lock();
            let state = slot.state;
            match state {
                CallState::Idle => None,
                CallState::Connecting => return Err(CallError::ConnectInProgress),
                CallState::Active => slot.session.take(),
            }
        };

        let Some(session) = session else {
            tracing::debug!("No active room, nothing to end");
            return Ok(());
        };

        tracing::info!("Ending call");
        let result = session.client.disconnect().await;
        self.finish_session(session.id);

        if let Err(ref e) = result {
            tracing::error!("Failed to disconnect from room: {}", e);
        }
        result.map_err(CallError::from)
    }

    // ========================================================================
    // PRIVATE METHODS
    // ========================================================================

    /// `Idle` → `Connecting`, gibt die neue Generation zurück
    fn begin_connect(&self) -> Result<u64, CallError> {
        let id = {
            let mut slot = self.slot.lock();
            if slot.state != CallState::Idle {
                return Err(CallError::AlreadyInCall);
            }
            slot.state = CallState::Connecting;
            slot.generation += 1;
            slot.end_requested = false;
            slot.generation
        };

        self.emit_state(CallState::Connecting);
        Ok(id)
    }

    /// Rollt einen fehlgeschlagenen Verbindungsaufbau auf `Idle` zurück
    fn abort_connect(&self, id: u64) {
        let changed = {
            let mut slot = self.slot.lock();
            if slot.generation == id && slot.state == CallState::Connecting {
                slot.state = CallState::Idle;
                true
            } else {
                false
            }
        };

        if changed {
            self.emit_state(CallState::Idle);
        }
    }

    /// Setzt eine beendete Session auf `Idle`
    fn finish_session(&self, id: u64) {
        let (changed, session) = {
            let mut slot = self.slot.lock();
            if slot.generation == id && slot.state != CallState::Idle {
                slot.state = CallState::Idle;
                (true, slot.session.take())
            } else {
                (false, None)
            }
        };
        drop(session);

        if changed {
            self.emit_state(CallState::Idle);
        }
    }

    /// Gemeinsamer Verbindungsaufbau für Start und Join
    async fn connect(&self, id: u64, options: ConnectOptions) -> Result<(), CallError> {
        let client = self.client_factory.create(RoomOptions::voice_call());

        // Event Handler vor dem Connect registrieren
        self.spawn_event_listener(id, &client);

        if let Err(e) = Self::establish(client.as_ref(), &options).await {
            tracing::error!("Failed to connect to room: {}", e);
            if let Err(disconnect_err) = client.disconnect().await {
                tracing::warn!("Cleanup disconnect failed: {}", disconnect_err);
            }
            self.abort_connect(id);
            return Err(e.into());
        }

        let commit = {
            let mut slot = self.slot.lock();
            if slot.generation != id || slot.state != CallState::Connecting {
                Commit::Superseded
            } else if slot.end_requested {
                slot.end_requested = false;
                slot.state = CallState::Idle;
                Commit::Ended
            } else {
                slot.state = CallState::Active;
                slot.session = Some(ActiveSession {
                    id,
                    client: Arc::clone(&client),
                });
                Commit::Active
            }
        };

        match commit {
            Commit::Active => {}
            Commit::Ended => {
                tracing::info!("Participant left while connecting, ending call");
                self.emit_state(CallState::Idle);
                if let Err(e) = client.disconnect().await {
                    tracing::error!("Failed to disconnect from room: {}", e);
                }
                return Err(CallError::SessionClosed);
            }
            Commit::Superseded => {
                tracing::warn!("Room closed while connecting, dropping session");
                let _ = client.disconnect().await;
                return Err(CallError::SessionClosed);
            }
        }

        self.emit_state(CallState::Active);
        tracing::info!("Call active");
        Ok(())
    }

    async fn establish(
        client: &dyn SessionClient,
        options: &ConnectOptions,
    ) -> Result<(), SessionError> {
        client.prepare_connection(&options.url, &options.token).await?;
        client.connect(&options.url, &options.token).await?;
        client.set_microphone_enabled(true).await?;
        Ok(())
    }

    /// Startet den Event-Loop für einen Room-Client
    ///
    /// Der Loop hält den Client nur schwach und endet mit `Disconnected`
    /// oder wenn der Client verworfen wird.
    fn spawn_event_listener(&self, id: u64, client: &Arc<dyn SessionClient>) {
        let mut events = client.subscribe();
        let client = Arc::downgrade(client);
        let manager = self.clone();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(RoomEvent::Disconnected) => {
                        tracing::info!("Room disconnected");
                        manager.finish_session(id);
                        break;
                    }
                    Ok(event) => manager.handle_room_event(id, &client, event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Missed {} room events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    /// Verarbeitet Room-Events einer Session
    async fn handle_room_event(&self, id: u64, client: &Weak<dyn SessionClient>, event: RoomEvent) {
        let stale = self.slot.lock().generation != id;
        if stale {
            tracing::debug!("Ignoring event from stale room: {:?}", event);
            return;
        }

        match event {
            RoomEvent::TrackSubscribed(track) => {
                if track.kind.is_renderable() {
                    if let Some(client) = client.upgrade() {
                        client.attach_track(&track);
                    }
                }
            }

            RoomEvent::TrackUnsubscribed(track) => {
                if let Some(client) = client.upgrade() {
                    client.detach_track(&track);
                }
            }

            RoomEvent::LocalTrackUnpublished(publication) => {
                if let (Some(track), Some(client)) = (publication.track, client.upgrade()) {
                    client.detach_track(&track);
                }
            }

            RoomEvent::ParticipantDisconnected { identity } => {
                // Während des Aufbaus nur vormerken, `connect` beendet dann
                let deferred = {
                    let mut slot = self.slot.lock();
                    let connecting = slot.state == CallState::Connecting;
                    if connecting {
                        slot.end_requested = true;
                    }
                    connecting
                };
                if deferred {
                    tracing::info!("Participant {} left while connecting", identity);
                    return;
                }

                tracing::info!("Participant {} left, ending call", identity);
                if let Err(e) = self.end_call().await {
                    tracing::error!("Failed to end call after participant left: {}", e);
                    let _ = self.event_tx.send(CallEvent::Error(e.to_string()));
                }
            }

            RoomEvent::Disconnected => {}
        }
    }

    /// Sendet ein StateChanged-Event
    fn emit_state(&self, state: CallState) {
        tracing::debug!("Call state changed: {:?}", state);
        let _ = self.event_tx.send(CallEvent::StateChanged(state));
    }
}

/// Ergebnis des Commits nach einem erfolgreichen Connect
enum Commit {
    Active,
    Ended,
    Superseded,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl std::fmt::Debug for CallSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.lock();
        f.debug_struct("CallSessionManager")
            .field("state", &slot.state)
            .field("generation", &slot.generation)
            .field("has_session", &slot.session.is_some())
            .finish()
    }
}
