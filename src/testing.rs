//! Test-Doubles für Token-API und Room-Client

use crate::session::{
    RoomEvent, RoomOptions, SessionClient, SessionClientFactory, SessionError, TrackInfo,
};
use crate::token::{ConnectOptions, TokenError, TokenProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

/// Wartet bis `condition` erfüllt ist (max. ~2 Sekunden)
pub(crate) async fn wait_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

// ============================================================================
// TOKEN PROVIDER
// ============================================================================

pub(crate) struct MockTokenProvider {
    response: Result<ConnectOptions, TokenError>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTokenProvider {
    pub(crate) fn ok(url: &str, token: &str) -> Self {
        Self {
            response: Ok(ConnectOptions::new(url, token)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(error: TokenError) -> Self {
        Self {
            response: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn fetch_token(
        &self,
        organization_id: &str,
        use_case_id: &str,
    ) -> Result<ConnectOptions, TokenError> {
        self.calls
            .lock()
            .push((organization_id.to_string(), use_case_id.to_string()));
        self.response.clone()
    }
}

// ============================================================================
// SESSION CLIENT
// ============================================================================

/// Zeichnet alle Aufrufe als Strings auf
pub(crate) struct MockSessionClient {
    pub(crate) options: RoomOptions,
    calls: Mutex<Vec<String>>,
    event_tx: broadcast::Sender<RoomEvent>,
    connect_error: Option<SessionError>,
    gate: Option<Arc<Notify>>,
}

impl MockSessionClient {
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == call).count()
    }

    pub(crate) fn emit(&self, event: RoomEvent) {
        let _ = self.event_tx.send(event);
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl SessionClient for MockSessionClient {
    fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.event_tx.subscribe()
    }

    async fn prepare_connection(&self, url: &str, token: &str) -> Result<(), SessionError> {
        self.record(format!("prepare {url} {token}"));
        Ok(())
    }

    async fn connect(&self, url: &str, token: &str) -> Result<(), SessionError> {
        self.record(format!("connect {url} {token}"));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.connect_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn disconnect(&self) -> Result<(), SessionError> {
        self.record("disconnect".to_string());
        self.emit(RoomEvent::Disconnected);
        Ok(())
    }

    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        self.record(format!("microphone {enabled}"));
        Ok(())
    }

    fn attach_track(&self, track: &TrackInfo) {
        self.record(format!("attach {}", track.sid));
    }

    fn detach_track(&self, track: &TrackInfo) {
        self.record(format!("detach {}", track.sid));
    }
}

// ============================================================================
// FACTORY
// ============================================================================

pub(crate) struct MockFactory {
    clients: Mutex<Vec<Arc<MockSessionClient>>>,
    connect_error: Option<SessionError>,
    gate: Option<Arc<Notify>>,
}

impl MockFactory {
    pub(crate) fn new() -> Self {
        Self {
            clients: Mutex::new(Vec::new()),
            connect_error: None,
            gate: None,
        }
    }

    /// Jeder `connect` schlägt mit `error` fehl
    pub(crate) fn failing(error: SessionError) -> Self {
        Self {
            connect_error: Some(error),
            ..Self::new()
        }
    }

    /// Jeder `connect` wartet auf `release()`
    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::new()
        }
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub(crate) fn created(&self) -> usize {
        self.clients.lock().len()
    }

    pub(crate) fn client(&self, index: usize) -> Arc<MockSessionClient> {
        Arc::clone(&self.clients.lock()[index])
    }
}

impl SessionClientFactory for MockFactory {
    fn create(&self, options: RoomOptions) -> Arc<dyn SessionClient> {
        let (event_tx, _) = broadcast::channel(100);
        let client = Arc::new(MockSessionClient {
            options,
            calls: Mutex::new(Vec::new()),
            event_tx,
            connect_error: self.connect_error.clone(),
            gate: self.gate.clone(),
        });
        self.clients.lock().push(Arc::clone(&client));
        client
    }
}
