//! Call-Button
//!
//! Zeigt genau einen Button, abhängig vom Call-Status und der Seite.
//! Einziger eigener Zustand ist das Loading-Flag während eines Joins.

use super::page::Page;
use crate::call::{CallError, CallSessionManager, CallState};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Aktion hinter dem Button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallAction {
    Start,
    Join,
    End,
    /// Button ist deaktiviert
    Wait,
}

/// Was gerade angezeigt wird
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonView {
    pub label: &'static str,
    pub action: CallAction,
}

impl ButtonView {
    pub fn is_enabled(&self) -> bool {
        self.action != CallAction::Wait
    }
}

impl fmt::Display for ButtonView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_enabled() {
            write!(f, "[ {} ]", self.label)
        } else {
            write!(f, "( {} )", self.label)
        }
    }
}

/// Oberfläche für eine Seite, mit injiziertem Call-Manager
pub struct CallShell {
    manager: CallSessionManager,
    page: Page,
    join_loading: AtomicBool,
}

impl CallShell {
    pub fn new(manager: CallSessionManager, page: Page) -> Self {
        Self {
            manager,
            page,
            join_loading: AtomicBool::new(false),
        }
    }

    pub fn manager(&self) -> &CallSessionManager {
        &self.manager
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Aktueller Button
    pub fn view(&self) -> ButtonView {
        let loading = self.join_loading.load(Ordering::SeqCst);

        match (self.manager.state(), &self.page) {
            (CallState::Active, _) => ButtonView {
                label: "End Call",
                action: CallAction::End,
            },
            (CallState::Connecting, Page::Start { .. }) => ButtonView {
                label: "Connecting...",
                action: CallAction::Wait,
            },
            (CallState::Connecting, Page::Join { .. }) => ButtonView {
                label: "Loading...",
                action: CallAction::Wait,
            },
            (CallState::Idle, Page::Start { .. }) => ButtonView {
                label: "Start Call",
                action: CallAction::Start,
            },
            (CallState::Idle, Page::Join { .. }) if loading => ButtonView {
                label: "Loading...",
                action: CallAction::Wait,
            },
            (CallState::Idle, Page::Join { .. }) => ButtonView {
                label: "Join",
                action: CallAction::Join,
            },
        }
    }

    /// Führt die Aktion des aktuellen Buttons aus
    ///
    /// Fehler werden nicht abgefangen, sondern an den Aufrufer gegeben.
    pub async fn press(&self) -> Result<(), CallError> {
        match self.view().action {
            CallAction::Start => {
                let Page::Start {
                    organization_id,
                    use_case_id,
                } = &self.page
                else {
                    return Ok(());
                };
                self.manager.start_call(organization_id, use_case_id).await
            }
            CallAction::Join => {
                let Page::Join { room_url, token } = &self.page else {
                    return Ok(());
                };
                self.join_loading.store(true, Ordering::SeqCst);
                let result = self
                    .manager
                    .join_call(room_url.as_deref(), token.as_deref())
                    .await;
                self.join_loading.store(false, Ordering::SeqCst);
                result
            }
            CallAction::End => self.manager.end_call().await,
            CallAction::Wait => {
                tracing::debug!("Button disabled, ignoring press");
                Ok(())
            }
        }
    }
}

impl fmt::Debug for CallShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallShell")
            .field("page", &self.page)
            .field("view", &self.view())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{RoomEvent, SessionClientFactory};
    use crate::testing::{wait_until, MockFactory, MockTokenProvider};
    use crate::token::TokenProvider;
    use std::sync::Arc;

    fn shell(page: Page, factory: &Arc<MockFactory>) -> CallShell {
        let manager = CallSessionManager::new(
            Arc::new(MockTokenProvider::ok("wss://x", "t")) as Arc<dyn TokenProvider>,
            Arc::clone(factory) as Arc<dyn SessionClientFactory>,
        );
        CallShell::new(manager, page)
    }

    fn start_page() -> Page {
        Page::Start {
            organization_id: "org-1".to_string(),
            use_case_id: "uc-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_start_and_end() {
        let factory = Arc::new(MockFactory::new());
        let shell = shell(start_page(), &factory);

        assert_eq!(shell.view().label, "Start Call");
        shell.press().await.unwrap();

        assert_eq!(shell.view().label, "End Call");
        assert_eq!(shell.view().action, CallAction::End);

        shell.press().await.unwrap();
        assert_eq!(shell.view().label, "Start Call");
        assert_eq!(factory.client(0).count("disconnect"), 1);
    }

    #[tokio::test]
    async fn test_join_with_missing_token() {
        let factory = Arc::new(MockFactory::new());
        let shell = shell(
            Page::Join {
                room_url: Some("wss://room".to_string()),
                token: None,
            },
            &factory,
        );

        assert_eq!(shell.view().label, "Join");
        let err = shell.press().await.unwrap_err();

        assert!(matches!(err, CallError::MissingParameter("token")));
        assert_eq!(factory.created(), 0);
        assert_eq!(shell.view().label, "Join");
    }

    #[tokio::test]
    async fn test_join_shows_loading_while_connecting() {
        let factory = Arc::new(MockFactory::gated());
        let shell = Arc::new(shell(
            Page::Join {
                room_url: Some("wss://room".to_string()),
                token: Some("t".to_string()),
            },
            &factory,
        ));

        let pending = {
            let shell = Arc::clone(&shell);
            tokio::spawn(async move { shell.press().await })
        };

        wait_until(|| factory.created() == 1).await;
        let view = shell.view();
        assert_eq!(view.label, "Loading...");
        assert!(!view.is_enabled());
        assert_eq!(view.to_string(), "( Loading... )");

        // Deaktivierter Button tut nichts
        shell.press().await.unwrap();

        factory.release();
        pending.await.unwrap().unwrap();
        assert_eq!(shell.view().to_string(), "[ End Call ]");
    }

    #[tokio::test]
    async fn test_remote_disconnect_resets_button() {
        let factory = Arc::new(MockFactory::new());
        let shell = shell(start_page(), &factory);

        shell.press().await.unwrap();
        factory.client(0).emit(RoomEvent::Disconnected);

        wait_until(|| shell.view().action == CallAction::Start).await;
    }
}
