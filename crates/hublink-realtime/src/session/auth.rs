//! Token presence signal with expiry-driven logout.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use hublink_core::error::AppError;
use hublink_core::AppResult;

use super::token::SessionToken;

/// Callback run when a session ends, with the new epoch.
pub type SessionEndHook = Arc<dyn Fn(u64) + Send + Sync>;

/// Snapshot of the session signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Current token, `None` when logged out.
    pub token: Option<SessionToken>,
    /// Number of sessions that have ended so far.
    pub epoch: u64,
}

impl SessionState {
    /// Whether a token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Holds the current token and publishes every transition.
///
/// `epoch` advances each time a present session ends (logout, expiry, or a
/// login that replaces another session). Session-end hooks run synchronously
/// inside the transition: no other login, refresh or logout can interleave
/// before they return, so the next session never sees the previous session's
/// state. Hooks must not call back into the session.
#[derive(Debug)]
pub struct AuthSession {
    shared: Arc<Shared>,
    expiry: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    state: watch::Sender<SessionState>,
    hooks: Mutex<Vec<SessionEndHook>>,
    /// Serializes transitions and their hooks.
    transitions: Mutex<()>,
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("state", &*self.state.borrow())
            .field("hooks", &lock(&self.hooks).len())
            .finish()
    }
}

impl Shared {
    /// Applies `change` and, if it advanced the epoch, runs the session-end
    /// hooks before any other transition may start. Returns whether the state
    /// changed.
    fn transition(&self, change: impl FnOnce(&mut SessionState) -> bool) -> bool {
        let _serial = lock(&self.transitions);
        let before = self.state.borrow().epoch;
        let changed = self.state.send_if_modified(change);
        let after = self.state.borrow().epoch;

        if after != before {
            let hooks: Vec<SessionEndHook> = lock(&self.hooks).clone();
            for hook in hooks {
                hook(after);
            }
        }
        changed
    }

    /// Clears the token (only if it still equals `expected`, when given) and
    /// advances the epoch. Returns whether a session ended.
    fn end(&self, expected: Option<&SessionToken>) -> bool {
        self.transition(|s| {
            let matches = match (&s.token, expected) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(current), Some(expected)) => current == expected,
            };
            if matches {
                s.token = None;
                s.epoch += 1;
            }
            matches
        })
    }
}

impl AuthSession {
    /// Creates a logged-out session.
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            shared: Arc::new(Shared {
                state,
                hooks: Mutex::new(Vec::new()),
                transitions: Mutex::new(()),
            }),
            expiry: Mutex::new(None),
        }
    }

    /// Starts a session. An already-expired token ends any current session
    /// and is rejected.
    pub fn login(&self, token: SessionToken) -> AppResult<()> {
        if token.is_expired() {
            warn!("Token already expired, logging out");
            self.logout();
            return Err(AppError::session("Token already expired"));
        }

        self.shared.transition(|s| {
            if s.token.is_some() {
                s.epoch += 1;
            }
            s.token = Some(token.clone());
            true
        });
        info!(expires_at = ?token.expires_at(), "Session started");
        self.schedule_expiry(token);
        Ok(())
    }

    /// Replaces the token of the current session without ending it.
    pub fn refresh(&self, token: SessionToken) -> AppResult<()> {
        if token.is_expired() {
            return Err(AppError::session("Refreshed token already expired"));
        }

        let replaced = self.shared.transition(|s| {
            if s.token.is_none() {
                return false;
            }
            s.token = Some(token.clone());
            true
        });
        if !replaced {
            return Err(AppError::session("No active session to refresh"));
        }

        self.schedule_expiry(token);
        Ok(())
    }

    /// Ends the current session, if any.
    pub fn logout(&self) {
        if let Some(task) = self.lock_expiry().take() {
            task.abort();
        }
        if self.shared.end(None) {
            info!("Session ended");
        }
    }

    /// Registers a callback run synchronously whenever a session ends.
    pub fn on_session_end(&self, hook: impl Fn(u64) + Send + Sync + 'static) {
        lock(&self.shared.hooks).push(Arc::new(hook));
    }

    /// Current token.
    pub fn token(&self) -> Option<SessionToken> {
        self.shared.state.borrow().token.clone()
    }

    /// Whether a token is present.
    pub fn is_authenticated(&self) -> bool {
        self.shared.state.borrow().is_authenticated()
    }

    /// Current snapshot.
    pub fn state(&self) -> SessionState {
        self.shared.state.borrow().clone()
    }

    /// Receiver that observes every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    fn schedule_expiry(&self, token: SessionToken) {
        let mut slot = self.lock_expiry();
        if let Some(task) = slot.take() {
            task.abort();
        }

        let Some(expires_at) = token.expires_at() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime; token expiry will not end the session");
            return;
        };

        let remaining = (expires_at - Utc::now()).to_std().unwrap_or_default();
        let shared = self.shared.clone();
        *slot = Some(runtime.spawn(async move {
            tokio::time::sleep(remaining).await;
            if shared.end(Some(&token)) {
                info!(%expires_at, "Session token expired, session ended");
            }
        }));
    }

    fn lock_expiry(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        lock(&self.expiry)
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AuthSession {
    fn drop(&mut self) {
        if let Some(task) = self.lock_expiry().take() {
            task.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_login_logout_advances_epoch() {
        let session = AuthSession::new();
        assert!(!session.is_authenticated());

        session.login(SessionToken::new("a")).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.state().epoch, 0);

        session.logout();
        assert!(!session.is_authenticated());
        assert_eq!(session.state().epoch, 1);

        // Logging out twice does not end a second session.
        session.logout();
        assert_eq!(session.state().epoch, 1);
    }

    #[test]
    fn test_refresh_keeps_epoch() {
        let session = AuthSession::new();
        assert!(session.refresh(SessionToken::new("b")).is_err());

        session.login(SessionToken::new("a")).unwrap();
        session.refresh(SessionToken::new("b")).unwrap();
        assert_eq!(session.token().unwrap().value(), "b");
        assert_eq!(session.state().epoch, 0);
    }

    #[test]
    fn test_login_replacing_session_ends_previous() {
        let session = AuthSession::new();
        session.login(SessionToken::new("a")).unwrap();
        session.login(SessionToken::new("b")).unwrap();
        assert_eq!(session.state().epoch, 1);
    }

    #[test]
    fn test_expired_token_rejected() {
        let session = AuthSession::new();
        session.login(SessionToken::new("a")).unwrap();

        let stale = SessionToken::with_expiry("b", Utc::now() - Duration::seconds(1));
        assert!(session.login(stale).is_err());
        assert!(!session.is_authenticated());
        assert_eq!(session.state().epoch, 1);
    }

    #[test]
    fn test_session_end_hooks_run_inside_transition() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let session = AuthSession::new();
        let ended = Arc::new(AtomicU64::new(0));
        let seen = ended.clone();
        session.on_session_end(move |epoch| seen.store(epoch, Ordering::SeqCst));

        session.login(SessionToken::new("a")).unwrap();
        session.refresh(SessionToken::new("b")).unwrap();
        assert_eq!(ended.load(Ordering::SeqCst), 0);

        session.logout();
        assert_eq!(ended.load(Ordering::SeqCst), 1);

        session.login(SessionToken::new("c")).unwrap();
        session.login(SessionToken::new("d")).unwrap();
        assert_eq!(ended.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_ends_session() {
        let session = AuthSession::new();
        let mut rx = session.subscribe();
        session
            .login(SessionToken::with_expiry("a", Utc::now() + Duration::seconds(30)))
            .unwrap();

        let state = tokio::time::timeout(
            std::time::Duration::from_secs(120),
            rx.wait_for(|s| !s.is_authenticated() && s.epoch == 1),
        )
        .await
        .expect("session should expire")
        .expect("sender alive")
        .clone();
        assert_eq!(state.epoch, 1);
    }
}
