//! Authentication session.
//!
//! Holds the credential (token pair) and the identity derived from it, and
//! notifies the rest of the core about changes over a broadcast channel.
//! The credential and the identity are deliberately decoupled: a failed
//! identity lookup clears the identity but leaves the credential in place.

pub mod store;

pub use store::CredentialStore;

use crate::api::{CoachClient, TokenPair, UserProfile};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the auth event channel. Events are tiny; slow subscribers
/// that lag simply miss intermediate transitions.
const EVENT_CAPACITY: usize = 16;

/// State transitions other components react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The credential was installed or replaced (login, startup restore).
    CredentialsChanged,
    /// An identity lookup completed; the identity may be present or absent.
    IdentityChanged,
    /// Credential and identity were discarded. Subscribers clear their own
    /// state; there is no page reload to do it for them.
    LoggedOut,
}

#[derive(Debug, Default)]
struct AuthState {
    tokens: Option<TokenPair>,
    user: Option<UserProfile>,
}

/// Credential and identity owner
///
/// All mutation goes through [`login`](AuthSession::login),
/// [`register`](AuthSession::register), [`logout`](AuthSession::logout) and
/// the identity lookup they trigger. Login and register surface only a
/// boolean; callers display a generic failure message.
pub struct AuthSession {
    state: RwLock<AuthState>,
    store: CredentialStore,
    client: Arc<CoachClient>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthSession {
    /// Create a session with the default credential store
    pub fn new(client: Arc<CoachClient>) -> Self {
        Self::with_store(client, CredentialStore::new())
    }

    /// Create a session with an explicit credential store
    pub fn with_store(client: Arc<CoachClient>, store: CredentialStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(AuthState::default()),
            store,
            client,
            events,
        }
    }

    /// Subscribe to auth state transitions
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine (e.g. in tests)
        let _ = self.events.send(event);
    }

    /// Restore the persisted credential and derive the identity from it
    ///
    /// Call once at process start.
    pub async fn bootstrap(&self) {
        if let Some(tokens) = self.store.load() {
            tracing::info!("Restoring persisted credentials");
            self.state.write().tokens = Some(tokens);
            self.emit(AuthEvent::CredentialsChanged);
            self.refresh_identity().await;
        }
    }

    /// Exchange credentials for a token pair
    ///
    /// On success the credential is installed, persisted, and an identity
    /// lookup runs before returning. On failure nothing changes.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        match self.client.login(username, password).await {
            Ok(tokens) => {
                if let Err(e) = self.store.save(&tokens) {
                    tracing::warn!("Could not persist credentials: {}", e);
                }
                self.state.write().tokens = Some(tokens);
                self.emit(AuthEvent::CredentialsChanged);
                self.refresh_identity().await;
                tracing::info!("Logged in as '{}'", username);
                true
            }
            Err(e) => {
                tracing::warn!("Login failed for '{}': {}", username, e);
                false
            }
        }
    }

    /// Request account creation. Does not authenticate.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> bool {
        match self.client.register(username, email, password).await {
            Ok(()) => {
                tracing::info!("Registered account '{}'", username);
                true
            }
            Err(e) => {
                tracing::warn!("Registration failed for '{}': {}", username, e);
                false
            }
        }
    }

    /// Discard credential and identity, evict durable storage, and notify
    /// subscribers so they clear their own state
    pub fn logout(&self) {
        {
            let mut state = self.state.write();
            state.tokens = None;
            state.user = None;
        }
        self.store.clear();
        self.emit(AuthEvent::LoggedOut);
        tracing::info!("Logged out");
    }

    /// Re-derive the identity from the current credential
    ///
    /// A lookup failure (non-success response or transport error) clears
    /// the identity but leaves the credential untouched.
    pub async fn refresh_identity(&self) {
        let access = self.access_token();

        let user = match access {
            Some(token) => match self.client.current_user(&token).await {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!("Identity lookup failed: {}", e);
                    None
                }
            },
            None => None,
        };

        self.state.write().user = user;
        self.emit(AuthEvent::IdentityChanged);
    }

    /// Current access token, if a credential is installed
    pub fn access_token(&self) -> Option<String> {
        self.state.read().tokens.as_ref().map(|t| t.access.clone())
    }

    /// Current identity, if the last lookup succeeded
    pub fn identity(&self) -> Option<UserProfile> {
        self.state.read().user.clone()
    }

    /// Whether an identity is present
    pub fn is_authenticated(&self) -> bool {
        self.state.read().user.is_some()
    }

    /// Install credential/identity state directly, bypassing the network
    #[cfg(test)]
    pub(crate) fn set_state_for_tests(
        &self,
        tokens: Option<TokenPair>,
        user: Option<UserProfile>,
    ) {
        let mut state = self.state.write();
        state.tokens = tokens;
        state.user = user;
    }
}
