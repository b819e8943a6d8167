//! Backend collaborators
//!
//! The app delegates persistence, querying, real-time sync and auth to a
//! managed cloud backend. This module defines the contract the rest of the
//! crate codes against and the adapters that fulfil it:
//!
//! - `memory` - in-process store and auth, used offline and in tests
//! - `firebase` - REST adapters for Cloud Firestore and Firebase Auth
//!
//! A single [`Backend`] handle is built at startup and passed down explicitly.
pub mod firebase;
pub mod memory;

use crate::config::{AppConfig, BackendKind};
use crate::storage::LocalStore;
use crate::types::{CollectionPath, Fields, OrderBy, Record, RecordId, UserId};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use firebase::{FirebaseAuth, FirestoreStore};
pub use memory::{MemoryAuth, MemoryStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Backend unavailable")]
    Unavailable,

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store state poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ordered full result sets, delivered until the stream is dropped.
pub type SnapshotStream = BoxStream<'static, StoreResult<Vec<Record>>>;

/// Per-collection read/write/subscribe API of the managed document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document and returns the id the backend assigned to it.
    async fn add(&self, path: &CollectionPath, fields: Fields) -> StoreResult<RecordId>;

    /// One-shot ordered fetch of a whole collection.
    async fn get(&self, path: &CollectionPath, order: &OrderBy) -> StoreResult<Vec<Record>>;

    /// Standing query. The first item is the current snapshot; later items
    /// follow every change to the collection.
    async fn subscribe(&self, path: &CollectionPath, order: &OrderBy)
    -> StoreResult<SnapshotStream>;

    async fn update(&self, path: &CollectionPath, id: &RecordId, delta: Fields)
    -> StoreResult<()>;

    async fn delete(&self, path: &CollectionPath, id: &RecordId) -> StoreResult<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account already exists for this email")]
    EmailExists,

    #[error("No account found for this email")]
    UnknownEmail,

    #[error("You need to sign in first")]
    NotSignedIn,

    #[error("Sign-in rejected: {0}")]
    Rejected(String),

    #[error("Auth request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Auth state poisoned")]
    Poisoned,
}

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Authentication collaborator.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<AuthUser>;

    /// The signed-in uid, or the anonymous sentinel.
    fn current_user_id(&self) -> UserId {
        self.current_user()
            .map(|user| UserId(user.uid))
            .unwrap_or_else(UserId::anonymous)
    }

    async fn sign_in(&self, credentials: &Credentials) -> AuthResult<AuthUser>;

    async fn register(&self, credentials: &Credentials) -> AuthResult<AuthUser>;

    /// Exchanges an id token from a social sign-in provider (e.g. `google.com`).
    async fn sign_in_with_idp(&self, provider_id: &str, id_token: &str) -> AuthResult<AuthUser>;

    async fn send_password_reset(&self, email: &str) -> AuthResult<()>;

    fn sign_out(&self);

    /// Bearer token for backend requests, when signed in.
    fn id_token(&self) -> Option<String> {
        None
    }

    /// Like [`AuthProvider::id_token`], renewing the session first when its
    /// token has expired.
    async fn fresh_id_token(&self) -> AuthResult<Option<String>> {
        Ok(self.id_token())
    }
}

/// The one long-lived database + auth handle shared by every screen.
#[derive(Clone)]
pub struct Backend {
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthProvider>,
}

impl Backend {
    pub fn new(store: Arc<dyn DocumentStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    /// Fresh in-process backend.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryAuth::new()))
    }

    /// Builds the backend selected by configuration.
    pub fn from_config(config: &AppConfig, local: LocalStore) -> Self {
        match &config.backend {
            BackendKind::Memory => {
                tracing::info!("using in-memory backend");
                Self::memory()
            }
            BackendKind::Firebase(firebase) => {
                tracing::info!(project = %firebase.project_id, "using firebase backend");
                let auth = Arc::new(FirebaseAuth::new(firebase.clone(), local));
                let store = Arc::new(FirestoreStore::new(
                    firebase.clone(),
                    auth.clone(),
                    config.poll_interval,
                ));
                Self::new(store, auth)
            }
        }
    }
}

/// Adapts a channel fed by a background task into a [`SnapshotStream`].
pub(crate) fn channel_stream(
    rx: tokio::sync::mpsc::Receiver<StoreResult<Vec<Record>>>,
) -> SnapshotStream {
    use futures::StreamExt;
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed()
}
