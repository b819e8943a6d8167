//! In-process backend
//!
//! Documents live in a mutex-guarded map keyed by collection path; every write
//! broadcasts the changed path so standing subscriptions can re-snapshot.
//! `set_offline(true)` makes every call fail with [`StoreError::Unavailable`].

use super::{
    AuthError, AuthProvider, AuthResult, AuthUser, Credentials, DocumentStore, SnapshotStream,
    StoreError, StoreResult, channel_stream,
};
use crate::types::{CollectionPath, Fields, OrderBy, Record, RecordId, SortDirection};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::{broadcast, mpsc};

const CHANGE_BUFFER: usize = 64;
const SNAPSHOT_BUFFER: usize = 16;

struct StoredDoc {
    id: RecordId,
    fields: Fields,
}

struct Inner {
    counter: AtomicU64,
    collections: Mutex<HashMap<String, Vec<StoredDoc>>>,
    changes: broadcast::Sender<String>,
    offline: AtomicBool,
    fetches: AtomicUsize,
}

impl Inner {
    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<String, Vec<StoredDoc>>>> {
        self.collections.lock().map_err(|_| StoreError::Poisoned)
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn notify(&self, key: String) {
        // No receivers just means nobody is subscribed yet.
        let _ = self.changes.send(key);
    }

    fn snapshot(&self, key: &str, order: &OrderBy) -> StoreResult<Vec<Record>> {
        let collections = self.lock()?;
        let mut records: Vec<Record> = collections
            .get(key)
            .map(|docs| {
                docs.iter()
                    .map(|doc| Record::from_document(doc.id.clone(), doc.fields.clone(), &order.field))
                    .collect()
            })
            .unwrap_or_default();
        drop(collections);

        if order.is_document_id() {
            records.sort_by(|a, b| a.id.cmp(&b.id));
        } else {
            records.sort_by_key(|record| record.created_at);
        }
        if order.direction == SortDirection::Descending {
            records.reverse();
        }
        Ok(records)
    }
}

/// Document store that keeps everything in memory.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            inner: Arc::new(Inner {
                counter: AtomicU64::new(1),
                collections: Mutex::new(HashMap::new()),
                changes,
                offline: AtomicBool::new(false),
                fetches: AtomicUsize::new(0),
            }),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of one-shot `get` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    /// Number of documents currently stored under `path`.
    pub fn document_count(&self, path: &CollectionPath) -> usize {
        self.inner
            .lock()
            .map(|collections| collections.get(&path.to_string()).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Writes a document with a chosen id, bypassing the offline switch.
    /// Used to seed directories such as `users`.
    pub fn insert_with_id(&self, path: &CollectionPath, id: RecordId, fields: Fields) -> StoreResult<()> {
        let key = path.to_string();
        {
            let mut collections = self.inner.lock()?;
            let docs = collections.entry(key.clone()).or_default();
            docs.retain(|doc| doc.id != id);
            docs.push(StoredDoc { id, fields });
        }
        self.inner.notify(key);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(&self, path: &CollectionPath, fields: Fields) -> StoreResult<RecordId> {
        self.inner.ensure_online()?;
        let n = self.inner.counter.fetch_add(1, Ordering::Relaxed);
        let id = RecordId::new(format!("doc-{n}"));
        let key = path.to_string();
        {
            let mut collections = self.inner.lock()?;
            collections.entry(key.clone()).or_default().push(StoredDoc {
                id: id.clone(),
                fields,
            });
        }
        tracing::debug!(path = %key, id = %id, "memory store add");
        self.inner.notify(key);
        Ok(id)
    }

    async fn get(&self, path: &CollectionPath, order: &OrderBy) -> StoreResult<Vec<Record>> {
        self.inner.ensure_online()?;
        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.snapshot(&path.to_string(), order)
    }

    async fn subscribe(
        &self,
        path: &CollectionPath,
        order: &OrderBy,
    ) -> StoreResult<SnapshotStream> {
        self.inner.ensure_online()?;
        let key = path.to_string();
        let order = order.clone();
        let inner = self.inner.clone();
        let mut changes = inner.changes.subscribe();
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);

        tokio::spawn(async move {
            if tx.send(inner.snapshot(&key, &order)).await.is_err() {
                return;
            }
            loop {
                let changed = tokio::select! {
                    _ = tx.closed() => return,
                    changed = changes.recv() => changed,
                };
                match changed {
                    Ok(changed) if changed != key => continue,
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        if tx.send(inner.snapshot(&key, &order)).await.is_err() {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });

        Ok(channel_stream(rx))
    }

    async fn update(&self, path: &CollectionPath, id: &RecordId, delta: Fields) -> StoreResult<()> {
        self.inner.ensure_online()?;
        let key = path.to_string();
        {
            let mut collections = self.inner.lock()?;
            let doc = collections
                .get_mut(&key)
                .and_then(|docs| docs.iter_mut().find(|doc| &doc.id == id))
                .ok_or_else(|| StoreError::NotFound(path.document(id)))?;
            doc.fields.extend(delta);
        }
        self.inner.notify(key);
        Ok(())
    }

    async fn delete(&self, path: &CollectionPath, id: &RecordId) -> StoreResult<()> {
        self.inner.ensure_online()?;
        let key = path.to_string();
        {
            let mut collections = self.inner.lock()?;
            if let Some(docs) = collections.get_mut(&key) {
                docs.retain(|doc| &doc.id != id);
            }
        }
        self.inner.notify(key);
        Ok(())
    }
}

struct Account {
    uid: String,
    password: String,
}

/// Email/password auth kept in memory.
#[derive(Default)]
pub struct MemoryAuth {
    counter: AtomicU64,
    accounts: RwLock<HashMap<String, Account>>,
    current: RwLock<Option<AuthUser>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts signed in as `uid` without going through the sign-in flow.
    pub fn signed_in(uid: impl Into<String>) -> Self {
        let auth = Self::default();
        if let Ok(mut current) = auth.current.write() {
            *current = Some(AuthUser {
                uid: uid.into(),
                email: None,
            });
        }
        auth
    }

    fn set_current(&self, user: AuthUser) -> AuthResult<AuthUser> {
        let mut current = self.current.write().map_err(|_| AuthError::Poisoned)?;
        *current = Some(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    fn current_user(&self) -> Option<AuthUser> {
        self.current.read().ok().and_then(|current| current.clone())
    }

    async fn sign_in(&self, credentials: &Credentials) -> AuthResult<AuthUser> {
        let uid = {
            let accounts = self.accounts.read().map_err(|_| AuthError::Poisoned)?;
            match accounts.get(&credentials.email) {
                Some(account) if account.password == credentials.password => account.uid.clone(),
                _ => return Err(AuthError::InvalidCredentials),
            }
        };
        self.set_current(AuthUser {
            uid,
            email: Some(credentials.email.clone()),
        })
    }

    async fn register(&self, credentials: &Credentials) -> AuthResult<AuthUser> {
        let uid = {
            let mut accounts = self.accounts.write().map_err(|_| AuthError::Poisoned)?;
            if accounts.contains_key(&credentials.email) {
                return Err(AuthError::EmailExists);
            }
            let uid = format!("user-{}", self.counter.fetch_add(1, Ordering::Relaxed) + 1);
            accounts.insert(
                credentials.email.clone(),
                Account {
                    uid: uid.clone(),
                    password: credentials.password.clone(),
                },
            );
            uid
        };
        self.set_current(AuthUser {
            uid,
            email: Some(credentials.email.clone()),
        })
    }

    async fn sign_in_with_idp(&self, provider_id: &str, id_token: &str) -> AuthResult<AuthUser> {
        if id_token.trim().is_empty() {
            return Err(AuthError::Rejected(format!("empty {provider_id} token")));
        }
        self.set_current(AuthUser {
            uid: format!("{provider_id}:{id_token}"),
            email: None,
        })
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        let accounts = self.accounts.read().map_err(|_| AuthError::Poisoned)?;
        if accounts.contains_key(email) {
            Ok(())
        } else {
            Err(AuthError::UnknownEmail)
        }
    }

    fn sign_out(&self) {
        if let Ok(mut current) = self.current.write() {
            *current = None;
        }
    }
}
