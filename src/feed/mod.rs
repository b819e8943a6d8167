//! Local reactive lists kept in sync with remote collections
//!
//! - `list` - [`ReactiveList`], the observable ordered in-memory mirror
//! - `policy` - how a list reconciles: poll-on-toggle or standing subscription
//!
//! [`Feed`] ties one list to one remote collection: optimistic writes go into
//! the list first and are then sent to the [`DocumentStore`]; fetched or
//! subscribed snapshots replace the list wholesale.
pub mod list;
pub mod policy;

pub use list::{ListPhase, ListState, ReactiveList};
pub use policy::{HideBehavior, HistoryToggle, PendingFailure, SyncPolicy, ToggleAction};

use crate::backend::{DocumentStore, StoreResult};
use crate::types::{CollectionPath, Fields, OrderBy, Record, RecordId, TIMESTAMP_FIELD, Timestamp};
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

#[derive(Clone, Debug)]
pub struct FeedConfig {
    pub path: CollectionPath,
    pub order: OrderBy,
    pub policy: SyncPolicy,
    pub on_write_failure: PendingFailure,
}

impl FeedConfig {
    pub fn new(path: CollectionPath, order: OrderBy, policy: SyncPolicy) -> Self {
        Self {
            path,
            order,
            policy,
            on_write_failure: PendingFailure::default(),
        }
    }

    pub fn on_write_failure(mut self, behavior: PendingFailure) -> Self {
        self.on_write_failure = behavior;
        self
    }
}

/// Background task forwarding snapshots into a list. Aborted on drop.
struct Subscription {
    task: JoinHandle<()>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Feed {
    store: Arc<dyn DocumentStore>,
    config: FeedConfig,
    list: ReactiveList,
    history: Mutex<HistoryToggle>,
    subscription: Mutex<Option<Subscription>>,
}

impl Feed {
    pub fn new(store: Arc<dyn DocumentStore>, config: FeedConfig) -> Self {
        let list = ReactiveList::new(config.order.direction);
        Self {
            store,
            config,
            list,
            history: Mutex::new(HistoryToggle::default()),
            subscription: Mutex::new(None),
        }
    }

    pub fn list(&self) -> &ReactiveList {
        &self.list
    }

    pub fn records(&self) -> Vec<Record> {
        self.list.records()
    }

    pub fn path(&self) -> &CollectionPath {
        &self.config.path
    }

    pub fn history_visible(&self) -> bool {
        lock(&self.history).is_visible()
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.subscription).is_some()
    }

    /// Field the sort key is written under.
    fn sort_field(&self) -> &str {
        if self.config.order.is_document_id() {
            TIMESTAMP_FIELD
        } else {
            &self.config.order.field
        }
    }

    /// Mount hook: subscription feeds start listening, poll-on-toggle feeds
    /// wait for the toggle.
    pub async fn start(&self) -> StoreResult<()> {
        match self.config.policy {
            SyncPolicy::Subscription => self.subscribe().await,
            SyncPolicy::PollOnToggle { .. } => Ok(()),
        }
    }

    /// One-shot fetch that replaces the list.
    pub async fn load(&self) -> StoreResult<usize> {
        self.list.begin_loading();
        match self.store.get(&self.config.path, &self.config.order).await {
            Ok(records) => {
                let count = records.len();
                self.list.replace_all(records);
                tracing::debug!(path = %self.config.path, count, "loaded");
                Ok(count)
            }
            Err(err) => {
                self.list.abort_loading();
                tracing::warn!(path = %self.config.path, error = %err, "load failed");
                Err(err)
            }
        }
    }

    /// Flips the history panel. Turning it on fetches once and replaces the
    /// list; turning it off applies the feed's hide behavior. Returns the new
    /// visibility.
    pub async fn toggle_history(&self) -> StoreResult<bool> {
        let on_hide = match self.config.policy {
            SyncPolicy::PollOnToggle { on_hide } => on_hide,
            SyncPolicy::Subscription => HideBehavior::Keep,
        };
        let action = lock(&self.history).toggle(on_hide);

        match action {
            ToggleAction::Fetch(transition) => {
                self.list.begin_loading();
                let fetched = self.store.get(&self.config.path, &self.config.order).await;
                let (current, visible) = {
                    let history = lock(&self.history);
                    (history.is_current(transition), history.is_visible())
                };
                if !current {
                    // a later show owns the loading flag while its fetch runs
                    tracing::debug!(path = %self.config.path, "dropping stale history fetch");
                    if !visible {
                        self.list.abort_loading();
                    }
                    return Ok(visible);
                }
                match fetched {
                    Ok(records) => {
                        self.list.replace_all(records);
                        Ok(true)
                    }
                    Err(err) => {
                        self.list.abort_loading();
                        tracing::warn!(path = %self.config.path, error = %err, "history fetch failed");
                        Err(err)
                    }
                }
            }
            ToggleAction::Hide(behavior) => {
                match behavior {
                    HideBehavior::Keep => {}
                    HideBehavior::Clear => self.list.clear(),
                    HideBehavior::RetainRecent(window) => {
                        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
                        self.list
                            .retain_since(Timestamp::now().saturating_sub_millis(window_ms));
                    }
                }
                Ok(false)
            }
        }
    }

    /// Optimistically appends a record built from `fields` and persists it.
    pub async fn submit(&self, fields: Fields) -> StoreResult<Record> {
        self.submit_at(fields, Timestamp::now()).await
    }

    pub async fn submit_at(&self, fields: Fields, created_at: Timestamp) -> StoreResult<Record> {
        let mut record = Record::draft(fields, created_at);
        let correlation_id = record.correlation_id;
        self.list.append(record.clone());

        let document = record.to_document(self.sort_field());
        match self.store.add(&self.config.path, document).await {
            Ok(id) => {
                if let Some(cid) = &correlation_id {
                    self.list.confirm(cid, id.clone());
                }
                tracing::debug!(path = %self.config.path, id = %id, "write confirmed");
                record.id = Some(id);
                record.pending = false;
                Ok(record)
            }
            Err(err) => {
                tracing::warn!(path = %self.config.path, error = %err, "write failed");
                if self.config.on_write_failure == PendingFailure::Discard
                    && let Some(cid) = &correlation_id
                {
                    self.list.discard_pending(cid);
                }
                Err(err)
            }
        }
    }

    /// Patches the visible record, then the remote one. Not rolled back.
    pub async fn update(&self, id: &RecordId, delta: Fields) -> StoreResult<()> {
        self.list.patch(id, &delta, self.sort_field());
        self.store
            .update(&self.config.path, id, delta)
            .await
            .inspect_err(|err| {
                tracing::warn!(path = %self.config.path, id = %id, error = %err, "update failed");
            })
    }

    /// Removes the visible record, then the remote one. Not rolled back.
    pub async fn delete(&self, id: &RecordId) -> StoreResult<()> {
        self.list.remove(id);
        self.store
            .delete(&self.config.path, id)
            .await
            .inspect_err(|err| {
                tracing::warn!(path = %self.config.path, id = %id, error = %err, "delete failed");
            })
    }

    /// Starts (or restarts) the standing listener.
    pub async fn subscribe(&self) -> StoreResult<()> {
        self.unsubscribe();
        self.list.begin_loading();
        let mut stream = match self.store.subscribe(&self.config.path, &self.config.order).await {
            Ok(stream) => stream,
            Err(err) => {
                self.list.abort_loading();
                tracing::warn!(path = %self.config.path, error = %err, "subscribe failed");
                return Err(err);
            }
        };

        let list = self.list.clone();
        let path = self.config.path.clone();
        let task = tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(records) => {
                        tracing::debug!(path = %path, count = records.len(), "snapshot");
                        list.replace_all(records);
                    }
                    Err(err) => {
                        list.abort_loading();
                        tracing::warn!(path = %path, error = %err, "snapshot failed");
                    }
                }
            }
            tracing::debug!(path = %path, "subscription ended");
        });

        *lock(&self.subscription) = Some(Subscription { task });
        Ok(())
    }

    pub fn unsubscribe(&self) {
        lock(&self.subscription).take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use crate::fields;
    use std::time::Duration;

    fn chat_feed(store: &MemoryStore) -> Feed {
        Feed::new(
            Arc::new(store.clone()),
            FeedConfig::new(
                CollectionPath::root("chats").child("u1", "messages"),
                OrderBy::ascending(TIMESTAMP_FIELD),
                SyncPolicy::PollOnToggle {
                    on_hide: HideBehavior::Clear,
                },
            ),
        )
    }

    #[tokio::test]
    async fn test_submit_confirms_pending_record() {
        let store = MemoryStore::new();
        let feed = chat_feed(&store);
        let record = feed.submit(fields! { "text" => "hi" }).await.unwrap();

        assert!(record.id.is_some());
        let records = feed.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, record.id);
        assert!(!records[0].pending);
        assert_eq!(store.document_count(feed.path()), 1);
    }

    #[tokio::test]
    async fn test_failed_write_is_discarded_by_default() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let feed = chat_feed(&store);
        assert!(feed.submit(fields! { "text" => "hi" }).await.is_err());
        assert!(feed.records().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_can_be_retained() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let feed = Feed::new(
            Arc::new(store.clone()),
            FeedConfig::new(
                CollectionPath::root("socialize"),
                OrderBy::ascending(TIMESTAMP_FIELD),
                SyncPolicy::Subscription,
            )
            .on_write_failure(PendingFailure::Retain),
        );
        assert!(feed.submit(fields! { "text" => "hi" }).await.is_err());
        let records = feed.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].pending);
        assert_eq!(feed.list().phase(), ListPhase::LoadedWithPending);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_last_good_state() {
        let store = MemoryStore::new();
        let feed = chat_feed(&store);
        feed.submit(fields! { "text" => "kept" }).await.unwrap();
        store.set_offline(true);

        assert!(feed.load().await.is_err());
        assert_eq!(feed.records().len(), 1);
        assert_eq!(feed.list().phase(), ListPhase::Loaded);
    }

    #[tokio::test]
    async fn test_hide_retains_recent_records() {
        let store = MemoryStore::new();
        let feed = Feed::new(
            Arc::new(store.clone()),
            FeedConfig::new(
                CollectionPath::root("chats").child("u1", "messages"),
                OrderBy::ascending(TIMESTAMP_FIELD),
                SyncPolicy::PollOnToggle {
                    on_hide: HideBehavior::RetainRecent(Duration::from_secs(10)),
                },
            ),
        );
        feed.submit_at(fields! { "text" => "old" }, Timestamp(1_000))
            .await
            .unwrap();
        feed.submit(fields! { "text" => "new" }).await.unwrap();

        assert!(feed.toggle_history().await.unwrap());
        assert_eq!(feed.records().len(), 2);
        assert!(!feed.toggle_history().await.unwrap());
        let records = feed.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text("text"), Some("new"));
    }

    #[tokio::test]
    async fn test_update_of_sort_key_reorders_the_list() {
        let store = MemoryStore::new();
        let feed = chat_feed(&store);
        let first = feed
            .submit_at(fields! { "text" => "first" }, Timestamp(10))
            .await
            .unwrap();
        feed.submit_at(fields! { "text" => "second" }, Timestamp(20))
            .await
            .unwrap();

        let id = first.id.unwrap();
        feed.update(&id, fields! { TIMESTAMP_FIELD => 30_i64 })
            .await
            .unwrap();
        let records = feed.records();
        assert_eq!(records[1].id.as_ref(), Some(&id));
        assert_eq!(records[1].created_at, Timestamp(30));

        // a reload agrees with the local order
        feed.load().await.unwrap();
        assert_eq!(feed.records()[1].id.as_ref(), Some(&id));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_updates() {
        let store = MemoryStore::new();
        let feed = Feed::new(
            Arc::new(store.clone()),
            FeedConfig::new(
                CollectionPath::root("socialize"),
                OrderBy::ascending(TIMESTAMP_FIELD),
                SyncPolicy::Subscription,
            ),
        );
        feed.start().await.unwrap();
        assert!(feed.is_subscribed());
        feed.unsubscribe();
        assert!(!feed.is_subscribed());

        store
            .add(feed.path(), fields! { "text" => "late", TIMESTAMP_FIELD => 5i64 })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(feed.records().iter().all(|r| r.text("text") != Some("late")));
    }
}
