//! Integration tests for feed reconciliation
//!
//! Runs feeds against the in-memory store: optimistic writes, history
//! toggles, standing subscriptions and offline behavior.

use async_trait::async_trait;
use omnibot::backend::{DocumentStore, MemoryStore, SnapshotStream, StoreError, StoreResult};
use omnibot::feed::{
    Feed, FeedConfig, HideBehavior, ListPhase, ListState, PendingFailure, ReactiveList,
    SyncPolicy,
};
use omnibot::fields;
use omnibot::types::{
    CollectionPath, Fields, OrderBy, Record, RecordId, SortDirection, TIMESTAMP_FIELD, Timestamp,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn messages_path() -> CollectionPath {
    CollectionPath::root("chats").child("u1", "messages")
}

fn poll_feed(store: &MemoryStore, on_hide: HideBehavior) -> Feed {
    Feed::new(
        Arc::new(store.clone()),
        FeedConfig::new(
            messages_path(),
            OrderBy::ascending(TIMESTAMP_FIELD),
            SyncPolicy::PollOnToggle { on_hide },
        ),
    )
}

fn live_feed(store: &MemoryStore) -> Feed {
    Feed::new(
        Arc::new(store.clone()),
        FeedConfig::new(
            messages_path(),
            OrderBy::ascending(TIMESTAMP_FIELD),
            SyncPolicy::Subscription,
        ),
    )
}

fn texts(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.text("text").unwrap_or_default().to_string())
        .collect()
}

/// Waits until the list satisfies `done`, failing after two seconds.
async fn settle(list: &ReactiveList, done: impl Fn(&ListState) -> bool) -> ListState {
    let mut rx = list.watch();
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let state = rx.borrow_and_update().clone();
            if done(&state) {
                return state;
            }
            if rx.changed().await.is_err() {
                return state;
            }
        }
    })
    .await;
    waited.expect("list never reached the expected state")
}

async fn seed(store: &MemoryStore, text: &str, at: i64) -> RecordId {
    store
        .add(
            &messages_path(),
            fields! { "text" => text, TIMESTAMP_FIELD => at },
        )
        .await
        .expect("seed write")
}

mod ordering {
    use super::*;

    #[test]
    fn test_out_of_order_appends_stay_sorted() {
        let list = ReactiveList::new(SortDirection::Ascending);
        list.append(Record::draft(fields! { "text" => "b" }, Timestamp(20)));
        list.append(Record::draft(fields! { "text" => "c" }, Timestamp(30)));
        list.append(Record::draft(fields! { "text" => "a" }, Timestamp(10)));
        assert_eq!(texts(&list.records()), ["a", "b", "c"]);
    }

    #[test]
    fn test_descending_lists_put_newest_first() {
        let list = ReactiveList::new(SortDirection::Descending);
        list.append(Record::draft(fields! { "text" => "old" }, Timestamp(1)));
        list.append(Record::draft(fields! { "text" => "new" }, Timestamp(2)));
        assert_eq!(texts(&list.records()), ["new", "old"]);
    }

    #[tokio::test]
    async fn test_loaded_snapshot_is_ordered_by_timestamp() {
        let store = MemoryStore::new();
        seed(&store, "second", 200).await;
        seed(&store, "first", 100).await;

        let feed = poll_feed(&store, HideBehavior::Keep);
        assert_eq!(feed.load().await.unwrap(), 2);
        assert_eq!(texts(&feed.records()), ["first", "second"]);
    }
}

mod reconciliation {
    use super::*;

    #[test]
    fn test_replace_all_twice_is_idempotent() {
        let snapshot = vec![
            Record::from_document(
                RecordId::new("a"),
                fields! { "text" => "a", TIMESTAMP_FIELD => 1_i64 },
                TIMESTAMP_FIELD,
            ),
            Record::from_document(
                RecordId::new("b"),
                fields! { "text" => "b", TIMESTAMP_FIELD => 2_i64 },
                TIMESTAMP_FIELD,
            ),
        ];
        let list = ReactiveList::new(SortDirection::Ascending);
        list.replace_all(snapshot.clone());
        let once = list.snapshot();
        list.replace_all(snapshot);
        assert_eq!(list.snapshot(), once);
        assert_eq!(once.phase(), ListPhase::Loaded);
    }

    #[test]
    fn test_removing_unknown_id_is_a_no_op() {
        let list = ReactiveList::new(SortDirection::Ascending);
        list.replace_all(vec![Record::from_document(
            RecordId::new("a"),
            fields! { "text" => "a" },
            TIMESTAMP_FIELD,
        )]);
        let before = list.snapshot();
        assert!(list.remove(&RecordId::new("missing")).is_none());
        assert_eq!(list.snapshot(), before);
    }

    #[tokio::test]
    async fn test_optimistic_write_is_not_duplicated_by_snapshot() {
        let store = MemoryStore::new();
        let feed = live_feed(&store);
        feed.start().await.unwrap();
        settle(feed.list(), |s| s.phase() == ListPhase::Loaded).await;

        let written = feed.submit(fields! { "text" => "hello" }).await.unwrap();
        let state = settle(feed.list(), |s| s.pending_count() == 0 && s.len() == 1).await;

        assert_eq!(state.records[0].id, written.id);
        assert_eq!(texts(&state.records), ["hello"]);
        assert_eq!(store.document_count(&messages_path()), 1);
    }

    #[tokio::test]
    async fn test_confirmed_write_keeps_its_position() {
        let store = MemoryStore::new();
        seed(&store, "earlier", 10).await;
        let feed = poll_feed(&store, HideBehavior::Keep);
        feed.load().await.unwrap();

        feed.submit(fields! { "text" => "later" }).await.unwrap();
        let records = feed.records();
        assert_eq!(texts(&records), ["earlier", "later"]);
        assert!(records.iter().all(|r| !r.pending));
    }
}

mod poll_on_toggle {
    use super::*;

    #[tokio::test]
    async fn test_showing_history_fetches_exactly_once() {
        let store = MemoryStore::new();
        seed(&store, "kept", 1).await;
        let feed = poll_feed(&store, HideBehavior::Clear);

        assert_eq!(store.fetch_count(), 0);
        assert!(feed.toggle_history().await.unwrap());
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(feed.records().len(), 1);

        assert!(!feed.toggle_history().await.unwrap());
        assert_eq!(store.fetch_count(), 1);
        assert!(feed.records().is_empty());
    }

    #[tokio::test]
    async fn test_remote_changes_wait_for_the_next_toggle() {
        let store = MemoryStore::new();
        let feed = poll_feed(&store, HideBehavior::Keep);
        feed.toggle_history().await.unwrap();
        assert!(feed.records().is_empty());

        seed(&store, "from another device", 5).await;
        assert!(feed.records().is_empty());

        feed.toggle_history().await.unwrap();
        assert!(feed.records().is_empty());
        feed.toggle_history().await.unwrap();
        assert_eq!(texts(&feed.records()), ["from another device"]);
    }

    #[tokio::test]
    async fn test_hiding_keeps_the_current_exchange() {
        let store = MemoryStore::new();
        seed(&store, "last week", 1_000).await;
        let feed = poll_feed(&store, HideBehavior::RetainRecent(Duration::from_secs(10)));

        feed.toggle_history().await.unwrap();
        feed.submit(fields! { "text" => "just now" }).await.unwrap();
        assert_eq!(feed.records().len(), 2);

        feed.toggle_history().await.unwrap();
        assert_eq!(texts(&feed.records()), ["just now"]);
    }
}

/// Memory store whose fetches take longer the later they are issued.
struct SlowFetchStore {
    inner: MemoryStore,
    delays: Vec<Duration>,
    fetches: AtomicUsize,
}

#[async_trait]
impl DocumentStore for SlowFetchStore {
    async fn add(&self, path: &CollectionPath, fields: Fields) -> StoreResult<RecordId> {
        self.inner.add(path, fields).await
    }

    async fn get(&self, path: &CollectionPath, order: &OrderBy) -> StoreResult<Vec<Record>> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(n) {
            tokio::time::sleep(*delay).await;
        }
        self.inner.get(path, order).await
    }

    async fn subscribe(&self, path: &CollectionPath, order: &OrderBy) -> StoreResult<SnapshotStream> {
        self.inner.subscribe(path, order).await
    }

    async fn update(&self, path: &CollectionPath, id: &RecordId, delta: Fields) -> StoreResult<()> {
        self.inner.update(path, id, delta).await
    }

    async fn delete(&self, path: &CollectionPath, id: &RecordId) -> StoreResult<()> {
        self.inner.delete(path, id).await
    }
}

mod overlapping_toggles {
    use super::*;

    #[tokio::test]
    async fn test_stale_fetch_leaves_newer_fetch_loading() {
        let memory = MemoryStore::new();
        seed(&memory, "older", 1).await;
        let store = SlowFetchStore {
            inner: memory.clone(),
            delays: vec![Duration::from_millis(50), Duration::from_millis(200)],
            fetches: AtomicUsize::new(0),
        };
        let feed = Arc::new(Feed::new(
            Arc::new(store),
            FeedConfig::new(
                messages_path(),
                OrderBy::ascending(TIMESTAMP_FIELD),
                SyncPolicy::PollOnToggle {
                    on_hide: HideBehavior::Keep,
                },
            ),
        ));

        let first = tokio::spawn({
            let feed = feed.clone();
            async move { feed.toggle_history().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!feed.toggle_history().await.unwrap());
        let second = tokio::spawn({
            let feed = feed.clone();
            async move { feed.toggle_history().await }
        });

        // the first fetch lands while the second is still in flight
        assert!(first.await.unwrap().unwrap());
        assert_eq!(feed.list().phase(), ListPhase::Loading);
        assert!(feed.records().is_empty());

        seed(&memory, "newer", 2).await;
        assert!(second.await.unwrap().unwrap());
        assert_eq!(feed.list().phase(), ListPhase::Loaded);
        assert_eq!(texts(&feed.records()), ["older", "newer"]);
    }

    #[tokio::test]
    async fn test_fetch_finishing_after_hide_is_dropped() {
        let memory = MemoryStore::new();
        seed(&memory, "late", 1).await;
        let store = SlowFetchStore {
            inner: memory.clone(),
            delays: vec![Duration::from_millis(50)],
            fetches: AtomicUsize::new(0),
        };
        let feed = Arc::new(Feed::new(
            Arc::new(store),
            FeedConfig::new(
                messages_path(),
                OrderBy::ascending(TIMESTAMP_FIELD),
                SyncPolicy::PollOnToggle {
                    on_hide: HideBehavior::Keep,
                },
            ),
        ));

        let shown = tokio::spawn({
            let feed = feed.clone();
            async move { feed.toggle_history().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!feed.toggle_history().await.unwrap());

        assert!(!shown.await.unwrap().unwrap());
        assert!(feed.records().is_empty());
        assert_ne!(feed.list().phase(), ListPhase::Loading);
    }
}

mod subscription {
    use super::*;

    #[tokio::test]
    async fn test_remote_writes_replace_the_list() {
        let store = MemoryStore::new();
        let feed = live_feed(&store);
        feed.start().await.unwrap();
        assert!(feed.is_subscribed());

        seed(&store, "one", 1).await;
        seed(&store, "two", 2).await;
        let state = settle(feed.list(), |s| s.len() == 2).await;
        assert_eq!(texts(&state.records), ["one", "two"]);

        let first = state.records[0].id.clone().unwrap();
        store.delete(&messages_path(), &first).await.unwrap();
        let state = settle(feed.list(), |s| s.len() == 1).await;
        assert_eq!(texts(&state.records), ["two"]);
    }

    #[tokio::test]
    async fn test_feeds_on_other_paths_are_untouched() {
        let store = MemoryStore::new();
        let feed = live_feed(&store);
        feed.start().await.unwrap();
        settle(feed.list(), |s| s.phase() == ListPhase::Loaded).await;

        store
            .add(
                &CollectionPath::root("chats").child("u2", "messages"),
                fields! { "text" => "not yours" },
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(feed.records().is_empty());
    }

    #[tokio::test]
    async fn test_restarting_keeps_a_single_listener() {
        let store = MemoryStore::new();
        let feed = live_feed(&store);
        feed.subscribe().await.unwrap();
        feed.subscribe().await.unwrap();
        assert!(feed.is_subscribed());

        seed(&store, "once", 1).await;
        let state = settle(feed.list(), |s| s.len() == 1).await;
        assert_eq!(texts(&state.records), ["once"]);
    }
}

mod offline {
    use super::*;

    #[tokio::test]
    async fn test_failed_write_rolls_back_by_default() {
        let store = MemoryStore::new();
        let feed = poll_feed(&store, HideBehavior::Keep);
        store.set_offline(true);

        let err = feed.submit(fields! { "text" => "lost" }).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable));
        assert!(feed.records().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_can_stay_visible() {
        let store = MemoryStore::new();
        let feed = Feed::new(
            Arc::new(store.clone()),
            FeedConfig::new(
                messages_path(),
                OrderBy::ascending(TIMESTAMP_FIELD),
                SyncPolicy::Subscription,
            )
            .on_write_failure(PendingFailure::Retain),
        );
        store.set_offline(true);

        assert!(feed.submit(fields! { "text" => "queued" }).await.is_err());
        let state = feed.list().snapshot();
        assert_eq!(state.pending_count(), 1);
        assert!(state.records[0].id.is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_records() {
        let store = MemoryStore::new();
        seed(&store, "cached", 1).await;
        let feed = poll_feed(&store, HideBehavior::Keep);
        feed.load().await.unwrap();

        store.set_offline(true);
        assert!(feed.load().await.is_err());
        assert_eq!(texts(&feed.records()), ["cached"]);
        assert_eq!(feed.list().phase(), ListPhase::Loaded);
    }

    #[tokio::test]
    async fn test_subscribe_while_offline_reports_error() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let feed = live_feed(&store);
        assert!(feed.start().await.is_err());
        assert!(!feed.is_subscribed());
        assert_ne!(feed.list().phase(), ListPhase::Loading);
    }
}
