use crate::types::{CorrelationId, Fields, Record, RecordId, SortDirection, Timestamp};
use std::sync::Arc;
use tokio::sync::watch;

/// Where a list is in its load cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    /// Loaded, with at least one optimistic write not yet acknowledged.
    LoadedWithPending,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListState {
    pub records: Vec<Record>,
    loading: bool,
    settled: bool,
}

impl ListState {
    pub fn phase(&self) -> ListPhase {
        if self.loading {
            ListPhase::Loading
        } else if !self.settled {
            ListPhase::Idle
        } else if self.pending_count() > 0 {
            ListPhase::LoadedWithPending
        } else {
            ListPhase::Loaded
        }
    }

    pub fn pending_count(&self) -> usize {
        self.records.iter().filter(|r| r.pending).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Observable, ordered, in-memory mirror of one remote collection.
///
/// Clones share the same state. Every mutation notifies the receivers
/// returned by [`ReactiveList::watch`]. The list is always sorted by
/// `created_at` in its configured direction; records with equal keys keep
/// arrival order.
#[derive(Clone, Debug)]
pub struct ReactiveList {
    state: Arc<watch::Sender<ListState>>,
    direction: SortDirection,
}

impl ReactiveList {
    pub fn new(direction: SortDirection) -> Self {
        let (state, _) = watch::channel(ListState::default());
        Self {
            state: Arc::new(state),
            direction,
        }
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn watch(&self) -> watch::Receiver<ListState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ListState {
        self.state.borrow().clone()
    }

    pub fn records(&self) -> Vec<Record> {
        self.state.borrow().records.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn phase(&self) -> ListPhase {
        self.state.borrow().phase()
    }

    pub fn begin_loading(&self) {
        self.state.send_modify(|state| state.loading = true);
    }

    /// A load failed: fall back to whatever was showing before.
    pub fn abort_loading(&self) {
        self.state.send_modify(|state| state.loading = false);
    }

    fn insert_position(&self, records: &[Record], created_at: Timestamp) -> usize {
        match self.direction {
            SortDirection::Ascending => records.partition_point(|r| r.created_at <= created_at),
            SortDirection::Descending => records.partition_point(|r| r.created_at >= created_at),
        }
    }

    /// Optimistically inserts `record` at its sorted position.
    ///
    /// A record that is already visible under the same id or correlation id
    /// is not inserted again; returns whether the list changed.
    pub fn append(&self, record: Record) -> bool {
        self.state.send_if_modified(|state| {
            if state.records.iter().any(|existing| existing.same_entity(&record)) {
                return false;
            }
            let at = self.insert_position(&state.records, record.created_at);
            state.records.insert(at, record);
            state.settled = true;
            true
        })
    }

    /// Swaps the visible sequence for an authoritative snapshot.
    ///
    /// Optimistic entries missing from the snapshot are dropped. The snapshot
    /// is re-sorted and de-duplicated, so applying it twice is a no-op.
    pub fn replace_all(&self, records: Vec<Record>) {
        let mut next: Vec<Record> = Vec::with_capacity(records.len());
        for record in records {
            if !next.iter().any(|kept| kept.same_entity(&record)) {
                next.push(record);
            }
        }
        match self.direction {
            SortDirection::Ascending => next.sort_by_key(|r| r.created_at),
            SortDirection::Descending => next.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        self.state.send_modify(|state| {
            state.records = next;
            state.loading = false;
            state.settled = true;
        });
    }

    /// Removes the record with `id`. Unknown ids leave the list untouched.
    pub fn remove(&self, id: &RecordId) -> Option<Record> {
        let mut removed = None;
        self.state.send_if_modified(|state| {
            let index = state.records.iter().position(|r| r.id.as_ref() == Some(id));
            removed = index.map(|i| state.records.remove(i));
            removed.is_some()
        });
        removed
    }

    /// Marks the optimistic record as persisted under `id`.
    pub fn confirm(&self, correlation_id: &CorrelationId, id: RecordId) -> bool {
        self.state.send_if_modified(|state| {
            // A snapshot may already hold the stored copy.
            if state.records.iter().any(|r| r.id.as_ref() == Some(&id)) {
                let before = state.records.len();
                state
                    .records
                    .retain(|r| !(r.pending && r.correlation_id.as_ref() == Some(correlation_id)));
                return state.records.len() != before;
            }
            match state
                .records
                .iter_mut()
                .find(|r| r.correlation_id.as_ref() == Some(correlation_id))
            {
                Some(record) if record.pending => {
                    record.id = Some(id);
                    record.pending = false;
                    true
                }
                _ => false,
            }
        })
    }

    /// Drops an optimistic record whose write failed.
    pub fn discard_pending(&self, correlation_id: &CorrelationId) -> Option<Record> {
        let mut removed = None;
        self.state.send_if_modified(|state| {
            let index = state
                .records
                .iter()
                .position(|r| r.pending && r.correlation_id.as_ref() == Some(correlation_id));
            removed = index.map(|i| state.records.remove(i));
            removed.is_some()
        });
        removed
    }

    /// Merges `delta` into the record with `id`. A new value for
    /// `order_field` becomes the record's sort key and moves it into place.
    pub fn patch(&self, id: &RecordId, delta: &Fields, order_field: &str) -> bool {
        self.state.send_if_modified(|state| {
            let Some(index) = state.records.iter().position(|r| r.id.as_ref() == Some(id)) else {
                return false;
            };
            let mut record = state.records.remove(index);
            for (key, value) in delta {
                if key == order_field {
                    if let Some(millis) = value.as_i64() {
                        record.created_at = Timestamp(millis);
                    }
                } else {
                    record.fields.insert(key.clone(), value.clone());
                }
            }
            let at = self.insert_position(&state.records, record.created_at);
            state.records.insert(at, record);
            true
        })
    }

    /// Keeps only records created at or after `cutoff`.
    pub fn retain_since(&self, cutoff: Timestamp) {
        self.state.send_if_modified(|state| {
            let before = state.records.len();
            state.records.retain(|r| r.created_at >= cutoff);
            state.records.len() != before
        });
    }

    pub fn clear(&self) {
        self.state.send_modify(|state| state.records.clear());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::types::TIMESTAMP_FIELD;

    fn draft(text: &str, at: i64) -> Record {
        Record::draft(fields! { "text" => text }, Timestamp(at))
    }

    fn stored(id: &str, text: &str, at: i64) -> Record {
        Record {
            id: Some(RecordId::from(id)),
            correlation_id: None,
            fields: fields! { "text" => text },
            created_at: Timestamp(at),
            pending: false,
        }
    }

    fn texts(list: &ReactiveList) -> Vec<String> {
        list.records()
            .iter()
            .filter_map(|r| r.text("text").map(str::to_string))
            .collect()
    }

    #[test]
    fn test_append_keeps_sort_order() {
        let list = ReactiveList::new(SortDirection::Ascending);
        list.append(draft("b", 20));
        list.append(draft("a", 10));
        list.append(draft("c", 30));
        list.append(draft("b2", 20));
        assert_eq!(texts(&list), vec!["a", "b", "b2", "c"]);
    }

    #[test]
    fn test_append_descending() {
        let list = ReactiveList::new(SortDirection::Descending);
        list.append(draft("old", 1));
        list.append(draft("new", 5));
        assert_eq!(texts(&list), vec!["new", "old"]);
    }

    #[test]
    fn test_append_is_idempotent_per_correlation() {
        let list = ReactiveList::new(SortDirection::Ascending);
        let record = draft("a", 1);
        assert!(list.append(record.clone()));
        assert!(!list.append(record));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_replace_all_sorts_and_dedups() {
        let list = ReactiveList::new(SortDirection::Ascending);
        list.replace_all(vec![stored("2", "b", 2), stored("1", "a", 1), stored("2", "b", 2)]);
        assert_eq!(texts(&list), vec!["a", "b"]);
    }

    #[test]
    fn test_confirm_clears_pending() {
        let list = ReactiveList::new(SortDirection::Ascending);
        let record = draft("a", 1);
        let cid = record.correlation_id.unwrap();
        list.append(record);
        assert_eq!(list.phase(), ListPhase::LoadedWithPending);

        assert!(list.confirm(&cid, RecordId::from("doc-1")));
        let records = list.records();
        assert_eq!(records[0].id, Some(RecordId::from("doc-1")));
        assert_eq!(list.phase(), ListPhase::Loaded);
    }

    #[test]
    fn test_confirm_after_snapshot_drops_stale_copy() {
        let list = ReactiveList::new(SortDirection::Ascending);
        list.replace_all(vec![stored("doc-1", "a", 1)]);
        let late = draft("a", 1);
        let cid = late.correlation_id.unwrap();
        list.append(late);
        assert_eq!(list.len(), 2);

        list.confirm(&cid, RecordId::from("doc-1"));
        assert_eq!(list.len(), 1);
        assert!(!list.records()[0].pending);
    }

    #[test]
    fn test_phase_transitions() {
        let list = ReactiveList::new(SortDirection::Ascending);
        assert_eq!(list.phase(), ListPhase::Idle);
        list.begin_loading();
        assert_eq!(list.phase(), ListPhase::Loading);
        list.abort_loading();
        assert_eq!(list.phase(), ListPhase::Idle);
        list.begin_loading();
        list.replace_all(Vec::new());
        assert_eq!(list.phase(), ListPhase::Loaded);
    }

    #[test]
    fn test_patch_and_retain_since() {
        let list = ReactiveList::new(SortDirection::Ascending);
        list.replace_all(vec![stored("1", "a", 1), stored("2", "b", 50)]);
        assert!(list.patch(&RecordId::from("2"), &fields! { "isDone" => true }, TIMESTAMP_FIELD));
        assert!(!list.patch(&RecordId::from("9"), &fields! { "isDone" => true }, TIMESTAMP_FIELD));
        assert_eq!(list.records()[1].flag("isDone"), Some(true));

        list.retain_since(Timestamp(10));
        assert_eq!(texts(&list), vec!["b"]);
    }

    #[test]
    fn test_patching_the_sort_key_moves_the_record() {
        let list = ReactiveList::new(SortDirection::Ascending);
        list.replace_all(vec![stored("1", "a", 10), stored("2", "b", 20), stored("3", "c", 30)]);

        assert!(list.patch(&RecordId::from("1"), &fields! { "dueDate" => 25_i64 }, "dueDate"));
        assert_eq!(texts(&list), vec!["b", "a", "c"]);
        let moved = &list.records()[1];
        assert_eq!(moved.created_at, Timestamp(25));
        assert!(moved.fields.get("dueDate").is_none());
    }

    #[test]
    fn test_patching_other_fields_keeps_position() {
        let list = ReactiveList::new(SortDirection::Descending);
        list.replace_all(vec![stored("1", "a", 10), stored("2", "b", 20)]);
        assert!(list.patch(&RecordId::from("2"), &fields! { "text" => "b2" }, TIMESTAMP_FIELD));
        assert_eq!(texts(&list), vec!["b2", "a"]);
    }

    #[tokio::test]
    async fn test_watchers_see_mutations() {
        let list = ReactiveList::new(SortDirection::Ascending);
        let mut rx = list.watch();
        list.append(draft("a", 1));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}
