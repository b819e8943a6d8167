use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// Field under which the client correlation id travels with every write.
pub const CORRELATION_FIELD: &str = "_cid";

/// Default sort key written by every feed.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Pseudo field that orders a query by document id.
pub const DOCUMENT_ID_FIELD: &str = "__name__";

/// Unix time in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self::from_datetime(OffsetDateTime::now_utc())
    }

    pub fn from_datetime(datetime: OffsetDateTime) -> Self {
        Self((datetime.unix_timestamp_nanos() / 1_000_000) as i64)
    }

    pub fn millis(self) -> i64 {
        self.0
    }

    pub fn to_datetime(self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(self.0 as i128 * 1_000_000).ok()
    }

    pub fn saturating_sub_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_sub(millis))
    }
}

/// Backend-assigned document id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Client-generated id that ties an optimistic record to the document the
/// backend eventually stores for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signed-in user id, or the anonymous sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub const ANONYMOUS: &'static str = "anonymous";

    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_string())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == Self::ANONYMOUS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(Timestamp),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            FieldValue::Timestamp(ts) => Some(ts.millis()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value.into_iter().map(FieldValue::String).collect())
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

/// Builds a [`Fields`] map from `key => value` pairs.
#[macro_export]
macro_rules! fields {
    () => { $crate::types::Fields::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::types::Fields::new();
        $( map.insert(($key).to_string(), $crate::types::FieldValue::from($value)); )+
        map
    }};
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    pub fn by_document_id() -> Self {
        Self::ascending(DOCUMENT_ID_FIELD)
    }

    pub fn is_document_id(&self) -> bool {
        self.field == DOCUMENT_ID_FIELD
    }
}

/// Slash-separated path to a collection: `chats/{uid}/messages`.
///
/// Segments alternate collection and document names, so a valid path always
/// has an odd number of segments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    pub fn root(collection: impl Into<String>) -> Self {
        Self {
            segments: vec![collection.into()],
        }
    }

    /// Descends into `document` and then its sub-collection `collection`.
    pub fn child(&self, document: impl Into<String>, collection: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(document.into());
        segments.push(collection.into());
        Self { segments }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let segments: Vec<String> = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() || segments.len() % 2 == 0 {
            return None;
        }
        Some(Self { segments })
    }

    pub fn collection_id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Path of the document that owns this collection, if it is nested.
    pub fn parent_document(&self) -> Option<String> {
        if self.segments.len() < 3 {
            return None;
        }
        Some(self.segments[..self.segments.len() - 1].join("/"))
    }

    pub fn document(&self, id: &RecordId) -> String {
        format!("{}/{}", self, id)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// One persisted item: a chat message, post, journal entry, task or eco log.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub id: Option<RecordId>,
    pub correlation_id: Option<CorrelationId>,
    pub fields: Fields,
    pub created_at: Timestamp,
    pub pending: bool,
}

impl Record {
    /// A not-yet-persisted record with a fresh correlation id.
    pub fn draft(fields: Fields, created_at: Timestamp) -> Self {
        Self {
            id: None,
            correlation_id: Some(CorrelationId::generate()),
            fields,
            created_at,
            pending: true,
        }
    }

    /// Builds a confirmed record from a stored document. The order field and
    /// correlation field are lifted out of `fields`.
    pub fn from_document(id: RecordId, mut fields: Fields, order_field: &str) -> Self {
        let created_at = fields
            .remove(order_field)
            .and_then(|value| value.as_i64())
            .map(Timestamp)
            .unwrap_or_default();
        let correlation_id = fields
            .remove(CORRELATION_FIELD)
            .and_then(|value| value.as_str().and_then(CorrelationId::parse));
        Self {
            id: Some(id),
            correlation_id,
            fields,
            created_at,
            pending: false,
        }
    }

    /// Fields as written to the backend, sort key and correlation id included.
    pub fn to_document(&self, order_field: &str) -> Fields {
        let mut fields = self.fields.clone();
        fields.insert(order_field.to_string(), FieldValue::Int(self.created_at.millis()));
        if let Some(cid) = self.correlation_id {
            fields.insert(CORRELATION_FIELD.to_string(), FieldValue::String(cid.to_string()));
        }
        fields
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(FieldValue::as_str)
    }

    pub fn flag(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(FieldValue::as_bool)
    }

    /// True when both records stand for the same logical write.
    pub fn same_entity(&self, other: &Record) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) if a == b => return true,
            _ => {}
        }
        matches!((self.correlation_id, other.correlation_id), (Some(a), Some(b)) if a == b)
    }
}
