use super::error_message;
use super::value::{decode_document, encode_fields};
use crate::backend::{
    AuthError, AuthProvider, DocumentStore, SnapshotStream, StoreError, StoreResult, channel_stream,
};
use crate::config::FirebaseConfig;
use crate::types::{CollectionPath, Fields, OrderBy, Record, RecordId, SortDirection};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

const SNAPSHOT_BUFFER: usize = 4;

/// Cloud Firestore over its REST API.
///
/// The REST surface has no listen channel, so [`DocumentStore::subscribe`] is
/// a polling query that only emits when the ordered result set changes.
#[derive(Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    config: FirebaseConfig,
    auth: Arc<dyn AuthProvider>,
    poll_interval: Duration,
}

impl FirestoreStore {
    pub fn new(config: FirebaseConfig, auth: Arc<dyn AuthProvider>, poll_interval: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
            auth,
            poll_interval,
        }
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.config.firestore_endpoint.trim_end_matches('/'),
            self.config.project_id
        )
    }

    fn collection_url(&self, path: &CollectionPath) -> String {
        format!("{}/{}", self.documents_root(), path)
    }

    fn document_url(&self, path: &CollectionPath, id: &RecordId) -> String {
        format!("{}/{}", self.documents_root(), path.document(id))
    }

    /// runQuery is issued against the parent document, or the database root
    /// for top-level collections.
    fn run_query_url(&self, path: &CollectionPath) -> String {
        match path.parent_document() {
            Some(parent) => format!("{}/{}:runQuery", self.documents_root(), parent),
            None => format!("{}:runQuery", self.documents_root()),
        }
    }

    /// Starts a request carrying the api key and, when signed in, a bearer
    /// token that is refreshed first if it has expired.
    async fn request(&self, method: Method, url: &str) -> StoreResult<reqwest::RequestBuilder> {
        let mut request = self
            .client
            .request(method, url)
            .query(&[("key", self.config.api_key.as_str())]);
        let token = self.auth.fresh_id_token().await.map_err(|err| match err {
            AuthError::Http(_) => StoreError::Unavailable,
            other => StoreError::Rejected {
                status: reqwest::StatusCode::UNAUTHORIZED.as_u16(),
                message: other.to_string(),
            },
        })?;
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> StoreResult<Value> {
        let response = request.send().await.map_err(|err| {
            if err.is_connect() || err.is_timeout() {
                StoreError::Unavailable
            } else {
                StoreError::Http(err)
            }
        })?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(if status == reqwest::StatusCode::NOT_FOUND {
                StoreError::NotFound(error_message(&body))
            } else {
                StoreError::Rejected {
                    status: status.as_u16(),
                    message: error_message(&body),
                }
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn run_query(&self, path: &CollectionPath, order: &OrderBy) -> StoreResult<Vec<Record>> {
        let body = structured_query(path, order);
        let request = self
            .request(Method::POST, &self.run_query_url(path))
            .await?
            .json(&body);
        let response = self.send(request).await?;
        decode_query_response(&response, order)
    }
}

fn structured_query(path: &CollectionPath, order: &OrderBy) -> Value {
    let direction = match order.direction {
        SortDirection::Ascending => "ASCENDING",
        SortDirection::Descending => "DESCENDING",
    };
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": path.collection_id() }],
            "orderBy": [{
                "field": { "fieldPath": order.field },
                "direction": direction,
            }],
        }
    })
}

/// runQuery answers with one object per result; an empty result set comes
/// back as a single object without `document`.
fn decode_query_response(response: &Value, order: &OrderBy) -> StoreResult<Vec<Record>> {
    let rows = response
        .as_array()
        .ok_or_else(|| StoreError::Decode("runQuery response is not an array".to_string()))?;
    rows.iter()
        .filter_map(|row| row.get("document"))
        .map(|document| decode_document(document, &order.field))
        .collect()
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn add(&self, path: &CollectionPath, fields: Fields) -> StoreResult<RecordId> {
        let request = self
            .request(Method::POST, &self.collection_url(path))
            .await?
            .json(&json!({ "fields": encode_fields(&fields) }));
        let created = self.send(request).await?;
        let name = created
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Decode("created document has no name".to_string()))?;
        let id = super::value::document_id(name)
            .ok_or_else(|| StoreError::Decode(format!("bad document name '{name}'")))?;
        tracing::debug!(path = %path, id = %id, "firestore add");
        Ok(id)
    }

    async fn get(&self, path: &CollectionPath, order: &OrderBy) -> StoreResult<Vec<Record>> {
        self.run_query(path, order).await
    }

    async fn subscribe(
        &self,
        path: &CollectionPath,
        order: &OrderBy,
    ) -> StoreResult<SnapshotStream> {
        let store = self.clone();
        let path = path.clone();
        let order = order.clone();
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(store.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Vec<Record>> = None;
            let mut failing = false;

            loop {
                tokio::select! {
                    _ = tx.closed() => return,
                    _ = ticker.tick() => {}
                }
                let item = match store.run_query(&path, &order).await {
                    Ok(snapshot) => {
                        failing = false;
                        if last.as_ref() == Some(&snapshot) {
                            continue;
                        }
                        last = Some(snapshot.clone());
                        Ok(snapshot)
                    }
                    Err(err) => {
                        // report the first failure of a streak only
                        if failing {
                            continue;
                        }
                        failing = true;
                        tracing::warn!(path = %path, error = %err, "firestore poll failed");
                        Err(err)
                    }
                };
                if tx.send(item).await.is_err() {
                    return;
                }
            }
        });

        Ok(channel_stream(rx))
    }

    async fn update(&self, path: &CollectionPath, id: &RecordId, delta: Fields) -> StoreResult<()> {
        let mut params: Vec<(&str, &str)> = delta
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));
        let request = self
            .request(Method::PATCH, &self.document_url(path, id))
            .await?
            .query(&params)
            .json(&json!({ "fields": encode_fields(&delta) }));
        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, path: &CollectionPath, id: &RecordId) -> StoreResult<()> {
        let request = self
            .request(Method::DELETE, &self.document_url(path, id))
            .await?;
        self.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AuthResult, AuthUser, Credentials, MemoryAuth};
    use crate::types::TIMESTAMP_FIELD;

    fn store() -> FirestoreStore {
        FirestoreStore::new(
            FirebaseConfig::new("omnibot-101", "test-key"),
            Arc::new(MemoryAuth::new()),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_urls_for_nested_collection() {
        let store = store();
        let path = CollectionPath::root("moods").child("u1", "entries");
        assert_eq!(
            store.collection_url(&path),
            "https://firestore.googleapis.com/v1/projects/omnibot-101/databases/(default)/documents/moods/u1/entries"
        );
        assert_eq!(
            store.run_query_url(&path),
            "https://firestore.googleapis.com/v1/projects/omnibot-101/databases/(default)/documents/moods/u1:runQuery"
        );
        assert!(store
            .document_url(&path, &RecordId::from("e1"))
            .ends_with("/documents/moods/u1/entries/e1"));
    }

    /// Holds a token that only becomes valid after a refresh.
    struct RotatingAuth {
        refresh_fails: bool,
    }

    #[async_trait]
    impl AuthProvider for RotatingAuth {
        fn current_user(&self) -> Option<AuthUser> {
            None
        }

        async fn sign_in(&self, _: &Credentials) -> AuthResult<AuthUser> {
            Err(AuthError::NotSignedIn)
        }

        async fn register(&self, _: &Credentials) -> AuthResult<AuthUser> {
            Err(AuthError::NotSignedIn)
        }

        async fn sign_in_with_idp(&self, _: &str, _: &str) -> AuthResult<AuthUser> {
            Err(AuthError::NotSignedIn)
        }

        async fn send_password_reset(&self, _: &str) -> AuthResult<()> {
            Ok(())
        }

        fn sign_out(&self) {}

        fn id_token(&self) -> Option<String> {
            Some("stale".to_string())
        }

        async fn fresh_id_token(&self) -> AuthResult<Option<String>> {
            if self.refresh_fails {
                Err(AuthError::NotSignedIn)
            } else {
                Ok(Some("renewed".to_string()))
            }
        }
    }

    fn store_with(auth: RotatingAuth) -> FirestoreStore {
        FirestoreStore::new(
            FirebaseConfig::new("omnibot-101", "test-key"),
            Arc::new(auth),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_requests_carry_the_refreshed_token() {
        let store = store_with(RotatingAuth { refresh_fails: false });
        let request = store
            .request(Method::GET, "https://example.invalid/doc")
            .await
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer renewed"
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_rejects_the_request() {
        let store = store_with(RotatingAuth { refresh_fails: true });
        let request = store.request(Method::GET, "https://example.invalid/doc").await;
        assert!(matches!(request, Err(StoreError::Rejected { status: 401, .. })));
    }

    #[test]
    fn test_run_query_url_for_root_collection() {
        let store = store();
        assert!(store
            .run_query_url(&CollectionPath::root("socialize"))
            .ends_with("/databases/(default)/documents:runQuery"));
    }

    #[test]
    fn test_structured_query_body() {
        let body = structured_query(
            &CollectionPath::root("moods").child("u1", "entries"),
            &OrderBy::descending(TIMESTAMP_FIELD),
        );
        assert_eq!(body["structuredQuery"]["from"][0]["collectionId"], "entries");
        assert_eq!(body["structuredQuery"]["orderBy"][0]["field"]["fieldPath"], "timestamp");
        assert_eq!(body["structuredQuery"]["orderBy"][0]["direction"], "DESCENDING");
    }

    #[test]
    fn test_decode_empty_query_response() {
        let response = json!([{ "readTime": "2024-05-01T12:00:00Z" }]);
        let records = decode_query_response(&response, &OrderBy::ascending(TIMESTAMP_FIELD)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_decode_query_response_keeps_order() {
        let response = json!([
            { "document": { "name": "x/socialize/b", "fields": { "timestamp": { "integerValue": "1" } } } },
            { "document": { "name": "x/socialize/a", "fields": { "timestamp": { "integerValue": "2" } } } }
        ]);
        let records = decode_query_response(&response, &OrderBy::ascending(TIMESTAMP_FIELD)).unwrap();
        let ids: Vec<_> = records.iter().filter_map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![RecordId::from("b"), RecordId::from("a")]);
    }
}
