//! Firebase REST adapters
//!
//! - `firestore` - Cloud Firestore documents API (add, runQuery, patch, delete)
//! - `auth` - Identity Toolkit email/password and IdP sign-in
//! - `value` - Firestore typed-value JSON codec
mod auth;
mod firestore;
pub mod value;

pub use auth::{FirebaseAuth, Session};
pub use firestore::FirestoreStore;

use serde::Deserialize;

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Pulls `error.message` out of a Google API error body, falling back to the
/// raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"code": 400, "message": "EMAIL_EXISTS", "errors": []}}"#;
        assert_eq!(error_message(body), "EMAIL_EXISTS");
        assert_eq!(error_message(" upstream timeout \n"), "upstream timeout");
    }
}
