//! Integration tests for on-device storage
//!
//! Tests namespaced key/value storage and JSON preferences

use omnibot::storage::{LocalStore, PREFERENCES_NAMESPACE, SESSION_NAMESPACE, StorageError};
use serde::{Deserialize, Serialize};

fn store(name: &str) -> LocalStore {
    let root = std::env::temp_dir().join(format!(
        "omnibot-storage-{name}-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&root);
    LocalStore::new(root)
}

fn cleanup(local: &LocalStore) {
    let _ = std::fs::remove_dir_all(local.root());
}

mod key_value_tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let local = store("set-get");
        let value = r#"{"name": "test", "count": 42}"#;

        local
            .set(PREFERENCES_NAMESPACE, "profile", value)
            .expect("Failed to set storage");
        assert_eq!(
            local.get(PREFERENCES_NAMESPACE, "profile"),
            Some(value.to_string())
        );

        cleanup(&local);
    }

    #[test]
    fn test_get_nonexistent() {
        let local = store("missing");
        assert_eq!(local.get(PREFERENCES_NAMESPACE, "nonexistent_key"), None);
        assert!(!local.root().exists());
    }

    #[test]
    fn test_delete() {
        let local = store("delete");
        local.set(SESSION_NAMESPACE, "to_delete", "value").expect("Failed to set");
        assert!(local.get(SESSION_NAMESPACE, "to_delete").is_some());

        local.delete(SESSION_NAMESPACE, "to_delete").expect("Failed to delete");
        assert!(local.get(SESSION_NAMESPACE, "to_delete").is_none());

        // Deleting twice is fine
        local.delete(SESSION_NAMESPACE, "to_delete").expect("Failed to delete again");
    }

    #[test]
    fn test_set_overwrites_previous_value() {
        let local = store("overwrite");
        local.set(PREFERENCES_NAMESPACE, "theme", "dark").expect("Failed to set");
        local.set(PREFERENCES_NAMESPACE, "theme", "light").expect("Failed to set");
        assert_eq!(
            local.get(PREFERENCES_NAMESPACE, "theme"),
            Some("light".to_string())
        );
        cleanup(&local);
    }

    #[test]
    fn test_namespace_isolation() {
        let local = store("isolation");
        local.set(SESSION_NAMESPACE, "shared_key", "session").expect("Failed to set");
        local
            .set(PREFERENCES_NAMESPACE, "shared_key", "preferences")
            .expect("Failed to set");

        assert_eq!(
            local.get(SESSION_NAMESPACE, "shared_key"),
            Some("session".to_string())
        );
        local.delete(SESSION_NAMESPACE, "shared_key").expect("Failed to delete");
        assert!(local.get(SESSION_NAMESPACE, "shared_key").is_none());
        assert_eq!(
            local.get(PREFERENCES_NAMESPACE, "shared_key"),
            Some("preferences".to_string())
        );

        cleanup(&local);
    }

    #[test]
    fn test_special_characters_in_key() {
        let local = store("special");
        // Colons are sanitized in the file name
        local
            .set(PREFERENCES_NAMESPACE, "user:preferences:theme", "neon")
            .expect("Failed to set");

        assert!(local
            .root()
            .join(PREFERENCES_NAMESPACE)
            .join("user_preferences_theme.json")
            .exists());
        assert_eq!(
            local.get(PREFERENCES_NAMESPACE, "user:preferences:theme"),
            Some("neon".to_string())
        );

        cleanup(&local);
    }
}

mod json_tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        uid: String,
        refresh_token: String,
    }

    #[test]
    fn test_json_round_trip() {
        let local = store("json");
        let session = Session {
            uid: "user-1".to_string(),
            refresh_token: "refresh".to_string(),
        };
        local
            .set_json(SESSION_NAMESPACE, "current", &session)
            .expect("Failed to write session");

        let loaded: Option<Session> = local
            .get_json(SESSION_NAMESPACE, "current")
            .expect("Failed to read session");
        assert_eq!(loaded, Some(session));

        cleanup(&local);
    }

    #[test]
    fn test_missing_json_is_none() {
        let local = store("json-missing");
        let loaded: Option<bool> = local
            .get_json(PREFERENCES_NAMESPACE, "ai_mode")
            .expect("Missing entries are not errors");
        assert_eq!(loaded, None);
    }

    #[test]
    fn test_corrupt_json_is_an_error() {
        let local = store("json-corrupt");
        local
            .set(PREFERENCES_NAMESPACE, "ai_mode", "not json")
            .expect("Failed to set");

        let loaded = local.get_json::<bool>(PREFERENCES_NAMESPACE, "ai_mode");
        assert!(matches!(loaded, Err(StorageError::Serde(_))));

        cleanup(&local);
    }
}
