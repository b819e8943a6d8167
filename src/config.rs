//! Runtime configuration
//!
//! Everything is read from environment variables. The binary loads a `.env`
//! file (desktop) or the bundled `assets/config.env` (mobile) into the
//! environment before calling [`AppConfig::from_env`].

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_AUTH_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://securetoken.googleapis.com/v1";

const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_REPLY_DELAY_MS: u64 = 1_500;
const DEFAULT_REDIRECT_DELAY_MS: u64 = 1_000;
const DEFAULT_NOTICE_TTL_MS: u64 = 3_000;
const DEFAULT_LOG_FILTER: &str = "omnibot=info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub api_key: String,
    pub firestore_endpoint: String,
    pub auth_endpoint: String,
    pub token_endpoint: String,
}

impl FirebaseConfig {
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            firestore_endpoint: DEFAULT_FIRESTORE_ENDPOINT.to_string(),
            auth_endpoint: DEFAULT_AUTH_ENDPOINT.to_string(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Firebase(FirebaseConfig),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendKind,
    /// Refresh interval of REST-backed subscriptions.
    pub poll_interval: Duration,
    /// Pause before the chatbot answers.
    pub reply_delay: Duration,
    /// Pause between the mood warning and the redirect to the mood screen.
    pub redirect_delay: Duration,
    /// How long a notice stays up; `None` keeps notices until dismissed.
    pub notice_ttl: Option<Duration>,
    pub data_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            reply_delay: Duration::from_millis(DEFAULT_REPLY_DELAY_MS),
            redirect_delay: Duration::from_millis(DEFAULT_REDIRECT_DELAY_MS),
            notice_ttl: Some(Duration::from_millis(DEFAULT_NOTICE_TTL_MS)),
            data_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes `std::env`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend_name = get("OMNIBOT_BACKEND").unwrap_or_else(|| "memory".to_string());
        let backend = match backend_name.to_ascii_lowercase().as_str() {
            "memory" | "offline" => BackendKind::Memory,
            "firebase" | "firestore" => {
                let project_id = get("FIREBASE_PROJECT_ID").ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))?;
                let api_key = get("FIREBASE_API_KEY").ok_or(ConfigError::Missing("FIREBASE_API_KEY"))?;
                let mut firebase = FirebaseConfig::new(project_id, api_key);
                if let Some(endpoint) = get("FIRESTORE_ENDPOINT") {
                    firebase.firestore_endpoint = endpoint;
                }
                if let Some(endpoint) = get("FIREBASE_AUTH_ENDPOINT") {
                    firebase.auth_endpoint = endpoint;
                }
                if let Some(endpoint) = get("FIREBASE_TOKEN_ENDPOINT") {
                    firebase.token_endpoint = endpoint;
                }
                BackendKind::Firebase(firebase)
            }
            _ => {
                return Err(ConfigError::Invalid {
                    key: "OMNIBOT_BACKEND",
                    value: backend_name,
                });
            }
        };

        let millis = |key: &'static str, default: u64| -> Result<Duration, ConfigError> {
            match get(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|_| ConfigError::Invalid { key, value: raw }),
                None => Ok(Duration::from_millis(default)),
            }
        };

        Ok(Self {
            backend,
            poll_interval: millis("OMNIBOT_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
            reply_delay: millis("OMNIBOT_REPLY_DELAY_MS", DEFAULT_REPLY_DELAY_MS)?,
            redirect_delay: millis("OMNIBOT_REDIRECT_DELAY_MS", DEFAULT_REDIRECT_DELAY_MS)?,
            notice_ttl: Some(millis("OMNIBOT_NOTICE_TTL_MS", DEFAULT_NOTICE_TTL_MS)?)
                .filter(|ttl| !ttl.is_zero()),
            data_dir: get("OMNIBOT_DATA_DIR").map(PathBuf::from),
            log_filter: get("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    /// Config for tests and previews: memory backend, no artificial delays.
    pub fn instant() -> Self {
        Self {
            reply_delay: Duration::ZERO,
            redirect_delay: Duration::ZERO,
            notice_ttl: None,
            poll_interval: Duration::from_millis(50),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_memory_backend() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.reply_delay, Duration::from_millis(1_500));
        assert_eq!(config.log_filter, "omnibot=info");
        assert_eq!(config.notice_ttl, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_zero_notice_ttl_disables_expiry() {
        let config = AppConfig::from_lookup(lookup(&[("OMNIBOT_NOTICE_TTL_MS", "0")])).unwrap();
        assert_eq!(config.notice_ttl, None);
    }

    #[test]
    fn test_firebase_requires_project_and_key() {
        let err = AppConfig::from_lookup(lookup(&[("OMNIBOT_BACKEND", "firebase")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("FIREBASE_PROJECT_ID")));

        let config = AppConfig::from_lookup(lookup(&[
            ("OMNIBOT_BACKEND", "firebase"),
            ("FIREBASE_PROJECT_ID", "omnibot-101"),
            ("FIREBASE_API_KEY", "key"),
            ("FIRESTORE_ENDPOINT", "http://localhost:8080/v1"),
        ]))
        .unwrap();
        match config.backend {
            BackendKind::Firebase(firebase) => {
                assert_eq!(firebase.project_id, "omnibot-101");
                assert_eq!(firebase.firestore_endpoint, "http://localhost:8080/v1");
                assert_eq!(firebase.auth_endpoint, DEFAULT_AUTH_ENDPOINT);
            }
            other => panic!("unexpected backend {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_durations_and_backends() {
        let err = AppConfig::from_lookup(lookup(&[("OMNIBOT_REPLY_DELAY_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "OMNIBOT_REPLY_DELAY_MS", .. }));

        let err = AppConfig::from_lookup(lookup(&[("OMNIBOT_BACKEND", "sqlite")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "OMNIBOT_BACKEND", .. }));
    }
}
