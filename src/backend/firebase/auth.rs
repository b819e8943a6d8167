use super::error_message;
use crate::backend::{AuthError, AuthProvider, AuthResult, AuthUser, Credentials};
use crate::config::FirebaseConfig;
use crate::storage::{LocalStore, SESSION_NAMESPACE};
use crate::types::Timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::RwLock;
use std::time::Duration;

const SESSION_KEY: &str = "session";
/// Refresh a little before the backend considers the token expired.
const EXPIRY_MARGIN_MS: i64 = 60_000;

/// Signed-in state, persisted across launches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: Timestamp,
}

impl Session {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now.millis() + EXPIRY_MARGIN_MS >= self.expires_at.millis()
    }

    fn user(&self) -> AuthUser {
        AuthUser {
            uid: self.uid.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

fn expires_at(expires_in: &str) -> Timestamp {
    let seconds = expires_in.parse::<i64>().unwrap_or(3_600);
    Timestamp(Timestamp::now().millis() + seconds * 1_000)
}

/// Maps Identity Toolkit error codes onto [`AuthError`].
fn classify(message: &str) -> AuthError {
    let code = message.split([' ', ':']).next().unwrap_or_default();
    match code {
        "EMAIL_EXISTS" => AuthError::EmailExists,
        "EMAIL_NOT_FOUND" => AuthError::UnknownEmail,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" | "USER_DISABLED" => {
            AuthError::InvalidCredentials
        }
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => AuthError::NotSignedIn,
        _ => AuthError::Rejected(message.to_string()),
    }
}

/// Firebase Authentication over the Identity Toolkit REST API.
pub struct FirebaseAuth {
    client: reqwest::Client,
    config: FirebaseConfig,
    local: LocalStore,
    session: RwLock<Option<Session>>,
}

impl FirebaseAuth {
    /// Restores the persisted session, if any.
    pub fn new(config: FirebaseConfig, local: LocalStore) -> Self {
        let session = match local.get_json::<Session>(SESSION_NAMESPACE, SESSION_KEY) {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable auth session");
                None
            }
        };
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
            local,
            session: RwLock::new(session),
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|session| session.clone())
    }

    fn store_session(&self, session: Option<Session>) -> AuthResult<()> {
        let persisted = match &session {
            Some(session) => self.local.set_json(SESSION_NAMESPACE, SESSION_KEY, session),
            None => self.local.delete(SESSION_NAMESPACE, SESSION_KEY),
        };
        if let Err(err) = persisted {
            tracing::warn!(error = %err, "failed to persist auth session");
        }
        let mut current = self.session.write().map_err(|_| AuthError::Poisoned)?;
        *current = session;
        Ok(())
    }

    async fn post(&self, url: String, body: Value) -> AuthResult<Value> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(classify(&error_message(&text)));
        }
        serde_json::from_str(&text).map_err(|e| AuthError::Rejected(e.to_string()))
    }

    async fn accounts(&self, method: &str, body: Value) -> AuthResult<Value> {
        let url = format!(
            "{}/accounts:{}",
            self.config.auth_endpoint.trim_end_matches('/'),
            method
        );
        self.post(url, body).await
    }

    fn establish(&self, response: Value) -> AuthResult<AuthUser> {
        let parsed: SignInResponse =
            serde_json::from_value(response).map_err(|e| AuthError::Rejected(e.to_string()))?;
        let session = Session {
            uid: parsed.local_id,
            email: parsed.email,
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
            expires_at: expires_at(&parsed.expires_in),
        };
        let user = session.user();
        self.store_session(Some(session))?;
        tracing::info!(uid = %user.uid, "signed in");
        Ok(user)
    }

    /// Trades the refresh token for a fresh id token when the current one is
    /// about to expire.
    pub async fn refresh_session(&self) -> AuthResult<()> {
        let Some(session) = self.session() else {
            return Err(AuthError::NotSignedIn);
        };
        if !session.is_expired(Timestamp::now()) {
            return Ok(());
        }
        let url = format!("{}/token", self.config.token_endpoint.trim_end_matches('/'));
        let response = self
            .post(
                url,
                json!({ "grant_type": "refresh_token", "refresh_token": session.refresh_token }),
            )
            .await;
        let response = match response {
            Ok(response) => response,
            Err(err @ AuthError::NotSignedIn) => {
                self.store_session(None)?;
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        let parsed: RefreshResponse =
            serde_json::from_value(response).map_err(|e| AuthError::Rejected(e.to_string()))?;
        self.store_session(Some(Session {
            uid: parsed.user_id,
            email: session.email,
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
            expires_at: expires_at(&parsed.expires_in),
        }))
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    fn current_user(&self) -> Option<AuthUser> {
        self.session().map(|session| session.user())
    }

    async fn sign_in(&self, credentials: &Credentials) -> AuthResult<AuthUser> {
        let response = self
            .accounts(
                "signInWithPassword",
                json!({
                    "email": credentials.email,
                    "password": credentials.password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        self.establish(response)
    }

    async fn register(&self, credentials: &Credentials) -> AuthResult<AuthUser> {
        let response = self
            .accounts(
                "signUp",
                json!({
                    "email": credentials.email,
                    "password": credentials.password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        self.establish(response)
    }

    async fn sign_in_with_idp(&self, provider_id: &str, id_token: &str) -> AuthResult<AuthUser> {
        let response = self
            .accounts(
                "signInWithIdp",
                json!({
                    "postBody": format!("id_token={id_token}&providerId={provider_id}"),
                    "requestUri": "http://localhost",
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                }),
            )
            .await?;
        self.establish(response)
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        self.accounts(
            "sendOobCode",
            json!({ "requestType": "PASSWORD_RESET", "email": email }),
        )
        .await?;
        Ok(())
    }

    fn sign_out(&self) {
        if let Err(err) = self.store_session(None) {
            tracing::warn!(error = %err, "sign out failed");
        }
    }

    /// Expired tokens are never handed out; see [`AuthProvider::fresh_id_token`].
    fn id_token(&self) -> Option<String> {
        self.session()
            .filter(|session| !session.is_expired(Timestamp::now()))
            .map(|session| session.id_token)
    }

    async fn fresh_id_token(&self) -> AuthResult<Option<String>> {
        match self.session() {
            None => return Ok(None),
            Some(session) if session.is_expired(Timestamp::now()) => {
                tracing::debug!(uid = %session.uid, "refreshing expired id token");
                self.refresh_session().await?;
            }
            Some(_) => {}
        }
        Ok(self.id_token())
    }
}
