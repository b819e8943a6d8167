use crate::backend::Backend;
use crate::config::AppConfig;
use crate::notice::NoticeBoard;
use crate::screens::{
    AccountScreen, ChatScreen, EcoTracker, MoodScreen, SocialScreen, StudyPlanner,
};
use crate::storage::LocalStore;
use crate::types::UserId;
use std::sync::Arc;

/// Everything a screen needs, built once at startup and cloned into each
/// screen controller.
#[derive(Clone)]
pub struct AppContext {
    pub backend: Backend,
    pub notices: NoticeBoard,
    pub config: Arc<AppConfig>,
    pub local: LocalStore,
}

impl AppContext {
    pub fn new(config: AppConfig, local: LocalStore) -> Self {
        let backend = Backend::from_config(&config, local.clone());
        Self::with_backend(backend, config, local)
    }

    pub fn with_backend(backend: Backend, config: AppConfig, local: LocalStore) -> Self {
        Self {
            backend,
            notices: NoticeBoard::with_ttl(config.notice_ttl),
            config: Arc::new(config),
            local,
        }
    }

    /// Signed-in uid, or the anonymous sentinel.
    pub fn user_id(&self) -> UserId {
        self.backend.auth.current_user_id()
    }

    /// Signed-in uid, `None` for anonymous sessions.
    pub fn signed_in_user(&self) -> Option<UserId> {
        self.backend
            .auth
            .current_user()
            .map(|user| UserId(user.uid))
    }

    pub fn chat(&self) -> ChatScreen {
        ChatScreen::new(self.clone())
    }

    pub fn mood(&self) -> MoodScreen {
        MoodScreen::new(self.clone())
    }

    pub fn social(&self) -> SocialScreen {
        SocialScreen::new(self.clone())
    }

    pub fn planner(&self) -> StudyPlanner {
        StudyPlanner::new(self.clone())
    }

    pub fn eco(&self) -> EcoTracker {
        EcoTracker::new(self.clone())
    }

    pub fn account(&self) -> AccountScreen {
        AccountScreen::new(self.clone())
    }
}
