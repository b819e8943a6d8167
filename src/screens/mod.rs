//! Screen controllers
//!
//! Each screen owns one or more [`Feed`](crate::feed::Feed)s and the small
//! amount of state around them. Controllers are UI-agnostic: views observe
//! their lists and call their operations.
//!
//! - `chat` - chatbot conversation with keyword replies
//! - `replies` - reply and mood keyword matching
//! - `mood` - mood picker and journal
//! - `social` - public posts, contacts and direct messages
//! - `planner` - study tasks
//! - `eco` - eco activity tracker
//! - `account` - login, registration and password reset forms
pub mod account;
pub mod chat;
pub mod eco;
pub mod mood;
pub mod planner;
pub mod replies;
pub mod social;

pub use account::{AccountScreen, LoginForm, RegisterForm};
pub use chat::{ChatOutcome, ChatScreen};
pub use eco::{EcoLog, EcoState, EcoTracker};
pub use mood::{JournalEntry, Mood, MoodScreen};
pub use planner::{NewTask, STUDY_METHODS, StudyPlanner, StudyTask, suggest_methods};
pub use social::{Contact, SocialScreen};

use crate::error::{AppError, AppResult};
use crate::notice::NoticeBoard;

/// Trimmed input, or a validation error carrying `message`.
pub(crate) fn required(value: &str, message: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(AppError::validation(message))
    } else {
        Ok(value.to_string())
    }
}

/// Posts the failure of `result` as an error notice.
pub(crate) fn surface<T, E: Into<AppError>>(
    notices: &NoticeBoard,
    result: Result<T, E>,
) -> AppResult<T> {
    notices.report(result.map_err(Into::into))
}
