use super::{required, surface};
use crate::app::AppContext;
use crate::backend::AuthError;
use crate::error::{AppError, AppResult};
use crate::feed::{Feed, FeedConfig, HideBehavior, SyncPolicy};
use crate::fields;
use crate::types::{CollectionPath, FieldValue, OrderBy, Record, TIMESTAMP_FIELD, Timestamp};
use time::{Date, OffsetDateTime};
use tokio::sync::watch;

pub const DEFAULT_ACTIVITIES: [&str; 4] = [
    "Turned off unused lights",
    "Used public transport",
    "Recycled plastic",
    "Carried a reusable bottle",
];

/// A badge is awarded every time the points reach a multiple of this.
pub const BADGE_EVERY: i64 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EcoState {
    pub activities: Vec<String>,
    pub completed: Vec<String>,
    pub points: i64,
    pub badge: Option<String>,
    pub logged_on: Option<Date>,
}

impl Default for EcoState {
    fn default() -> Self {
        Self {
            activities: DEFAULT_ACTIVITIES.iter().map(|a| a.to_string()).collect(),
            completed: Vec::new(),
            points: 0,
            badge: None,
            logged_on: None,
        }
    }
}

impl EcoState {
    pub fn is_completed(&self, activity: &str) -> bool {
        self.completed.iter().any(|done| done == activity)
    }
}

/// One saved day of progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EcoLog {
    pub saved_at: Timestamp,
    pub completed: Vec<String>,
    pub points: i64,
}

impl EcoLog {
    pub fn from_record(record: &Record) -> Self {
        let completed = record
            .fields
            .get("completed")
            .and_then(FieldValue::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(FieldValue::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            saved_at: record.created_at,
            completed,
            points: record
                .fields
                .get("ecoPoints")
                .and_then(FieldValue::as_i64)
                .unwrap_or(0),
        }
    }
}

fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

pub struct EcoTracker {
    ctx: AppContext,
    state: watch::Sender<EcoState>,
    history: Option<Feed>,
}

impl EcoTracker {
    pub fn new(ctx: AppContext) -> Self {
        let history = ctx.signed_in_user().map(|user| {
            Feed::new(
                ctx.backend.store.clone(),
                FeedConfig::new(
                    CollectionPath::root("users").child(user.as_str(), "ecoProgress"),
                    OrderBy::descending(TIMESTAMP_FIELD),
                    SyncPolicy::PollOnToggle {
                        on_hide: HideBehavior::Keep,
                    },
                ),
            )
        });
        let (state, _) = watch::channel(EcoState::default());
        Self {
            ctx,
            state,
            history,
        }
    }

    pub fn watch(&self) -> watch::Receiver<EcoState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> EcoState {
        self.state.borrow().clone()
    }

    pub fn history_feed(&self) -> Option<&Feed> {
        self.history.as_ref()
    }

    /// Flips an activity; returns whether it is now completed.
    pub fn toggle_activity(&self, activity: &str) -> bool {
        let mut now_completed = false;
        self.state.send_if_modified(|state| {
            if !state.activities.iter().any(|a| a == activity) {
                return false;
            }
            if state.is_completed(activity) {
                state.completed.retain(|done| done != activity);
                state.points -= 1;
            } else {
                state.completed.push(activity.to_string());
                state.points += 1;
                now_completed = true;
                if state.points % BADGE_EVERY == 0 {
                    state.badge = Some(format!("🎉 Achievement: {} Eco Points!", state.points));
                }
            }
            true
        });
        now_completed
    }

    pub fn add_activity(&self, activity: &str) -> AppResult<()> {
        let activity = surface(&self.ctx.notices, required(activity, "Name the activity first"))?;
        let added = self.state.send_if_modified(|state| {
            if state.activities.contains(&activity) {
                return false;
            }
            state.activities.push(activity.clone());
            true
        });
        if !added {
            return surface(
                &self.ctx.notices,
                Err(AppError::validation("That activity is already on the list")),
            );
        }
        Ok(())
    }

    /// Removing a completed activity also takes back its point.
    pub fn remove_activity(&self, activity: &str) -> bool {
        self.state.send_if_modified(|state| {
            let before = state.activities.len();
            state.activities.retain(|a| a != activity);
            if state.activities.len() == before {
                return false;
            }
            if state.is_completed(activity) {
                state.completed.retain(|done| done != activity);
                state.points -= 1;
            }
            true
        })
    }

    /// Stores today's checklist. Only one save per day; returns false when
    /// today was already logged.
    pub async fn save_progress(&self) -> AppResult<bool> {
        let today = today();
        if self.state.borrow().logged_on == Some(today) {
            self.ctx.notices.info("You've already logged today 🌿");
            return Ok(false);
        }
        let feed = surface(
            &self.ctx.notices,
            self.history
                .as_ref()
                .ok_or(AppError::Auth(AuthError::NotSignedIn)),
        )?;

        let snapshot = self.state();
        let written = feed
            .submit(fields! {
                "activities" => snapshot.activities,
                "completed" => snapshot.completed,
                "ecoPoints" => snapshot.points,
            })
            .await;
        surface(&self.ctx.notices, written)?;
        self.state.send_modify(|state| state.logged_on = Some(today));
        self.ctx.notices.info("Progress saved! ☁️");
        Ok(true)
    }

    pub fn history_visible(&self) -> bool {
        self.history.as_ref().is_some_and(Feed::history_visible)
    }

    pub async fn toggle_history(&self) -> AppResult<bool> {
        let feed = surface(
            &self.ctx.notices,
            self.history
                .as_ref()
                .ok_or(AppError::Auth(AuthError::NotSignedIn)),
        )?;
        surface(&self.ctx.notices, feed.toggle_history().await)
    }

    /// Newest first.
    pub fn history(&self) -> Vec<EcoLog> {
        self.history
            .as_ref()
            .map(|feed| feed.records().iter().map(EcoLog::from_record).collect())
            .unwrap_or_default()
    }
}
