use super::replies::{DetectedMood, REDIRECT_MESSAGE, detect_mood, reply_for};
use super::{required, surface};
use crate::app::AppContext;
use crate::error::AppResult;
use crate::feed::{Feed, FeedConfig, HideBehavior, PendingFailure, SyncPolicy};
use crate::fields;
use crate::storage::PREFERENCES_NAMESPACE;
use crate::types::{CollectionPath, OrderBy, Record, TIMESTAMP_FIELD};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;

const AI_MODE_KEY: &str = "ai_mode";
/// Messages younger than this survive hiding the history.
pub const RECENT_WINDOW: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChatOutcome {
    /// The user sounded down; the caller should switch to the mood screen.
    pub redirect_to_mood: bool,
}

pub struct ChatScreen {
    ctx: AppContext,
    feed: Feed,
    ai_mode: AtomicBool,
    typing: watch::Sender<bool>,
}

impl ChatScreen {
    pub fn new(ctx: AppContext) -> Self {
        let path = CollectionPath::root("chats").child(ctx.user_id().as_str(), "messages");
        let feed = Feed::new(
            ctx.backend.store.clone(),
            FeedConfig::new(
                path,
                OrderBy::ascending(TIMESTAMP_FIELD),
                SyncPolicy::PollOnToggle {
                    on_hide: HideBehavior::RetainRecent(RECENT_WINDOW),
                },
            )
            .on_write_failure(PendingFailure::Retain),
        );
        let ai_mode = match ctx.local.get_json::<bool>(PREFERENCES_NAMESPACE, AI_MODE_KEY) {
            Ok(saved) => saved.unwrap_or(false),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable ai mode preference");
                false
            }
        };
        let (typing, _) = watch::channel(false);
        Self {
            ctx,
            feed,
            ai_mode: AtomicBool::new(ai_mode),
            typing,
        }
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    pub fn messages(&self) -> Vec<Record> {
        self.feed.records()
    }

    pub fn ai_mode(&self) -> bool {
        self.ai_mode.load(Ordering::Relaxed)
    }

    pub fn set_ai_mode(&self, enabled: bool) {
        self.ai_mode.store(enabled, Ordering::Relaxed);
        if let Err(err) = self
            .ctx
            .local
            .set_json(PREFERENCES_NAMESPACE, AI_MODE_KEY, &enabled)
        {
            tracing::warn!(error = %err, "failed to persist ai mode");
        }
    }

    /// Whether the bot is composing a reply.
    pub fn typing(&self) -> watch::Receiver<bool> {
        self.typing.subscribe()
    }

    pub fn history_visible(&self) -> bool {
        self.feed.history_visible()
    }

    pub async fn toggle_history(&self) -> AppResult<bool> {
        surface(&self.ctx.notices, self.feed.toggle_history().await)
    }

    /// Write failures are surfaced but don't stop the conversation; the
    /// message stays visible as pending.
    async fn say(&self, text: &str, is_user: bool) {
        let written = self
            .feed
            .submit(fields! { "text" => text, "isUser" => is_user })
            .await;
        let _ = surface(&self.ctx.notices, written);
    }

    pub async fn send(&self, input: &str) -> AppResult<ChatOutcome> {
        let input = surface(
            &self.ctx.notices,
            required(input, "Type a message first"),
        )?;
        self.say(&input, true).await;

        self.typing.send_replace(true);
        tokio::time::sleep(self.ctx.config.reply_delay).await;
        let reply = reply_for(&input, self.ai_mode());
        self.say(reply, false).await;
        self.typing.send_replace(false);

        if detect_mood(&input) != DetectedMood::Sad {
            return Ok(ChatOutcome::default());
        }
        tracing::debug!("sad input, redirecting to mood screen");
        self.say(REDIRECT_MESSAGE, false).await;
        tokio::time::sleep(self.ctx.config.redirect_delay).await;
        Ok(ChatOutcome {
            redirect_to_mood: true,
        })
    }
}
