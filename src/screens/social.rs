use super::{required, surface};
use crate::app::AppContext;
use crate::error::{AppError, AppResult};
use crate::feed::{Feed, FeedConfig, HideBehavior, PendingFailure, SyncPolicy, lock};
use crate::fields;
use crate::types::{CollectionPath, OrderBy, Record, RecordId, TIMESTAMP_FIELD, UserId};
use std::sync::{Arc, Mutex};

/// Another user from the `users` directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contact {
    pub id: String,
    pub name: String,
}

impl Contact {
    fn from_record(record: &Record) -> Option<Self> {
        let id = record.id.as_ref()?.as_str().to_string();
        let name = record
            .text("username")
            .or_else(|| record.text("email"))
            .map(str::trim)
            .filter(|name| !name.is_empty())?;
        Some(Self {
            id,
            name: name.to_string(),
        })
    }
}

struct Conversation {
    contact: Contact,
    feed: Arc<Feed>,
}

/// Public wall, contact directory and one open direct conversation.
pub struct SocialScreen {
    ctx: AppContext,
    user: UserId,
    posts: Feed,
    directory: Feed,
    conversation: Mutex<Option<Conversation>>,
}

impl SocialScreen {
    pub fn new(ctx: AppContext) -> Self {
        let store = ctx.backend.store.clone();
        let posts = Feed::new(
            store.clone(),
            FeedConfig::new(
                CollectionPath::root("socialize"),
                OrderBy::ascending(TIMESTAMP_FIELD),
                SyncPolicy::Subscription,
            )
            .on_write_failure(PendingFailure::Retain),
        );
        let directory = Feed::new(
            store,
            FeedConfig::new(
                CollectionPath::root("users"),
                OrderBy::by_document_id(),
                SyncPolicy::PollOnToggle {
                    on_hide: HideBehavior::Keep,
                },
            ),
        );
        Self {
            user: ctx.user_id(),
            ctx,
            posts,
            directory,
            conversation: Mutex::new(None),
        }
    }

    /// Starts the wall listener and loads the contact directory.
    pub async fn start(&self) -> AppResult<()> {
        surface(&self.ctx.notices, self.posts.start().await)?;
        surface(&self.ctx.notices, self.directory.load().await)?;
        Ok(())
    }

    pub fn posts(&self) -> &Feed {
        &self.posts
    }

    pub async fn post(&self, text: &str) -> AppResult<Record> {
        let text = surface(&self.ctx.notices, required(text, "Write a post first"))?;
        let written = self
            .posts
            .submit(fields! { "text" => text, "userId" => self.user.as_str() })
            .await;
        surface(&self.ctx.notices, written)
    }

    pub async fn delete_post(&self, id: &RecordId) -> AppResult<()> {
        surface(&self.ctx.notices, self.posts.delete(id).await)
    }

    /// Everyone in the directory except the current user.
    pub fn contacts(&self) -> Vec<Contact> {
        self.directory
            .records()
            .iter()
            .filter_map(Contact::from_record)
            .filter(|contact| contact.id != self.user.as_str())
            .collect()
    }

    pub async fn refresh_contacts(&self) -> AppResult<usize> {
        surface(&self.ctx.notices, self.directory.load().await)
    }

    /// Opens the conversation with `contact`, replacing any open one.
    pub async fn select_contact(&self, contact: Contact) -> AppResult<Arc<Feed>> {
        self.close_conversation();
        let path = CollectionPath::root("dm").child(self.user.as_str(), contact.id.as_str());
        let feed = Arc::new(Feed::new(
            self.ctx.backend.store.clone(),
            FeedConfig::new(
                path,
                OrderBy::ascending(TIMESTAMP_FIELD),
                SyncPolicy::Subscription,
            )
            .on_write_failure(PendingFailure::Retain),
        ));
        surface(&self.ctx.notices, feed.start().await)?;
        tracing::debug!(contact = %contact.id, "conversation opened");
        *lock(&self.conversation) = Some(Conversation {
            contact,
            feed: feed.clone(),
        });
        Ok(feed)
    }

    pub fn selected_contact(&self) -> Option<Contact> {
        lock(&self.conversation)
            .as_ref()
            .map(|conversation| conversation.contact.clone())
    }

    pub fn conversation(&self) -> Option<Arc<Feed>> {
        lock(&self.conversation)
            .as_ref()
            .map(|conversation| conversation.feed.clone())
    }

    /// Stops listening to the open conversation.
    pub fn close_conversation(&self) {
        if let Some(conversation) = lock(&self.conversation).take() {
            conversation.feed.unsubscribe();
        }
    }

    fn open_conversation(&self) -> AppResult<Arc<Feed>> {
        let feed = self.conversation();
        surface(
            &self.ctx.notices,
            feed.ok_or_else(|| AppError::validation("Pick a contact first")),
        )
    }

    pub async fn send_dm(&self, text: &str) -> AppResult<Record> {
        let feed = self.open_conversation()?;
        let text = surface(&self.ctx.notices, required(text, "Write a message first"))?;
        let written = feed
            .submit(fields! { "text" => text, "userId" => self.user.as_str() })
            .await;
        surface(&self.ctx.notices, written)
    }

    pub async fn delete_dm(&self, id: &RecordId) -> AppResult<()> {
        let feed = self.open_conversation()?;
        surface(&self.ctx.notices, feed.delete(id).await)
    }
}

impl Drop for SocialScreen {
    fn drop(&mut self) {
        self.posts.unsubscribe();
        self.close_conversation();
    }
}
