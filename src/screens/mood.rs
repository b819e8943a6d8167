use super::{required, surface};
use crate::app::AppContext;
use crate::error::{AppError, AppResult};
use crate::feed::{Feed, FeedConfig, HideBehavior, SyncPolicy, lock};
use crate::fields;
use crate::types::{CollectionPath, OrderBy, Record, RecordId, TIMESTAMP_FIELD, Timestamp};
use std::fmt;
use std::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Anxious,
    Calm,
    Excited,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Angry,
        Mood::Anxious,
        Mood::Calm,
        Mood::Excited,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Sad => "Sad",
            Mood::Angry => "Angry",
            Mood::Anxious => "Anxious",
            Mood::Calm => "Calm",
            Mood::Excited => "Excited",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Sad => "😢",
            Mood::Angry => "😠",
            Mood::Anxious => "😰",
            Mood::Calm => "😌",
            Mood::Excited => "🤩",
        }
    }

    /// Music suggestion for the mood.
    pub fn playlist_url(self) -> &'static str {
        match self {
            Mood::Happy => "https://open.spotify.com/playlist/37i9dQZF1DX3rxVfibe1L0",
            Mood::Sad => "https://youtube.com/playlist?list=PLS0gTslZhzziJ59zUQzyYFZbWhP0d6WlV",
            Mood::Angry => "https://open.spotify.com/playlist/37i9dQZF1DWZ3xRu8ajLOe",
            Mood::Anxious => "https://youtube.com/playlist?list=PLsRNoUx8w3r0I-JiAqjqTTWB3N8eCw5Ht",
            Mood::Calm => "https://open.spotify.com/playlist/37i9dQZF1DWU0ScTcjJBdj",
            Mood::Excited => "https://youtube.com/playlist?list=PLAtI1vclF6KD5V-7vXooxAqh9M0wnc9IV",
        }
    }

    pub fn parse(raw: &str) -> Option<Mood> {
        Mood::ALL
            .into_iter()
            .find(|mood| mood.label().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A stored mood entry that carries journal text.
#[derive(Clone, Debug, PartialEq)]
pub struct JournalEntry {
    pub id: Option<RecordId>,
    pub mood: Option<Mood>,
    pub journal: String,
    pub written_at: Timestamp,
    pub pending: bool,
}

impl JournalEntry {
    pub fn from_record(record: &Record) -> Option<Self> {
        let journal = record.text("journal")?.trim();
        if journal.is_empty() {
            return None;
        }
        Some(Self {
            id: record.id.clone(),
            mood: record.text("mood").and_then(Mood::parse),
            journal: journal.to_string(),
            written_at: record.created_at,
            pending: record.pending,
        })
    }
}

#[derive(Default)]
struct Selection {
    selected: Option<Mood>,
    submitted: Option<Mood>,
}

pub struct MoodScreen {
    ctx: AppContext,
    feed: Feed,
    selection: Mutex<Selection>,
}

impl MoodScreen {
    pub fn new(ctx: AppContext) -> Self {
        let path = CollectionPath::root("moods").child(ctx.user_id().as_str(), "entries");
        let feed = Feed::new(
            ctx.backend.store.clone(),
            FeedConfig::new(
                path,
                OrderBy::descending(TIMESTAMP_FIELD),
                SyncPolicy::PollOnToggle {
                    on_hide: HideBehavior::Keep,
                },
            ),
        );
        Self {
            ctx,
            feed,
            selection: Mutex::new(Selection::default()),
        }
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    pub fn select(&self, mood: Mood) {
        lock(&self.selection).selected = Some(mood);
    }

    pub fn selected(&self) -> Option<Mood> {
        lock(&self.selection).selected
    }

    pub fn submitted(&self) -> Option<Mood> {
        lock(&self.selection).submitted
    }

    async fn save(&self, mood: Mood, journal: &str) -> AppResult<Record> {
        let written = self
            .feed
            .submit(fields! { "mood" => mood.label(), "journal" => journal.trim() })
            .await;
        surface(&self.ctx.notices, written)
    }

    /// Saves the selected mood together with whatever journal text is typed.
    pub async fn submit_mood(&self, journal: &str) -> AppResult<Mood> {
        let selected = self.selected();
        let mood = surface(
            &self.ctx.notices,
            selected.ok_or_else(|| AppError::validation("Pick a mood first")),
        )?;
        lock(&self.selection).submitted = Some(mood);
        self.save(mood, journal).await?;
        Ok(mood)
    }

    /// Adds a journal entry under the last submitted mood.
    pub async fn save_journal(&self, journal: &str) -> AppResult<Record> {
        let submitted = self.submitted();
        let mood = surface(
            &self.ctx.notices,
            submitted.ok_or_else(|| AppError::validation("Submit a mood first")),
        )?;
        let journal = surface(
            &self.ctx.notices,
            required(journal, "Write something first"),
        )?;
        self.save(mood, &journal).await
    }

    pub fn journal_visible(&self) -> bool {
        self.feed.history_visible()
    }

    pub async fn toggle_journal(&self) -> AppResult<bool> {
        surface(&self.ctx.notices, self.feed.toggle_history().await)
    }

    /// Newest first; entries without journal text are skipped.
    pub fn journal_entries(&self) -> Vec<JournalEntry> {
        self.feed
            .records()
            .iter()
            .filter_map(JournalEntry::from_record)
            .collect()
    }

    pub async fn delete_entry(&self, id: &RecordId) -> AppResult<()> {
        surface(&self.ctx.notices, self.feed.delete(id).await)
    }
}
