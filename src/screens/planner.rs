use super::{required, surface};
use crate::app::AppContext;
use crate::backend::AuthError;
use crate::error::{AppError, AppResult};
use crate::feed::{Feed, FeedConfig, SyncPolicy};
use crate::fields;
use crate::types::{CollectionPath, OrderBy, Record, RecordId, TIMESTAMP_FIELD};

const MISSING_TASK: &str = "Enter a task and pick a date";

pub const STUDY_METHODS: &[&str] = &[
    "Pomodoro: 25 min study, 5 min break",
    "Feynman Technique: Explain like you're teaching",
    "Mind Mapping: Visualize concepts",
    "Active Recall: Test yourself",
    "Spaced Repetition: Review over intervals",
    "Blurting: Recall everything on paper",
    "Past Papers: Practice real exam questions",
    "SQ3R: Survey, Question, Read, Recite, Review",
    "Cornell Notes: Structured note-taking",
    "Interleaving: Mix multiple subjects",
    "Teaching Someone Else",
    "Self-Quizzing",
    "Visual Learning: Charts & Diagrams",
];

/// Methods containing `query` (case-insensitive), minus an exact match.
pub fn suggest_methods(query: &str) -> Vec<&'static str> {
    let needle = query.to_lowercase();
    STUDY_METHODS
        .iter()
        .copied()
        .filter(|method| method.to_lowercase().contains(&needle) && *method != query)
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudyTask {
    pub id: Option<RecordId>,
    pub date: String,
    pub task: String,
    pub time: String,
    pub method: String,
    pub is_done: bool,
    pub pending: bool,
}

impl StudyTask {
    /// Documents missing a date or a task are not shown.
    pub fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: record.id.clone(),
            date: record.text("date")?.to_string(),
            task: record.text("task")?.to_string(),
            time: record.text("time").unwrap_or_default().to_string(),
            method: record.text("method").unwrap_or_default().to_string(),
            is_done: record.flag("isDone").unwrap_or(false),
            pending: record.pending,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct NewTask {
    pub date: String,
    pub task: String,
    pub time: String,
    pub method: String,
}

/// Study tasks of the signed-in user. Anonymous sessions get no feed.
pub struct StudyPlanner {
    ctx: AppContext,
    feed: Option<Feed>,
}

impl StudyPlanner {
    pub fn new(ctx: AppContext) -> Self {
        let feed = ctx.signed_in_user().map(|user| {
            Feed::new(
                ctx.backend.store.clone(),
                FeedConfig::new(
                    CollectionPath::root("users").child(user.as_str(), "studyTasks"),
                    OrderBy::ascending(TIMESTAMP_FIELD),
                    SyncPolicy::Subscription,
                ),
            )
        });
        Self { ctx, feed }
    }

    pub fn feed(&self) -> Option<&Feed> {
        self.feed.as_ref()
    }

    fn signed_in_feed(&self) -> AppResult<&Feed> {
        surface(
            &self.ctx.notices,
            self.feed.as_ref().ok_or(AppError::Auth(AuthError::NotSignedIn)),
        )
    }

    pub async fn start(&self) -> AppResult<()> {
        let feed = self.signed_in_feed()?;
        surface(&self.ctx.notices, feed.start().await)
    }

    pub fn tasks(&self) -> Vec<StudyTask> {
        self.feed
            .as_ref()
            .map(|feed| feed.records().iter().filter_map(StudyTask::from_record).collect())
            .unwrap_or_default()
    }

    pub async fn save_task(&self, task: NewTask) -> AppResult<StudyTask> {
        let text = surface(&self.ctx.notices, required(&task.task, MISSING_TASK))?;
        let date = surface(&self.ctx.notices, required(&task.date, MISSING_TASK))?;
        let feed = self.signed_in_feed()?;
        let written = feed
            .submit(fields! {
                "date" => date,
                "task" => text,
                "time" => task.time.trim(),
                "method" => task.method.trim(),
                "isDone" => false,
            })
            .await;
        let record = surface(&self.ctx.notices, written)?;
        self.ctx.notices.info("✅ Task Saved!");
        StudyTask::from_record(&record)
            .ok_or_else(|| AppError::validation(MISSING_TASK))
    }

    pub async fn set_done(&self, id: &RecordId, done: bool) -> AppResult<()> {
        let feed = self.signed_in_feed()?;
        surface(
            &self.ctx.notices,
            feed.update(id, fields! { "isDone" => done }).await,
        )
    }

    pub async fn delete_task(&self, id: &RecordId) -> AppResult<()> {
        let feed = self.signed_in_feed()?;
        surface(&self.ctx.notices, feed.delete(id).await)?;
        self.ctx.notices.info("🗑️ Task deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_are_case_insensitive() {
        assert_eq!(
            suggest_methods("pomo"),
            vec!["Pomodoro: 25 min study, 5 min break"]
        );
        let recall = suggest_methods("RECALL");
        assert_eq!(recall.len(), 2);
    }

    #[test]
    fn test_exact_match_is_not_suggested() {
        assert!(suggest_methods("Self-Quizzing").is_empty());
        assert_eq!(suggest_methods("").len(), STUDY_METHODS.len());
    }

    #[test]
    fn test_task_requires_date_and_text() {
        let record = Record::draft(
            fields! { "task" => "Revise chemistry", "isDone" => true },
            crate::types::Timestamp(1),
        );
        assert!(StudyTask::from_record(&record).is_none());

        let mut record = record;
        record.fields.insert("date".into(), "12/5/2025".into());
        let task = StudyTask::from_record(&record).unwrap();
        assert!(task.is_done);
        assert_eq!(task.time, "");
    }
}
