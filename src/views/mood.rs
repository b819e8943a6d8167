use crate::screens::{JournalEntry, Mood};
use crate::types::RecordId;
use crate::views::shared::{HistoryButton, format_timestamp, use_app, use_records};
use dioxus::prelude::*;
use std::rc::Rc;

#[component]
pub fn MoodView() -> Element {
    let app = use_app();
    let mood = use_hook(|| Rc::new(app.mood()));
    let list = use_records(mood.feed().list());
    let mut selected = use_signal(|| mood.selected());
    let mut submitted = use_signal(|| mood.submitted());
    let mut journal = use_signal(String::new);
    let mut journal_visible = use_signal(|| mood.journal_visible());
    let mut pending_delete = use_signal(|| Option::<RecordId>::None);

    let submit_mood = {
        let mood = mood.clone();
        move |_| {
            let mood = mood.clone();
            let text = journal();
            spawn(async move {
                if mood.submit_mood(&text).await.is_ok() {
                    journal.set(String::new());
                }
                submitted.set(mood.submitted());
            });
        }
    };

    let save_journal = {
        let mood = mood.clone();
        move |_| {
            let mood = mood.clone();
            let text = journal();
            spawn(async move {
                if mood.save_journal(&text).await.is_ok() {
                    journal.set(String::new());
                }
            });
        }
    };

    let toggle_journal = {
        let mood = mood.clone();
        move |_| {
            let mood = mood.clone();
            spawn(async move {
                let _ = mood.toggle_journal().await;
                journal_visible.set(mood.journal_visible());
            });
        }
    };

    let confirm_delete = {
        let mood = mood.clone();
        move |_| {
            let Some(id) = pending_delete() else {
                return;
            };
            pending_delete.set(None);
            let mood = mood.clone();
            spawn(async move {
                let _ = mood.delete_entry(&id).await;
            });
        }
    };

    let entries: Vec<JournalEntry> = list()
        .records
        .iter()
        .filter_map(JournalEntry::from_record)
        .collect();

    rsx! {
        div { class: "main-container",
            h2 { class: "screen-title", "How are you feeling?" }
            div { class: "mood-grid",
                for option in Mood::ALL {
                    button {
                        class: format_args!("mood-option {}", if selected() == Some(option) { "active" } else { "" }),
                        r#type: "button",
                        onclick: {
                            let mood = mood.clone();
                            move |_| {
                                mood.select(option);
                                selected.set(Some(option));
                            }
                        },
                        span { class: "mood-emoji", "{option.emoji()}" }
                        span { "{option.label()}" }
                    }
                }
            }
            button { class: "btn btn-primary", r#type: "button", disabled: selected().is_none(), onclick: submit_mood,
                "Submit Mood"
            }
            if let Some(current) = submitted() {
                div { class: "mood-journal",
                    p { class: "text-muted",
                        "Feeling {current}. "
                        a { href: current.playlist_url(), target: "_blank", "🎵 Play music" }
                    }
                    textarea {
                        rows: "3", placeholder: "Write how you're feeling...",
                        value: "{journal}", oninput: move |ev| journal.set(ev.value()),
                    }
                    button { class: "btn btn-primary", r#type: "button", onclick: save_journal, "Save Journal Entry" }
                }
            }
            HistoryButton {
                visible: journal_visible(),
                show: "📖 View Journal",
                hide: "📕 Hide Journal",
                onclick: toggle_journal,
            }
            if journal_visible() {
                ul { class: "journal-list",
                    for entry in entries {
                        li { class: "journal-entry hstack",
                            span { class: "journal-text",
                                if let Some(m) = entry.mood { "{m.emoji()} " }
                                "• {entry.journal}"
                            }
                            span { class: "message-timestamp", "{format_timestamp(entry.written_at)}" }
                            if let Some(id) = entry.id.clone() {
                                button { class: "btn btn-ghost", r#type: "button",
                                    onclick: move |_| pending_delete.set(Some(id.clone())),
                                    "Delete"
                                }
                            }
                        }
                    }
                }
            }
            if pending_delete().is_some() {
                div { class: "dialog",
                    h3 { "Delete Entry" }
                    p { "Are you sure you want to delete this journal entry?" }
                    div { class: "hstack",
                        button { class: "btn btn-primary", r#type: "button", onclick: confirm_delete, "Delete" }
                        button { class: "btn btn-ghost", r#type: "button", onclick: move |_| pending_delete.set(None), "Cancel" }
                    }
                }
            }
        }
    }
}
