use crate::feed::ListState;
use crate::screens::{EcoLog, EcoTracker};
use crate::views::shared::{HistoryButton, format_day, use_app, use_watch};
use dioxus::prelude::*;
use std::rc::Rc;
use tokio::sync::watch;

fn history_rx(eco: &EcoTracker) -> watch::Receiver<ListState> {
    match eco.history_feed() {
        Some(feed) => feed.list().watch(),
        None => watch::channel(ListState::default()).1,
    }
}

fn completed_summary(log: &EcoLog) -> String {
    if log.completed.is_empty() {
        return "Nothing checked off".to_string();
    }
    log.completed.join(", ")
}

#[component]
pub fn EcoView() -> Element {
    let app = use_app();
    let eco = use_hook(|| Rc::new(app.eco()));
    let state = use_watch(|| eco.watch());
    let history = use_watch(|| history_rx(&eco));
    let mut draft = use_signal(String::new);
    let mut history_visible = use_signal(|| eco.history_visible());

    let add = {
        let eco = eco.clone();
        move |ev: FormEvent| {
            ev.prevent_default();
            if eco.add_activity(&draft()).is_ok() {
                draft.set(String::new());
            }
        }
    };

    let save = {
        let eco = eco.clone();
        move |_| {
            let eco = eco.clone();
            spawn(async move {
                let _ = eco.save_progress().await;
            });
        }
    };

    let toggle_history = {
        let eco = eco.clone();
        move |_| {
            let eco = eco.clone();
            spawn(async move {
                let _ = eco.toggle_history().await;
                history_visible.set(eco.history_visible());
            });
        }
    };

    let current = state();
    let logs: Vec<EcoLog> = history().records.iter().map(EcoLog::from_record).collect();

    rsx! {
        div { class: "main-container",
            h2 { class: "screen-title", "🌱 Eco Tracker" }
            p { class: "eco-points", "Eco Points: {current.points}" }
            if let Some(badge) = current.badge.clone() {
                p { class: "eco-badge", "{badge}" }
            }
            ul { class: "activity-list",
                for activity in current.activities.clone() {
                    li { class: "activity hstack",
                        label {
                            input {
                                r#type: "checkbox",
                                checked: current.is_completed(&activity),
                                onchange: {
                                    let eco = eco.clone();
                                    let activity = activity.clone();
                                    move |_| {
                                        eco.toggle_activity(&activity);
                                    }
                                },
                            }
                            " {activity}"
                        }
                        button { class: "btn btn-ghost", r#type: "button",
                            onclick: {
                                let eco = eco.clone();
                                let activity = activity.clone();
                                move |_| {
                                    eco.remove_activity(&activity);
                                }
                            },
                            "✕"
                        }
                    }
                }
            }
            form { class: "hstack", onsubmit: add,
                input { r#type: "text", placeholder: "Add a custom activity", value: "{draft}",
                    oninput: move |ev| draft.set(ev.value()),
                }
                button { class: "btn btn-ghost", r#type: "submit", "Add" }
            }
            button { class: "btn btn-primary", r#type: "button", onclick: save, "Save Today's Progress" }
            HistoryButton {
                visible: history_visible(),
                show: "📜 Show History",
                hide: "📜 Hide History",
                onclick: toggle_history,
            }
            if history_visible() {
                ul { class: "eco-history",
                    if logs.is_empty() {
                        li { class: "text-muted", "No progress saved yet" }
                    }
                    for log in logs {
                        li {
                            strong { "{format_day(log.saved_at)}" }
                            span { class: "text-muted", " • {log.points} pts" }
                            p { "{completed_summary(&log)}" }
                        }
                    }
                }
            }
        }
    }
}
