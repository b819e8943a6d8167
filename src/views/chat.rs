use crate::types::Record;
use crate::views::shared::{Composer, HistoryButton, format_timestamp, use_app, use_records, use_watch};
use dioxus::prelude::*;
use std::rc::Rc;

fn message_text(record: &Record) -> &str {
    record.text("text").unwrap_or_default()
}

fn is_user(record: &Record) -> bool {
    record.flag("isUser").unwrap_or(false)
}

#[component]
pub fn ChatView(on_redirect: EventHandler<()>) -> Element {
    let app = use_app();
    let chat = use_hook(|| Rc::new(app.chat()));
    let list = use_records(chat.feed().list());
    let typing = use_watch(|| chat.typing());
    let mut ai_mode = use_signal(|| chat.ai_mode());
    let mut history_visible = use_signal(|| chat.history_visible());

    let send = {
        let chat = chat.clone();
        move |text: String| {
            let chat = chat.clone();
            spawn(async move {
                // failures are already on the notice board
                if let Ok(outcome) = chat.send(&text).await
                    && outcome.redirect_to_mood
                {
                    on_redirect.call(());
                }
            });
        }
    };

    let toggle_history = {
        let chat = chat.clone();
        move |_| {
            let chat = chat.clone();
            spawn(async move {
                let _ = chat.toggle_history().await;
                history_visible.set(chat.history_visible());
            });
        }
    };

    let toggle_ai = {
        let chat = chat.clone();
        move |_| {
            let enabled = !ai_mode();
            chat.set_ai_mode(enabled);
            ai_mode.set(enabled);
        }
    };

    let state = list();
    rsx! {
        div { class: "main-container",
            div { class: "screen-header hstack",
                div {
                    h2 { class: "screen-title", "OmniBot" }
                    span { class: "text-muted",
                        if ai_mode() { "⚛ Quantum AI Online" } else { "👤 Human Assist Mode" }
                    }
                }
                button { class: "btn btn-ghost", r#type: "button", onclick: toggle_ai,
                    if ai_mode() { "AI Mode: On" } else { "AI Mode: Off" }
                }
                HistoryButton {
                    visible: history_visible(),
                    show: "Show Logs",
                    hide: "Hide Logs",
                    onclick: toggle_history,
                }
            }
            div { class: "chat-wrap",
                div { id: "chat-list", class: "chat-list",
                    if state.is_empty() {
                        p { class: "text-muted", "🌌 OmniBot activated. Awaiting your command..." }
                    }
                    for record in state.records.iter() {
                        div { class: format_args!("message-row {}", if is_user(record) { "user" } else { "bot" }),
                            div { class: "message-stack",
                                div { class: format_args!("bubble {}", if is_user(record) { "user" } else { "bot" }),
                                    "{message_text(record)}"
                                }
                                div { class: "message-meta",
                                    span { class: "message-timestamp", "{format_timestamp(record.created_at)}" }
                                    if record.pending {
                                        span { class: "message-pending", "sending…" }
                                    }
                                }
                            }
                        }
                    }
                    if typing() {
                        div { class: "message-row bot",
                            div { class: "shimmer-line",
                                span { class: "shimmer-text", "⌛ Calculating response..." }
                            }
                        }
                    }
                }
            }
            Composer {
                placeholder: "Send a transmission...",
                label: "Send",
                disabled: typing(),
                onsend: send,
            }
        }
    }
}
