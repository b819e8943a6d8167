use crate::feed::{Feed, ListState};
use crate::screens::{Contact, SocialScreen};
use crate::types::{Record, RecordId};
use crate::views::shared::{Composer, format_timestamp, use_app, use_records, use_watch};
use dioxus::prelude::*;
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::watch;

#[component]
pub fn SocialView() -> Element {
    let app = use_app();
    let social = use_hook(|| Rc::new(app.social()));
    use_context_provider(|| social.clone());
    let posts = use_records(social.posts().list());
    let mut contacts = use_signal(Vec::<Contact>::new);
    let mut show_contacts = use_signal(|| false);
    let mut selected = use_signal(|| Option::<Contact>::None);

    use_hook({
        let social = social.clone();
        move || {
            spawn(async move {
                let _ = social.start().await;
                contacts.set(social.contacts());
            });
        }
    });

    let post = {
        let social = social.clone();
        move |text: String| {
            let social = social.clone();
            spawn(async move {
                let _ = social.post(&text).await;
            });
        }
    };

    let delete_post = {
        let social = social.clone();
        move |id: RecordId| {
            let social = social.clone();
            spawn(async move {
                let _ = social.delete_post(&id).await;
            });
        }
    };

    let close = {
        let social = social.clone();
        move |_| {
            social.close_conversation();
            selected.set(None);
        }
    };

    rsx! {
        div { class: "main-container",
            div { class: "screen-header hstack",
                h2 { class: "screen-title", "💬 Social Space" }
                button { class: "btn btn-ghost", r#type: "button",
                    onclick: move |_| show_contacts.set(!show_contacts()),
                    "Contacts"
                }
            }
            if show_contacts() {
                ul { class: "contact-list",
                    if contacts().is_empty() {
                        li { class: "text-muted", "No contacts yet" }
                    }
                    for contact in contacts() {
                        li {
                            button { class: "btn btn-ghost", r#type: "button",
                                onclick: {
                                    let social = social.clone();
                                    let contact = contact.clone();
                                    move |_| {
                                        let social = social.clone();
                                        let contact = contact.clone();
                                        spawn(async move {
                                            if social.select_contact(contact.clone()).await.is_ok() {
                                                selected.set(Some(contact));
                                            }
                                        });
                                    }
                                },
                                "{contact.name}"
                            }
                        }
                    }
                }
            }
            if let Some(contact) = selected() {
                div { class: "conversation",
                    div { class: "hstack",
                        h3 { "Chat with {contact.name}" }
                        button { class: "btn btn-ghost", r#type: "button", onclick: close, "Close" }
                    }
                    DirectMessages { key: "{contact.id}", contact_id: contact.id.clone() }
                }
            } else {
                MessageList { state: posts(), on_delete: delete_post }
                Composer { placeholder: "Share something...", label: "Post", disabled: false, onsend: post }
            }
        }
    }
}

fn conversation_rx(feed: Option<Arc<Feed>>) -> watch::Receiver<ListState> {
    match feed {
        Some(feed) => feed.list().watch(),
        None => watch::channel(ListState::default()).1,
    }
}

#[component]
fn DirectMessages(contact_id: String) -> Element {
    let social = use_context::<Rc<SocialScreen>>();
    let messages = use_watch(|| conversation_rx(social.conversation()));

    let send = {
        let social = social.clone();
        move |text: String| {
            let social = social.clone();
            spawn(async move {
                let _ = social.send_dm(&text).await;
            });
        }
    };

    let delete = {
        let social = social.clone();
        move |id: RecordId| {
            let social = social.clone();
            spawn(async move {
                let _ = social.delete_dm(&id).await;
            });
        }
    };

    rsx! {
        div { class: "direct-messages", "data-contact": "{contact_id}",
            MessageList { state: messages(), on_delete: delete }
            Composer { placeholder: "Type a message...", label: "Send", disabled: false, onsend: send }
        }
    }
}

fn post_text(record: &Record) -> &str {
    record.text("text").unwrap_or_default()
}

#[component]
fn MessageList(state: ListState, on_delete: EventHandler<RecordId>) -> Element {
    let mut confirm = use_signal(|| Option::<RecordId>::None);
    rsx! {
        ul { class: "post-list",
            for record in state.records.iter() {
                li { class: "post hstack",
                    div {
                        span { class: "message-timestamp", "{format_timestamp(record.created_at)}" }
                        p { "{post_text(record)}" }
                    }
                    if let Some(id) = record.id.clone() {
                        button { class: "btn btn-ghost", r#type: "button",
                            onclick: move |_| confirm.set(Some(id.clone())),
                            "🗑"
                        }
                    }
                }
            }
        }
        if let Some(id) = confirm() {
            div { class: "dialog",
                p { "Delete this message?" }
                div { class: "hstack",
                    button { class: "btn btn-primary", r#type: "button",
                        onclick: move |_| {
                            on_delete.call(id.clone());
                            confirm.set(None);
                        },
                        "Delete"
                    }
                    button { class: "btn btn-ghost", r#type: "button", onclick: move |_| confirm.set(None), "Cancel" }
                }
            }
        }
    }
}
