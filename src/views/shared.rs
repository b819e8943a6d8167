use crate::app::AppContext;
use crate::feed::{ListState, ReactiveList};
use crate::types::Timestamp;
use dioxus::prelude::*;
use time::{UtcOffset, format_description::FormatItem, macros::format_description};
use tokio::sync::watch;

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[day] [month repr:short], [hour padding:zero]:[minute padding:zero]");
const DAY_FORMAT: &[FormatItem<'static>] =
    format_description!("[day] [month repr:short] [year]");

/// Mirrors a watch channel into a signal for as long as the component lives.
pub fn use_watch<T: Clone + 'static>(init: impl FnOnce() -> watch::Receiver<T>) -> Signal<T> {
    use_hook(|| {
        let mut rx = init();
        let mut signal = Signal::new(rx.borrow_and_update().clone());
        spawn(async move {
            while rx.changed().await.is_ok() {
                let value = rx.borrow_and_update().clone();
                signal.set(value);
            }
        });
        signal
    })
}

pub fn use_records(list: &ReactiveList) -> Signal<ListState> {
    use_watch(|| list.watch())
}

pub fn use_app() -> AppContext {
    use_context::<AppContext>()
}

fn local(timestamp: Timestamp) -> Option<time::OffsetDateTime> {
    let mut datetime = timestamp.to_datetime()?;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    Some(datetime)
}

pub fn format_timestamp(timestamp: Timestamp) -> String {
    local(timestamp)
        .and_then(|dt| dt.format(MESSAGE_TIME_FORMAT).ok())
        .unwrap_or_default()
}

pub fn format_day(timestamp: Timestamp) -> String {
    local(timestamp)
        .and_then(|dt| dt.format(DAY_FORMAT).ok())
        .unwrap_or_else(|| "Unknown Date".to_string())
}

#[component]
pub fn HistoryButton(visible: bool, show: &'static str, hide: &'static str, onclick: EventHandler<()>) -> Element {
    rsx! {
        button {
            class: "btn btn-ghost", r#type: "button",
            onclick: move |_| onclick.call(()),
            if visible { "{hide}" } else { "{show}" }
        }
    }
}

#[component]
pub fn Composer(placeholder: &'static str, label: &'static str, disabled: bool, onsend: EventHandler<String>) -> Element {
    let mut input = use_signal(String::new);
    let mut submit = move || {
        let text = input();
        if text.trim().is_empty() {
            return;
        }
        input.set(String::new());
        onsend.call(text);
    };
    rsx! {
        form { class: "composer no-divider",
            onsubmit: move |ev| {
                ev.prevent_default();
                submit();
            },
            div { class: "hstack", style: "gap: 0.5rem; width: 100%;",
                input {
                    r#type: "text", placeholder,
                    value: "{input}", oninput: move |ev| input.set(ev.value()),
                    disabled,
                }
                button {
                    class: "btn btn-primary", r#type: "submit",
                    disabled: disabled || input().trim().is_empty(),
                    "{label}"
                }
            }
        }
    }
}
