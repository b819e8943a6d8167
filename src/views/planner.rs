use crate::feed::ListState;
use crate::screens::{NewTask, StudyPlanner, StudyTask, suggest_methods};
use crate::views::shared::{use_app, use_watch};
use dioxus::prelude::*;
use std::rc::Rc;
use tokio::sync::watch;

#[component]
pub fn PlannerView() -> Element {
    let app = use_app();
    let planner = use_hook(|| Rc::new(app.planner()));
    use_context_provider(|| planner.clone());
    let list = use_watch(|| match planner.feed() {
        Some(feed) => feed.list().watch(),
        None => watch::channel(ListState::default()).1,
    });
    let mut draft = use_signal(NewTask::default);
    let mut method_open = use_signal(|| false);

    use_hook({
        let planner = planner.clone();
        move || {
            if planner.feed().is_some() {
                spawn(async move {
                    let _ = planner.start().await;
                });
            }
        }
    });

    if planner.feed().is_none() {
        return rsx! {
            div { class: "main-container",
                h2 { class: "screen-title", "📚 Study Planner" }
                p { class: "text-muted", "Sign in from the Account tab to plan your study sessions." }
            }
        };
    }

    let save = {
        let planner = planner.clone();
        move |ev: FormEvent| {
            ev.prevent_default();
            let planner = planner.clone();
            let task = draft();
            spawn(async move {
                if planner.save_task(task).await.is_ok() {
                    draft.with_mut(|d| {
                        d.task.clear();
                        d.time.clear();
                        d.method.clear();
                    });
                }
            });
        }
    };

    let tasks: Vec<StudyTask> = list().records.iter().filter_map(StudyTask::from_record).collect();
    let suggestions = suggest_methods(&draft().method);

    rsx! {
        div { class: "main-container",
            h2 { class: "screen-title", "📚 Study Planner" }
            form { class: "planner-form vstack", onsubmit: save,
                input { r#type: "date", value: "{draft().date}",
                    oninput: move |ev| draft.with_mut(|d| d.date = ev.value()),
                }
                input { r#type: "text", placeholder: "What will you study?", value: "{draft().task}",
                    oninput: move |ev| draft.with_mut(|d| d.task = ev.value()),
                }
                input { r#type: "time", value: "{draft().time}",
                    oninput: move |ev| draft.with_mut(|d| d.time = ev.value()),
                }
                div { class: "autocomplete",
                    input { r#type: "text", placeholder: "Study method", value: "{draft().method}",
                        oninput: move |ev| {
                            draft.with_mut(|d| d.method = ev.value());
                            method_open.set(true);
                        },
                    }
                    if method_open() && !suggestions.is_empty() {
                        ul { class: "suggestions",
                            for method in suggestions {
                                li {
                                    onclick: move |_| {
                                        draft.with_mut(|d| d.method = method.to_string());
                                        method_open.set(false);
                                    },
                                    "{method}"
                                }
                            }
                        }
                    }
                }
                button { class: "btn btn-primary", r#type: "submit", "Save Task" }
            }
            ul { class: "task-list",
                for task in tasks {
                    TaskRow { task }
                }
            }
        }
    }
}

#[component]
fn TaskRow(task: StudyTask) -> Element {
    let planner = use_context::<Rc<StudyPlanner>>();
    let Some(id) = task.id.clone() else {
        return rsx! {
            li { class: "task pending", "{task.date} • {task.task}" }
        };
    };
    let toggle = {
        let planner = planner.clone();
        let id = id.clone();
        move |ev: FormEvent| {
            let done = ev.checked();
            let planner = planner.clone();
            let id = id.clone();
            spawn(async move {
                let _ = planner.set_done(&id, done).await;
            });
        }
    };
    let delete = {
        let planner = planner.clone();
        move |_| {
            let planner = planner.clone();
            let id = id.clone();
            spawn(async move {
                let _ = planner.delete_task(&id).await;
            });
        }
    };
    rsx! {
        li { class: format_args!("task hstack {}", if task.is_done { "done" } else { "" }),
            input { r#type: "checkbox", checked: task.is_done, onchange: toggle }
            div {
                strong { "{task.task}" }
                p { class: "text-muted", "📅 {task.date} ⏰ {task.time}" }
                if !task.method.is_empty() {
                    p { class: "text-muted", "🧠 {task.method}" }
                }
            }
            button { class: "btn btn-ghost", r#type: "button", onclick: delete, "🗑️" }
        }
    }
}
