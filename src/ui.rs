use crate::app::AppContext;
use crate::config::AppConfig;
use crate::notice::{Notice, NoticeLevel};
use crate::storage::LocalStore;
use crate::theme::{ThemeMode, theme_definition};
use crate::views::shared::use_watch;
use crate::views::{AccountView, ChatView, EcoView, MoodView, PlannerView, SocialView};
use dioxus::prelude::*;
use once_cell::sync::OnceCell;
use std::time::Duration;

const OMNIBOT_CSS: Asset = asset!("/assets/omnibot.css");
const SPLASH_HIDE_DELAY: Duration = Duration::from_secs(2);

static APP_CONTEXT: OnceCell<AppContext> = OnceCell::new();

/// Builds the app context the UI root picks up. Call before `dioxus::launch`;
/// later calls are ignored.
pub fn install(config: AppConfig, local: LocalStore) {
    if APP_CONTEXT.set(AppContext::new(config, local)).is_err() {
        tracing::warn!("app context already installed");
    }
}

fn installed_context() -> AppContext {
    APP_CONTEXT
        .get_or_init(|| {
            tracing::warn!("no app context installed, using defaults");
            AppContext::new(AppConfig::default(), LocalStore::default_location())
        })
        .clone()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AppTab {
    Chat,
    Mood,
    Planner,
    Social,
    Eco,
    Account,
}

impl AppTab {
    const ALL: [AppTab; 6] = [
        AppTab::Chat,
        AppTab::Mood,
        AppTab::Planner,
        AppTab::Social,
        AppTab::Eco,
        AppTab::Account,
    ];

    fn label(self) -> &'static str {
        match self {
            AppTab::Chat => "Chat",
            AppTab::Mood => "Mood",
            AppTab::Planner => "Planner",
            AppTab::Social => "Social",
            AppTab::Eco => "Eco",
            AppTab::Account => "Account",
        }
    }
}

#[component]
pub fn App() -> Element {
    let app = use_context_provider(installed_context);
    let active_tab = use_signal(|| AppTab::Chat);
    let theme = use_signal(ThemeMode::default);
    let show_splash = use_signal(|| true);
    let mut session = use_signal(|| app.signed_in_user().map(|user| user.as_str().to_string()));

    use_splash_dismiss(show_splash);

    // Screens are bound to a user's collections, so a new session remounts them.
    let session_key = session().unwrap_or_else(|| "anonymous".to_string());

    rsx! {
        ThemeStyles { theme }
        if show_splash() {
            SplashScreen {}
        }
        AppHeader { active_tab, theme: theme() }
        NoticeStack {}
        for key in std::iter::once(session_key) {
            TabPanels {
                key: "{key}",
                active_tab,
                theme,
                on_session: move |uid| session.set(uid),
            }
        }
    }
}

fn use_splash_dismiss(show_splash: Signal<bool>) {
    use_effect(move || {
        if show_splash() {
            let mut control = show_splash;
            spawn(async move {
                tokio::time::sleep(SPLASH_HIDE_DELAY).await;
                control.set(false);
            });
        }
    });
}

#[component]
fn ThemeStyles(theme: Signal<ThemeMode>) -> Element {
    let definition = theme_definition(theme());
    rsx! {
        document::Link { rel: "stylesheet", href: OMNIBOT_CSS }
        style { dangerous_inner_html: "{definition.css}" }
    }
}

#[component]
fn AppHeader(active_tab: Signal<AppTab>, theme: ThemeMode) -> Element {
    let theme = theme_definition(theme);
    rsx! {
        div { class: "header no-divider",
            div { class: "header-content",
                span { class: "{theme.wordmark_class}", "OmniBot" }
                TabNavigation { active_tab }
            }
        }
    }
}

#[component]
fn NoticeStack() -> Element {
    let app = use_context::<AppContext>();
    let notices = use_watch(|| app.notices.watch());
    let visible: Vec<Notice> = notices();
    rsx! {
        div { class: "notice-stack", role: "status",
            for notice in visible {
                div {
                    key: "{notice.id}",
                    class: format_args!(
                        "notice {}",
                        if notice.level == NoticeLevel::Error { "notice-error" } else { "notice-info" }
                    ),
                    span { "{notice.message}" }
                    button { class: "btn btn-ghost", r#type: "button",
                        onclick: {
                            let board = app.notices.clone();
                            move |_| {
                                board.dismiss(notice.id);
                            }
                        },
                        "✕"
                    }
                }
            }
        }
    }
}

#[component]
fn TabPanels(
    active_tab: Signal<AppTab>,
    theme: Signal<ThemeMode>,
    on_session: EventHandler<Option<String>>,
) -> Element {
    let mut active_tab = active_tab;
    rsx! {
        div { class: "tab-panels",
            TabPanel {
                active_tab,
                tab: AppTab::Chat,
                children: rsx!( ChatView { on_redirect: move |_| active_tab.set(AppTab::Mood) } ),
            }
            TabPanel {
                active_tab,
                tab: AppTab::Mood,
                children: rsx!( MoodView {} ),
            }
            TabPanel {
                active_tab,
                tab: AppTab::Planner,
                children: rsx!( PlannerView {} ),
            }
            TabPanel {
                active_tab,
                tab: AppTab::Social,
                children: rsx!( SocialView {} ),
            }
            TabPanel {
                active_tab,
                tab: AppTab::Eco,
                children: rsx!( EcoView {} ),
            }
            TabPanel {
                active_tab,
                tab: AppTab::Account,
                children: rsx!( AccountView { theme, on_session } ),
            }
        }
    }
}

#[component]
fn TabPanel(active_tab: Signal<AppTab>, tab: AppTab, children: Element) -> Element {
    let is_active = active_tab() == tab;
    let class_suffix = if is_active { "active" } else { "" };
    rsx! {
        div {
            class: format_args!("tab-panel {}", class_suffix),
            aria_hidden: (!is_active).to_string(),
            {children}
        }
    }
}

#[component]
fn TabNavigation(active_tab: Signal<AppTab>) -> Element {
    rsx! {
        div { class: "tabs",
            for tab in AppTab::ALL {
                TabButton { active_tab, tab, label: tab.label() }
            }
        }
    }
}

#[component]
fn TabButton(active_tab: Signal<AppTab>, tab: AppTab, label: &'static str) -> Element {
    let mut active_tab = active_tab;
    let class = if active_tab() == tab {
        "tab active"
    } else {
        "tab"
    };
    rsx! {
        h1 {
            class: class,
            onclick: move |_| active_tab.set(tab),
            "{label}"
        }
    }
}

#[component]
fn SplashScreen() -> Element {
    rsx! {
        div { class: "splash-overlay", aria_hidden: "true",
            div { class: "splash-content",
                span { class: "splash-title", "🤖 OmniBot" }
                p { class: "text-muted", "Booting neural core..." }
            }
        }
    }
}
