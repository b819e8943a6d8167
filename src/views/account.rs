use crate::backend::AuthUser;
use crate::screens::{LoginForm, RegisterForm};
use crate::theme::ThemeMode;
use crate::views::shared::use_app;
use dioxus::prelude::*;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AuthMode {
    Login,
    Register,
    Reset,
}

fn display_name(user: &AuthUser) -> &str {
    user.email.as_deref().unwrap_or(&user.uid)
}

/// Sign-in forms plus display settings. `on_session` receives the uid after
/// every sign-in or sign-out so the rest of the app can rebuild its screens.
#[component]
pub fn AccountView(theme: Signal<ThemeMode>, on_session: EventHandler<Option<String>>) -> Element {
    let mut theme = theme;
    let app = use_app();
    let account = use_hook(|| Rc::new(app.account()));
    let mut user = use_signal(|| account.current_user());
    let mut mode = use_signal(|| AuthMode::Login);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut confirm = use_signal(String::new);
    let mut id_token = use_signal(String::new);
    let mut busy = use_signal(|| false);

    let submit = {
        let account = account.clone();
        move |ev: FormEvent| {
            ev.prevent_default();
            let account = account.clone();
            busy.set(true);
            spawn(async move {
                let signed_in = match mode() {
                    AuthMode::Login => {
                        let form = LoginForm { email: email(), password: password() };
                        account.login(&form).await.ok()
                    }
                    AuthMode::Register => {
                        let form = RegisterForm {
                            email: email(),
                            password: password(),
                            confirm_password: confirm(),
                        };
                        account.register(&form).await.ok()
                    }
                    AuthMode::Reset => {
                        if account.forgot_password(&email()).await.is_ok() {
                            mode.set(AuthMode::Login);
                        }
                        None
                    }
                };
                if let Some(signed_in) = signed_in {
                    password.set(String::new());
                    confirm.set(String::new());
                    on_session.call(Some(signed_in.uid.clone()));
                    user.set(Some(signed_in));
                }
                busy.set(false);
            });
        }
    };

    let google = {
        let account = account.clone();
        move |_| {
            let account = account.clone();
            spawn(async move {
                if let Ok(signed_in) = account.sign_in_with_google(id_token().trim()).await {
                    id_token.set(String::new());
                    on_session.call(Some(signed_in.uid.clone()));
                    user.set(Some(signed_in));
                }
            });
        }
    };

    let sign_out = {
        let account = account.clone();
        move |_| {
            account.sign_out();
            user.set(None);
            on_session.call(None);
        }
    };

    let submit_label = match mode() {
        AuthMode::Login => "Login",
        AuthMode::Register => "Register",
        AuthMode::Reset => "Send Reset Link",
    };

    rsx! {
        div { class: "main-container",
            div { class: "settings-section",
                h3 { class: "section-title", "Account" }
                if let Some(current) = user() {
                    p { "Signed in as {display_name(&current)}" }
                    button { class: "btn btn-ghost", r#type: "button", onclick: sign_out, "Sign Out" }
                } else {
                    div { class: "tabs",
                        for (option, label) in [(AuthMode::Login, "Login"), (AuthMode::Register, "Register"), (AuthMode::Reset, "Forgot Password")] {
                            button {
                                class: format_args!("tab {}", if mode() == option { "active" } else { "" }),
                                r#type: "button",
                                onclick: move |_| mode.set(option),
                                "{label}"
                            }
                        }
                    }
                    form { class: "vstack", onsubmit: submit,
                        input { r#type: "email", placeholder: "Email", value: "{email}",
                            oninput: move |ev| email.set(ev.value()),
                        }
                        if mode() != AuthMode::Reset {
                            input { r#type: "password", placeholder: "Password", value: "{password}",
                                oninput: move |ev| password.set(ev.value()),
                            }
                        }
                        if mode() == AuthMode::Register {
                            input { r#type: "password", placeholder: "Confirm Password", value: "{confirm}",
                                oninput: move |ev| confirm.set(ev.value()),
                            }
                        }
                        button { class: "btn btn-primary", r#type: "submit", disabled: busy(), "{submit_label}" }
                    }
                    div { class: "hstack",
                        input { r#type: "text", placeholder: "Google ID token", value: "{id_token}",
                            oninput: move |ev| id_token.set(ev.value()),
                        }
                        button { class: "btn btn-ghost", r#type: "button",
                            disabled: id_token().trim().is_empty(),
                            onclick: google,
                            "Sign in with Google"
                        }
                    }
                }
            }
            div { class: "settings-section",
                h3 { class: "section-title", "Display" }
                div { class: "theme-toggle",
                    for (option, label) in [(ThemeMode::Neon, "Neon"), (ThemeMode::Light, "Light")] {
                        button {
                            class: format_args!("theme-option {}", if theme() == option { "active" } else { "" }),
                            r#type: "button",
                            onclick: move |_| theme.set(option),
                            "{label}"
                        }
                    }
                }
            }
        }
    }
}
