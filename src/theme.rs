#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThemeMode {
    #[default]
    Neon,
    Light,
}

pub struct ThemeDefinition {
    pub css: &'static str,
    pub wordmark_class: &'static str,
}

pub fn theme_definition(mode: ThemeMode) -> ThemeDefinition {
    match mode {
        ThemeMode::Neon => ThemeDefinition {
            css: NEON_THEME,
            wordmark_class: "header-wordmark header-wordmark-neon",
        },
        ThemeMode::Light => ThemeDefinition {
            css: LIGHT_THEME,
            wordmark_class: "header-wordmark",
        },
    }
}

const NEON_THEME: &str = r#"
:root {
    --color-bg-primary: #0b1225;
    --color-bg-secondary: #102542;
    --color-bg-overlay: rgba(11, 18, 37, 0.92);
    --color-text-primary: #eeeeee;
    --color-text-muted: #9fb3c8;
    --color-border: #00bfff;
    --color-surface-muted: #243b55;
    --color-input-border: rgba(0, 255, 255, 0.4);
    --color-input-bg: #0b1225;
    --color-chat-user-bg: #00bfff;
    --color-chat-user-text: #0b1225;
    --color-chat-bot-bg: #243b55;
    --color-chat-bot-text: #eeeeee;
    --color-accent-blue: #00bfff;
    --color-accent-purple: #bf00ff;
    --color-accent-green: #39ff14;
    --color-timestamp: #7d8ba1;
    --color-notice-error: #ff4d6d;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.header { background: var(--color-bg-primary); }
.btn:hover,
.btn-ghost:hover { background: var(--color-surface-muted); }
.composer input { background: var(--color-input-bg); color: var(--color-text-primary); border-color: var(--color-input-border); }
.composer input:focus { border-color: var(--color-border); }
"#;

const LIGHT_THEME: &str = r#"
:root {
    --color-bg-primary: #ffffff;
    --color-bg-secondary: #f5f5f5;
    --color-bg-overlay: rgba(255, 255, 255, 0.92);
    --color-text-primary: #000000;
    --color-text-muted: #4a4a4a;
    --color-border: #000000;
    --color-surface-muted: #e6e6e6;
    --color-input-border: #c2c2c2;
    --color-input-bg: #ffffff;
    --color-chat-user-bg: #111111;
    --color-chat-user-text: #ffffff;
    --color-chat-bot-bg: #f0f0f0;
    --color-chat-bot-text: #000000;
    --color-accent-blue: #0077aa;
    --color-accent-purple: #7a00a3;
    --color-accent-green: #1f8a00;
    --color-timestamp: #606060;
    --color-notice-error: #c0002a;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.header { background: var(--color-bg-primary); }
.btn { color: var(--color-text-primary); }
.btn:hover,
.btn-ghost:hover { background: var(--color-surface-muted); }
.composer { background: var(--color-bg-overlay); border-top-color: var(--color-border); }
.composer input { background: var(--color-input-bg); color: var(--color-text-primary); border-color: var(--color-input-border); }
"#;
