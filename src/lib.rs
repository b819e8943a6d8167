//! OmniBot: a wellbeing and study companion.
//!
//! The core is UI-agnostic: [`feed`] keeps local reactive lists in sync with
//! the managed backend, [`screens`] holds one controller per app screen.
//! The Dioxus front end lives behind the `ui` feature.

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod feed;
pub mod notice;
pub mod screens;
pub mod storage;
pub mod types;

#[cfg(feature = "ui")]
pub mod theme;
#[cfg(feature = "ui")]
pub mod ui;
#[cfg(feature = "ui")]
pub mod views;

pub use app::AppContext;
pub use error::{AppError, AppResult};

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
