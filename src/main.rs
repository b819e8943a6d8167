use omnibot::config::AppConfig;
use omnibot::storage::LocalStore;

/// Bundled config for mobile builds (iOS/Android)
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

#[cfg(not(target_arch = "wasm32"))]
fn load_dotenv() {
    // .env wins on desktop dev machines
    if dotenvy::dotenv().is_ok() {
        return;
    }
    load_bundled_config();
}

#[cfg(target_arch = "wasm32")]
fn load_dotenv() {
    load_bundled_config();
}

fn load_bundled_config() {
    for line in BUNDLED_CONFIG.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim();
            // Only set if not already set (allow env override)
            if std::env::var(key).is_err() {
                // SAFETY: We're setting env vars at startup before any threads are spawned
                unsafe {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    load_dotenv();
    let config = AppConfig::from_env()?;
    omnibot::init_tracing(&config.log_filter);

    let local = match &config.data_dir {
        Some(dir) => LocalStore::new(dir),
        None => LocalStore::default_location(),
    };
    tracing::info!(data_dir = %local.root().display(), "starting omnibot");

    omnibot::ui::install(config, local);
    dioxus::launch(omnibot::ui::App);
    Ok(())
}
