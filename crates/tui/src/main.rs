mod app;

use std::{fs::OpenOptions, sync::Mutex};

use anyhow::{Context, Result};
use pulver_core::{
    config::{self, AppConfig},
    editing::Editor,
    store::{FileStorage, SettingsStore},
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;

    let storage = FileStorage::new(&config.storage_root);
    let location = storage.path_for(&config.storage_key);
    info!(path = %location.display(), debounce_ms = config.debounce_ms, "Starting calculator");

    let store = SettingsStore::with_key(storage, config.storage_key.clone());
    let (editor, commits) = Editor::open(store, config.debounce());

    let mut app = app::CalculatorApp::new(editor, commits, location.display().to_string());
    app.run().await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create {}", config.log_dir.display()))?;
    let log_path = config.log_dir.join("pulver.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
