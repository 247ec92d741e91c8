//! Ferrite session engine - headless entry point
//!
//! Restores the last workspace session, optionally opens the folder and files
//! given on the command line, reports what is open and saves on exit.

use ferrite_session::config::{get_data_dir, load_config};
use ferrite_session::files::{format_file_size, LocalFileSystem};
use ferrite_session::session::JsonFileStore;
use ferrite_session::AppState;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// Application name constant.
const APP_NAME: &str = "Ferrite";

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting {} session engine", APP_NAME);

    let settings = load_config();
    let data_dir = match get_data_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!("Session store: {}", data_dir.display());

    let fs = Arc::new(LocalFileSystem::new());
    let mut state = AppState::new(fs, Box::new(JsonFileStore::new(data_dir)), settings, None);

    state.restore_last_session().await;
    state.start_auto_save();

    for arg in std::env::args().skip(1) {
        let path = PathBuf::from(arg);
        let result = if path.is_dir() {
            state.open_folder_at(path.clone()).await.map(|_| ())
        } else {
            state.open_file(path.clone()).await.map(|_| ())
        };
        if let Err(e) = result {
            warn!("Could not open {}: {}", path.display(), e);
        }
    }

    if let Some(folder) = state.workspace().current_folder() {
        let files = state
            .workspace()
            .file_tree()
            .map(|tree| tree.file_count())
            .unwrap_or(0);
        info!("Workspace: {} ({} files)", folder.display(), files);
    }
    for tab in state.tabs().tabs() {
        info!(
            "{} {} ({}, {})",
            if tab.is_active { ">" } else { " " },
            tab.display_title(),
            tab.language.display_name(),
            format_file_size(tab.content.len() as u64)
        );
    }
    if let Some(status) = &state.ui.status_message {
        warn!("{}", status);
    }

    state.poll_auto_save();
    state.shutdown();
}
