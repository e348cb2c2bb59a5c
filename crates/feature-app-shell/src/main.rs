// SPDX-License-Identifier: AGPL-3.0
// Feature App Shell - Headless frontend
//
// Loads the persisted settings from the user's config directory and prints
// the effective values.

use feature_app_core::{FileStore, SettingsManager, DEFAULT_DOCUMENT};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("feature_app_shell=info,feature_app_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Feature App v{}", env!("CARGO_PKG_VERSION"));

    let store = match FileStore::from_project_dirs() {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Cannot locate settings directory: {}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Settings directory: {:?}", store.dir());

    let manager = SettingsManager::new(Arc::new(store), DEFAULT_DOCUMENT);
    let settings = manager.load();

    match serde_json::to_string_pretty(&settings) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to serialize settings: {}", e);
            ExitCode::FAILURE
        }
    }
}
