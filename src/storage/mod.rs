//! Persistence for [`RenderSettings`].

use std::path::PathBuf;

use async_trait::async_trait;
use directories_next::ProjectDirs;

use crate::app_settings::RenderSettings;

mod file_storage;

pub use file_storage::FileStorage;

#[async_trait(?Send)]
pub trait Storage {
    async fn save_settings(&self, settings: &RenderSettings) -> anyhow::Result<()>;
    /// `None` when nothing has been saved yet.
    async fn load_settings(&self) -> anyhow::Result<Option<RenderSettings>>;
}

/// Storage rooted in the platform config directory, or the working
/// directory when the platform has none.
pub async fn get_storage() -> anyhow::Result<FileStorage> {
    let base = match ProjectDirs::from("com", "Lumo", "lumo-chat") {
        // Lin: /home/alice/.config/lumo-chat
        // Mac: /Users/Alice/Library/Application Support/com.Lumo.lumo-chat
        Some(dirs) => dirs.config_dir().to_path_buf(),
        None => PathBuf::from("."),
    };
    Ok(FileStorage::new(base))
}

/// Saved settings, or defaults when none were saved.
pub async fn load_or_default(storage: &impl Storage) -> anyhow::Result<RenderSettings> {
    Ok(storage.load_settings().await?.unwrap_or_default())
}
