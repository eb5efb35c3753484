//! Dioxus views over the rendering core.
//!
//! The core never touches the DOM; these components mount the block HTML it
//! produces and own the click handling for thinking toggles and copy buttons.

mod chat_input; // Chunk input for the preview page
pub mod home; // Streaming preview (public for routing)
pub mod message; // Renders one chat message as blocks
pub mod settings; // Render settings page (public for routing)

use dioxus::logger::tracing::warn;

use crate::RenderSettings;

/// Saved settings, falling back to defaults on any storage problem.
#[cfg(not(target_arch = "wasm32"))]
pub async fn load_settings() -> RenderSettings {
    use crate::storage::{get_storage, load_or_default};

    let storage = match get_storage().await {
        Ok(s) => s,
        Err(e) => {
            warn!("Could not get storage: {e:?}");
            return RenderSettings::default();
        }
    };
    load_or_default(&storage).await.unwrap_or_else(|e| {
        warn!("Could not load render settings, using defaults: {e:?}");
        RenderSettings::default()
    })
}

#[cfg(target_arch = "wasm32")]
pub async fn load_settings() -> RenderSettings {
    RenderSettings::default()
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn save_settings(settings: &RenderSettings) {
    use crate::storage::{Storage, get_storage};

    match get_storage().await {
        Ok(storage) => {
            if let Err(e) = storage.save_settings(settings).await {
                warn!("Could not save settings: {e:?}");
            }
        }
        Err(e) => warn!("Could not get storage: {e:?}"),
    }
}

#[cfg(target_arch = "wasm32")]
pub async fn save_settings(_settings: &RenderSettings) {
    warn!("Settings are not persisted in the browser build");
}
