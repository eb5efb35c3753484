use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;

use crate::app_settings::RenderSettings;

pub const SETTINGS_FILE: &str = "render-settings.json";

pub struct FileStorage {
    base: PathBuf,
}

impl FileStorage {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.base.join(SETTINGS_FILE)
    }
}

#[async_trait::async_trait(?Send)]
impl super::Storage for FileStorage {
    async fn save_settings(&self, settings: &RenderSettings) -> Result<()> {
        fs::create_dir_all(&self.base)
            .await
            .with_context(|| format!("creating {}", self.base.display()))?;
        let path = self.settings_path();
        fs::write(&path, settings.to_json()?)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    async fn load_settings(&self) -> Result<Option<RenderSettings>> {
        let path = self.settings_path();
        let data = match fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
        };
        let settings = RenderSettings::from_json(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Storage, load_or_default};

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.load_settings().await.unwrap().is_none());
        assert_eq!(load_or_default(&storage).await.unwrap(), RenderSettings::default());
    }

    #[tokio::test]
    async fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));
        let settings = RenderSettings {
            block_cache_capacity: 7,
            protect_fenced_code: false,
            ..RenderSettings::default()
        };
        storage.save_settings(&settings).await.unwrap();
        assert_eq!(storage.load_settings().await.unwrap(), Some(settings));
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        tokio::fs::write(storage.settings_path(), "{not json").await.unwrap();
        let err = storage.load_settings().await.unwrap_err();
        assert!(err.to_string().contains(SETTINGS_FILE));
    }
}
