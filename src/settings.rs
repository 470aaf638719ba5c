use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

pub const CLASSIFIER_URL_ENV: &str = "ARTDRAW_CLASSIFIER_URL";
pub const AUTH_TOKEN_ENV: &str = "ARTDRAW_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameSettings {
    pub classifier_url: String,
    /// Bearer token sent with classification uploads.
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub next_prompt_delay_ms: u64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background_color: [u8; 3],
    pub prompts_path: Option<PathBuf>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            classifier_url: "http://localhost:8000/api/ml/classify".into(),
            auth_token: None,
            request_timeout_secs: 15,
            next_prompt_delay_ms: 1000,
            canvas_width: 600,
            canvas_height: 400,
            background_color: [255, 255, 255],
            prompts_path: None,
        }
    }
}

impl GameSettings {
    /// Applies `ARTDRAW_CLASSIFIER_URL` and `ARTDRAW_TOKEN` on top of the stored values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(CLASSIFIER_URL_ENV) {
            if !url.trim().is_empty() {
                self.classifier_url = url;
            }
        }
        if let Ok(token) = std::env::var(AUTH_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.auth_token = Some(token);
            }
        }
        self
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<GameSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring malformed settings in {}: {err}; using defaults",
                    path.display()
                );
                GameSettings::default()
            })
        } else {
            GameSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn game(&self) -> GameSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: GameSettings) -> Result<()> {
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &GameSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, GameSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, GameSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "artdraw-settings-{tag}-{}.json",
            uuid::Uuid::new_v4()
        ))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let store = SettingsStore::new(temp_settings_path("missing")).unwrap();
        assert_eq!(store.game(), GameSettings::default());
    }

    #[test]
    fn update_persists_and_reloads() {
        let path = temp_settings_path("persist");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.game();
        settings.classifier_url = "http://classifier.test/api/ml/classify".into();
        settings.canvas_width = 320;
        settings.auth_token = Some("secret".into());
        store.update(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reopened.game(), settings);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let path = temp_settings_path("malformed");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.game(), GameSettings::default());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let path = temp_settings_path("partial");
        fs::write(&path, r#"{ "next_prompt_delay_ms": 250 }"#).unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        let settings = store.game();
        assert_eq!(settings.next_prompt_delay_ms, 250);
        assert_eq!(settings.canvas_height, GameSettings::default().canvas_height);

        let _ = fs::remove_file(path);
    }
}
