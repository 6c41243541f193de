use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use reflex_experiment::ReactionConfig;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "reflex.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub server_url: String,
    /// Link placed on the clipboard by "Copy Link". Falls back to the
    /// server url.
    pub share_url: Option<String>,
    pub font_path: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
    pub reaction: ReactionConfig,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            share_url: None,
            font_path: None,
            window_width: 1280,
            window_height: 800,
            reaction: ReactionConfig::default(),
        }
    }
}

impl AppSettings {
    pub fn share_link(&self) -> &str {
        self.share_url.as_deref().unwrap_or(&self.server_url)
    }
}

pub fn load_settings() -> Result<AppSettings> {
    let file = match fs::read_to_string(CONFIG_FILE) {
        Ok(raw) => Some(raw),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e).with_context(|| format!("reading {CONFIG_FILE}")),
    };
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AppSettings> {
    let mut settings = match file {
        Some(raw) => toml::from_str::<AppSettings>(raw).with_context(|| format!("parsing {CONFIG_FILE}"))?,
        None => AppSettings::default(),
    };

    if let Some(v) = env("REFLEX_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("REFLEX_SHARE_URL") {
        settings.share_url = Some(v);
    }
    if let Some(v) = env("REFLEX_FONT_PATH") {
        settings.font_path = Some(PathBuf::from(v));
    }

    settings.reaction.validate().context("invalid [reaction] settings")?;
    Ok(settings)
}
