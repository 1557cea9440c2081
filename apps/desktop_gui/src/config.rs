//! Startup configuration: defaults, then an optional `itemdo.toml`, then
//! `ITEMDO_*` environment overrides.

use std::fs;

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub lists_app_id: i64,
    pub tasks_app_id: i64,
    pub pending_status_option: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080".into(),
            api_token: None,
            lists_app_id: 1,
            tasks_app_id: 2,
            pending_status_option: 1,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    api_token: Option<String>,
    lists_app_id: Option<i64>,
    tasks_app_id: Option<i64>,
    pending_status_option: Option<i64>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string("itemdo.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings);
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file) = toml::from_str::<FileSettings>(raw) else {
        tracing::warn!("ignoring unparsable itemdo.toml");
        return;
    };
    if let Some(v) = file.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file.api_token {
        settings.api_token = Some(v);
    }
    if let Some(v) = file.lists_app_id {
        settings.lists_app_id = v;
    }
    if let Some(v) = file.tasks_app_id {
        settings.tasks_app_id = v;
    }
    if let Some(v) = file.pending_status_option {
        settings.pending_status_option = v;
    }
}

fn apply_env(settings: &mut Settings) {
    if let Ok(v) = std::env::var("ITEMDO_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Ok(v) = std::env::var("ITEMDO_API_TOKEN") {
        settings.api_token = Some(v);
    }
    if let Ok(v) = std::env::var("ITEMDO_LISTS_APP_ID") {
        if let Ok(parsed) = v.parse() {
            settings.lists_app_id = parsed;
        }
    }
    if let Ok(v) = std::env::var("ITEMDO_TASKS_APP_ID") {
        if let Ok(parsed) = v.parse() {
            settings.tasks_app_id = parsed;
        }
    }
    if let Ok(v) = std::env::var("ITEMDO_PENDING_STATUS_OPTION") {
        if let Ok(parsed) = v.parse() {
            settings.pending_status_option = parsed;
        }
    }
}
