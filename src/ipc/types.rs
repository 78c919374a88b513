use crate::config::AppConfig;
use crate::workspace::Workspace;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: AppConfig,
    pub workspace: Option<Workspace>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            workspace: None,
        }
    }
}
