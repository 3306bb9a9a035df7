use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;
use serde::Deserialize;

use crate::narrative::{NarrativeSession, TextGenerator};
use crate::store::Stores;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Copy)]
pub struct ExportSettings {
    pub settle: Duration,
    pub pixel_ratio: u32,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub stores: Option<Stores>,
    pub narrative: NarrativeSession,
    pub generator: Box<dyn TextGenerator>,
    pub export: ExportSettings,
}

impl AppState {
    pub fn new(generator: Box<dyn TextGenerator>, export: ExportSettings) -> Self {
        Self {
            workspace: None,
            db: None,
            stores: None,
            narrative: NarrativeSession::default(),
            generator,
            export,
        }
    }
}
