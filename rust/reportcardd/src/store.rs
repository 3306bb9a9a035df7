//! Record and theme state containers.
//!
//! Each store restores itself from the workspace settings table on `init` and
//! writes through on every mutation. A store never holds a value that failed
//! validation.

use crate::db;
use crate::model::{self, StudentRecord, ValidationError};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

pub const RECORD_KEY: &str = "studentData";
pub const THEME_KEY: &str = "theme";

/// Fields that may be absent from a serialized record but are still valid merge targets.
const OPTIONAL_FIELDS: [&str; 3] = ["avatar", "profileColor", "visibleBadges"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to persist {key}: {message}")]
    Persist { key: &'static str, message: String },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidPatch(_) | StoreError::Invalid(_) => "bad_params",
            StoreError::Encode(_) => "encode_failed",
            StoreError::Persist { .. } => "db_update_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordSource {
    Restored,
    Seeded,
    Fallback,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customization {
    pub avatar: Option<String>,
    pub visible_badges: Option<Vec<String>>,
    pub profile_color: Option<String>,
}

pub struct RecordStore {
    record: StudentRecord,
}

impl RecordStore {
    /// Restores the saved record, or falls back to the built-in seed when the
    /// saved value is missing, unparsable, or fails validation.
    pub fn init(conn: &Connection) -> anyhow::Result<(Self, RecordSource)> {
        let (record, source) = match db::settings_get_raw(conn, RECORD_KEY)? {
            None => (model::seed_record(), RecordSource::Seeded),
            Some(raw) => match serde_json::from_str::<StudentRecord>(&raw) {
                Ok(record) => match model::validate(&record) {
                    Ok(()) => (record, RecordSource::Restored),
                    Err(e) => {
                        warn!(error = %e, "saved record failed validation; using seed");
                        (model::seed_record(), RecordSource::Fallback)
                    }
                },
                Err(e) => {
                    warn!(error = %e, "saved record is unreadable; using seed");
                    (model::seed_record(), RecordSource::Fallback)
                }
            },
        };

        db::settings_set_json(conn, RECORD_KEY, &serde_json::to_value(&record)?)?;
        info!(source = ?source, subjects = record.subjects.len(), "record store ready");
        Ok((Self { record }, source))
    }

    pub fn record(&self) -> &StudentRecord {
        &self.record
    }

    /// Shallow merge of top-level fields into the current record.
    pub fn merge(
        &mut self,
        conn: &Connection,
        patch: &Map<String, Value>,
    ) -> Result<&StudentRecord, StoreError> {
        let mut current = serde_json::to_value(&self.record)?;
        let Some(obj) = current.as_object_mut() else {
            return Err(StoreError::InvalidPatch("record is not an object".to_string()));
        };
        for (k, v) in patch {
            if !obj.contains_key(k) && !OPTIONAL_FIELDS.contains(&k.as_str()) {
                return Err(StoreError::InvalidPatch(format!("unknown field: {}", k)));
            }
            obj.insert(k.clone(), v.clone());
        }
        let merged: StudentRecord = serde_json::from_value(current)
            .map_err(|e| StoreError::InvalidPatch(e.to_string()))?;
        self.replace(conn, merged)
    }

    pub fn customize(
        &mut self,
        conn: &Connection,
        changes: Customization,
    ) -> Result<&StudentRecord, StoreError> {
        let mut next = self.record.clone();
        if let Some(avatar) = changes.avatar {
            next.avatar = Some(avatar);
        }
        if let Some(badges) = changes.visible_badges {
            next.visible_badges = Some(badges);
        }
        if let Some(color) = changes.profile_color {
            next.profile_color = Some(color);
        }
        self.replace(conn, next)
    }

    pub fn reset(&mut self, conn: &Connection) -> Result<&StudentRecord, StoreError> {
        self.replace(conn, model::seed_record())
    }

    fn replace(&mut self, conn: &Connection, next: StudentRecord) -> Result<&StudentRecord, StoreError> {
        model::validate(&next)?;
        let encoded = serde_json::to_value(&next)?;
        db::settings_set_json(conn, RECORD_KEY, &encoded).map_err(|e| StoreError::Persist {
            key: RECORD_KEY,
            message: e.to_string(),
        })?;
        self.record = next;
        Ok(&self.record)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Pastel,
    Neon,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Light, Theme::Dark, Theme::Pastel, Theme::Neon];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "pastel" => Some(Self::Pastel),
            "neon" => Some(Self::Neon),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Pastel => "pastel",
            Self::Neon => "neon",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Light => "روشن",
            Self::Dark => "تیره",
            Self::Pastel => "پاستلی",
            Self::Neon => "نئون",
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(self, Self::Dark | Self::Neon)
    }

    /// Background painted behind exported section images.
    pub fn export_background(self) -> [u8; 3] {
        if self.is_dark() {
            [0x1f, 0x29, 0x37]
        } else {
            [0xff, 0xff, 0xff]
        }
    }
}

pub struct ThemeStore {
    theme: Theme,
}

impl ThemeStore {
    pub fn init(conn: &Connection) -> anyhow::Result<Self> {
        // Older shells stored the bare identifier instead of a JSON string.
        let theme = db::settings_get_raw(conn, THEME_KEY)?
            .and_then(|raw| {
                serde_json::from_str::<Theme>(&raw)
                    .ok()
                    .or_else(|| Theme::parse(raw.trim()))
            })
            .unwrap_or_default();
        Ok(Self { theme })
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set(&mut self, conn: &Connection, theme: Theme) -> Result<Theme, StoreError> {
        db::settings_set_json(conn, THEME_KEY, &Value::String(theme.as_str().to_string())).map_err(
            |e| StoreError::Persist {
                key: THEME_KEY,
                message: e.to_string(),
            },
        )?;
        self.theme = theme;
        Ok(theme)
    }
}

pub struct Stores {
    pub record: RecordStore,
    pub theme: ThemeStore,
}

impl Stores {
    pub fn init(conn: &Connection) -> anyhow::Result<(Self, RecordSource)> {
        let (record, source) = RecordStore::init(conn)?;
        let theme = ThemeStore::init(conn)?;
        Ok((Self { record, theme }, source))
    }
}
