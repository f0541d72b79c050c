//! Single-slot save game persistence.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SaveError;
use crate::world::{GameState, LogEntry, Money, Property, ESG_MAX, ESG_MIN};

/// Bumped whenever the stored shape changes incompatibly.
pub const SAVE_VERSION: u32 = 1;

pub const DEFAULT_SAVE_FILE: &str = "saves/game_state.json";

#[derive(Deserialize)]
struct SaveHeader {
    version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    saved_at: DateTime<Utc>,
    seed: u64,
    month: u32,
    cash: Money,
    target_esg: i64,
    target_yield: i64,
    properties: Vec<Property>,
    event_log: Vec<LogEntry>,
}

impl SaveFile {
    fn from_state(state: &GameState) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: Utc::now(),
            seed: state.seed,
            month: state.month,
            cash: state.cash,
            target_esg: state.target_esg,
            target_yield: state.target_yield,
            properties: state.properties.clone(),
            event_log: state.event_log.clone(),
        }
    }

    fn into_state(self) -> GameState {
        GameState {
            seed: self.seed,
            month: self.month,
            cash: self.cash,
            properties: self.properties,
            target_yield: self.target_yield,
            target_esg: self.target_esg,
            event_log: self.event_log,
        }
    }
}

/// The one place a game is persisted. Every write replaces it wholesale.
#[derive(Debug, Clone)]
pub struct SaveSlot {
    path: Option<PathBuf>,
}

impl SaveSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A slot that never touches disk; loads find nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn exists(&self) -> bool {
        self.path.as_ref().map(|p| p.exists()).unwrap_or(false)
    }

    /// `Ok(None)` when the slot is empty.
    pub fn load(&self) -> Result<Option<GameState>, SaveError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path)?;
        decode(&text).map(Some)
    }

    pub fn store(&self, state: &GameState) -> Result<(), SaveError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = encode(state)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), month = state.month, "game saved");
        Ok(())
    }
}

pub fn encode(state: &GameState) -> Result<String, SaveError> {
    Ok(serde_json::to_string_pretty(&SaveFile::from_state(state))?)
}

pub fn decode(text: &str) -> Result<GameState, SaveError> {
    let header: SaveHeader = serde_json::from_str(text)?;
    if header.version != SAVE_VERSION {
        return Err(SaveError::Version {
            found: header.version,
            expected: SAVE_VERSION,
        });
    }
    let file: SaveFile = serde_json::from_str(text)?;
    let state = file.into_state();
    validate(&state)?;
    Ok(state)
}

fn validate(state: &GameState) -> Result<(), SaveError> {
    if state.properties.is_empty() {
        return Err(SaveError::Invalid("no properties".to_string()));
    }
    let mut seen = HashSet::new();
    for property in &state.properties {
        if !seen.insert(property.id) {
            return Err(SaveError::Invalid(format!(
                "property {} appears more than once",
                property.id
            )));
        }
        if !(ESG_MIN..=ESG_MAX).contains(&property.esg) {
            return Err(SaveError::Invalid(format!(
                "property {} has esg {} outside [0, 100]",
                property.id, property.esg
            )));
        }
        if property.price < 1 {
            return Err(SaveError::Invalid(format!(
                "property {} has non-positive price {}",
                property.id, property.price
            )));
        }
        if property.rent < 0 {
            return Err(SaveError::Invalid(format!(
                "property {} has negative rent {}",
                property.id, property.rent
            )));
        }
    }
    Ok(())
}
