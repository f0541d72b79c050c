use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Currency amounts are whole units.
pub type Money = i64;

pub const ESG_MIN: i32 = 0;
pub const ESG_MAX: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(u32);

impl PropertyId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Residential,
    Office,
    Retail,
    Hotel,
    Luxury,
}

pub const ALL_TYPES: [PropertyType; 5] = [
    PropertyType::Residential,
    PropertyType::Office,
    PropertyType::Retail,
    PropertyType::Hotel,
    PropertyType::Luxury,
];

impl PropertyType {
    pub fn label(self) -> &'static str {
        match self {
            PropertyType::Residential => "Residential",
            PropertyType::Office => "Office",
            PropertyType::Retail => "Retail",
            PropertyType::Hotel => "Hotel",
            PropertyType::Luxury => "Luxury",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            PropertyType::Residential => "🏠",
            PropertyType::Office => "🏢",
            PropertyType::Retail => "🏬",
            PropertyType::Hotel => "🏨",
            PropertyType::Luxury => "💎",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ALL_TYPES
            .iter()
            .copied()
            .find(|kind| kind.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown property type '{wanted}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    pub price: Money,
    pub rent: Money,
    pub esg: i32,
    pub location: Location,
    pub owner: bool,
}

impl Property {
    /// Shift ESG by `delta`, keeping it inside [0, 100].
    pub fn adjust_esg(&mut self, delta: i32) {
        self.esg = (self.esg.saturating_add(delta)).clamp(ESG_MIN, ESG_MAX);
    }

    pub fn is_esg_saturated(&self) -> bool {
        self.esg >= ESG_MAX
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub month: u32,
    pub message: String,
}

/// The one game in play. Only the engine mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub seed: u64,
    pub month: u32,
    pub cash: Money,
    pub properties: Vec<Property>,
    pub target_yield: i64,
    pub target_esg: i64,
    pub event_log: Vec<LogEntry>,
}

impl GameState {
    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    pub(crate) fn property_mut(&mut self, id: PropertyId) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.id == id)
    }

    pub fn owned(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.owner)
    }

    pub(crate) fn owned_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        self.properties.iter_mut().filter(|p| p.owner)
    }

    pub fn owned_count(&self) -> usize {
        self.owned().count()
    }

    pub(crate) fn log(&mut self, message: impl Into<String>) {
        let month = self.month;
        self.event_log.push(LogEntry {
            month,
            message: message.into(),
        });
    }

    pub fn log_tail(&self, count: usize) -> &[LogEntry] {
        let start = self.event_log.len().saturating_sub(count);
        &self.event_log[start..]
    }
}
