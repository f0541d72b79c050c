use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::{Money, PropertyType, ALL_TYPES};

fn default_name() -> String {
    "casablanca".to_string()
}

fn default_count() -> usize {
    25
}

fn default_price_min() -> Money {
    10_000_000
}

fn default_price_max() -> Money {
    50_000_000
}

fn default_rent_base_rate() -> f64 {
    0.004
}

fn default_rent_noise_max() -> Money {
    10_000
}

fn default_esg_min() -> i32 {
    30
}

fn default_esg_max() -> i32 {
    100
}

fn default_types() -> Vec<PropertyType> {
    ALL_TYPES.to_vec()
}

fn default_start_cash_min() -> Money {
    80_000_000
}

fn default_start_cash_max() -> Money {
    120_000_000
}

fn default_event_probability() -> f64 {
    0.5
}

fn default_rent_fluctuation() -> Money {
    2_500
}

fn default_renovation_esg_gain() -> i32 {
    10
}

fn default_price_floor() -> Money {
    1
}

fn default_target_yield() -> i64 {
    8
}

fn default_target_esg() -> i64 {
    70
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Pins the seed of every new game. Absent means fresh entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub catalog: CatalogRules,
    #[serde(default)]
    pub economy: EconomyRules,
    #[serde(default = "default_events")]
    pub events: Vec<MarketEvent>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rules for the randomly generated property catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRules {
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default = "default_price_min")]
    pub price_min: Money,
    #[serde(default = "default_price_max")]
    pub price_max: Money,
    #[serde(default = "default_rent_base_rate")]
    pub rent_base_rate: f64,
    #[serde(default = "default_rent_noise_max")]
    pub rent_noise_max: Money,
    #[serde(default = "default_esg_min")]
    pub esg_min: i32,
    /// Exclusive.
    #[serde(default = "default_esg_max")]
    pub esg_max: i32,
    #[serde(default)]
    pub bounds: BoundingBox,
    #[serde(default = "default_types")]
    pub types: Vec<PropertyType>,
}

impl Default for CatalogRules {
    fn default() -> Self {
        Self {
            count: default_count(),
            price_min: default_price_min(),
            price_max: default_price_max(),
            rent_base_rate: default_rent_base_rate(),
            rent_noise_max: default_rent_noise_max(),
            esg_min: default_esg_min(),
            esg_max: default_esg_max(),
            bounds: BoundingBox::default(),
            types: default_types(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            lat_min: 33.55,
            lat_max: 33.60,
            lng_min: -7.65,
            lng_max: -7.60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyRules {
    #[serde(default = "default_start_cash_min")]
    pub start_cash_min: Money,
    #[serde(default = "default_start_cash_max")]
    pub start_cash_max: Money,
    #[serde(default = "default_event_probability")]
    pub event_probability: f64,
    /// Rent collected per property varies by up to this much either way.
    #[serde(default = "default_rent_fluctuation")]
    pub rent_fluctuation: Money,
    #[serde(default = "default_renovation_esg_gain")]
    pub renovation_esg_gain: i32,
    #[serde(default = "default_price_floor")]
    pub price_floor: Money,
    #[serde(default = "default_target_yield")]
    pub target_yield: i64,
    #[serde(default = "default_target_esg")]
    pub target_esg: i64,
    #[serde(default)]
    pub log_capacity: Option<usize>,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            start_cash_min: default_start_cash_min(),
            start_cash_max: default_start_cash_max(),
            event_probability: default_event_probability(),
            rent_fluctuation: default_rent_fluctuation(),
            renovation_esg_gain: default_renovation_esg_gain(),
            price_floor: default_price_floor(),
            target_yield: default_target_yield(),
            target_esg: default_target_esg(),
            log_capacity: None,
        }
    }
}

/// One entry in the random event table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub name: String,
    pub message: String,
    /// Signed fraction: cash becomes `cash * (1 + cash_impact)`.
    #[serde(default)]
    pub cash_impact: f64,
    /// Added to the ESG of every owned property.
    #[serde(default)]
    pub esg_impact: i32,
    /// Signed fraction applied to price and rent of every owned property.
    #[serde(default)]
    pub value_impact: f64,
}

impl MarketEvent {
    fn new(name: &str, message: &str, cash_impact: f64, esg_impact: i32) -> Self {
        Self {
            name: name.to_string(),
            message: message.to_string(),
            cash_impact,
            esg_impact,
            value_impact: 0.0,
        }
    }
}

pub fn default_events() -> Vec<MarketEvent> {
    vec![
        MarketEvent::new("Pandemic", "⚠️ Global pandemic!", -0.15, -5),
        MarketEvent::new("Rate hike", "📈 Interest rates are rising.", -0.05, 0),
        MarketEvent::new("Green reform", "🌱 Green building reform enacted.", 0.0, 10),
        MarketEvent::new("Property boom", "💹 The property market is booming!", 0.10, 0),
        MarketEvent::new("Local crisis", "🌪️ Local property crisis.", -0.08, -3),
        MarketEvent::new("Public subsidy", "🏛️ Government subsidy received!", 0.05, 5),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: None,
            seed: None,
            catalog: CatalogRules::default(),
            economy: EconomyRules::default(),
            events: default_events(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("catalog must generate at least one property")]
    EmptyCatalog,
    #[error("catalog must allow at least one property type")]
    NoTypes,
    #[error("price range [{min}, {max}] is invalid")]
    PriceRange { min: Money, max: Money },
    #[error("esg range [{min}, {max}) is invalid")]
    EsgRange { min: i32, max: i32 },
    #[error("start cash range [{min}, {max}] is invalid")]
    StartCashRange { min: Money, max: Money },
    #[error("event probability {0} is outside [0, 1]")]
    Probability(f64),
    #[error("event table is empty but events can fire")]
    NoEvents,
    #[error("{0} must not be negative")]
    Negative(&'static str),
    #[error("renovation ESG gain {0} must be at least 1")]
    RenovationGain(i32),
    #[error("bounding box is inverted")]
    InvertedBounds,
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let catalog = &self.catalog;
        if catalog.count == 0 {
            return Err(ScenarioError::EmptyCatalog);
        }
        if catalog.types.is_empty() {
            return Err(ScenarioError::NoTypes);
        }
        if catalog.price_min < 1 || catalog.price_min > catalog.price_max {
            return Err(ScenarioError::PriceRange {
                min: catalog.price_min,
                max: catalog.price_max,
            });
        }
        if catalog.esg_min < 0 || catalog.esg_min > catalog.esg_max || catalog.esg_max > 101 {
            return Err(ScenarioError::EsgRange {
                min: catalog.esg_min,
                max: catalog.esg_max,
            });
        }
        let bounds = &catalog.bounds;
        if bounds.lat_min > bounds.lat_max || bounds.lng_min > bounds.lng_max {
            return Err(ScenarioError::InvertedBounds);
        }
        if catalog.rent_base_rate < 0.0 {
            return Err(ScenarioError::Negative("rent_base_rate"));
        }
        if catalog.rent_noise_max < 0 {
            return Err(ScenarioError::Negative("rent_noise_max"));
        }

        let economy = &self.economy;
        if economy.start_cash_min > economy.start_cash_max {
            return Err(ScenarioError::StartCashRange {
                min: economy.start_cash_min,
                max: economy.start_cash_max,
            });
        }
        if !(0.0..=1.0).contains(&economy.event_probability) {
            return Err(ScenarioError::Probability(economy.event_probability));
        }
        if economy.event_probability > 0.0 && self.events.is_empty() {
            return Err(ScenarioError::NoEvents);
        }
        if economy.rent_fluctuation < 0 {
            return Err(ScenarioError::Negative("rent_fluctuation"));
        }
        if economy.renovation_esg_gain < 1 {
            return Err(ScenarioError::RenovationGain(economy.renovation_esg_gain));
        }
        if economy.price_floor < 1 {
            return Err(ScenarioError::Negative("price_floor"));
        }
        Ok(())
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_is_valid() {
        let scenario = Scenario::default();
        assert_eq!(scenario.validate(), Ok(()));
        assert_eq!(scenario.catalog.count, 25);
        assert_eq!(scenario.events.len(), 6);
        assert_eq!(scenario.economy.target_esg, 70);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let yaml = "name: test_bay\nseed: 9\neconomy:\n  event_probability: 0.3\n";
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(scenario.name, "test_bay");
        assert_eq!(scenario.seed, Some(9));
        assert_eq!(scenario.economy.event_probability, 0.3);
        assert_eq!(scenario.economy.rent_fluctuation, 2_500);
        assert_eq!(scenario.catalog.types.len(), 5);
        assert_eq!(scenario.events, default_events());
    }

    #[test]
    fn event_value_impact_defaults_to_zero() {
        let yaml = "events:\n  - name: Flood\n    message: Flooding\n    cash_impact: -0.2\n";
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(scenario.events.len(), 1);
        assert_eq!(scenario.events[0].esg_impact, 0);
        assert_eq!(scenario.events[0].value_impact, 0.0);
    }

    #[test]
    fn rejects_bad_probability() {
        let mut scenario = Scenario::default();
        scenario.economy.event_probability = 1.5;
        assert_eq!(scenario.validate(), Err(ScenarioError::Probability(1.5)));
    }

    #[test]
    fn rejects_inverted_price_range() {
        let mut scenario = Scenario::default();
        scenario.catalog.price_min = 10;
        scenario.catalog.price_max = 5;
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::PriceRange { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_renovation_gain() {
        let mut scenario = Scenario::default();
        scenario.economy.renovation_esg_gain = 0;
        assert_eq!(scenario.validate(), Err(ScenarioError::RenovationGain(0)));

        let yaml = "economy:\n  renovation_esg_gain: -30\n";
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(scenario.validate(), Err(ScenarioError::RenovationGain(-30)));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut scenario = Scenario::default();
        scenario.catalog.bounds.lat_min = 33.70;
        assert_eq!(scenario.validate(), Err(ScenarioError::InvertedBounds));

        let mut scenario = Scenario::default();
        scenario.catalog.bounds.lng_max = -7.70;
        assert_eq!(scenario.validate(), Err(ScenarioError::InvertedBounds));
    }

    #[test]
    fn empty_event_table_allowed_when_events_never_fire() {
        let mut scenario = Scenario::default();
        scenario.events.clear();
        assert_eq!(scenario.validate(), Err(ScenarioError::NoEvents));
        scenario.economy.event_probability = 0.0;
        assert_eq!(scenario.validate(), Ok(()));
    }

    #[test]
    fn loader_reads_and_validates_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.yaml"), "catalog:\n  count: 0\n").unwrap();
        fs::write(dir.path().join("good.yaml"), "name: harbor\n").unwrap();

        let loader = ScenarioLoader::new(dir.path());
        assert_eq!(loader.load("good.yaml").unwrap().name, "harbor");
        assert!(loader.load("bad.yaml").is_err());
        assert!(loader.load("missing.yaml").is_err());
    }
}
