pub mod catalog;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod rng;
pub mod save;
pub mod scenario;
pub mod systems;
pub mod web;
pub mod world;

pub use dashboard::{Dashboard, RiskLabel};
pub use engine::{Engine, EngineBuilder, MonthReport, Receipt};
pub use error::{ActionError, EngineError, SaveError};
pub use scenario::Scenario;
pub use world::{GameState, Property, PropertyId, PropertyType};
