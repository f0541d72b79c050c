use thiserror::Error;

use crate::scenario::ScenarioError;
use crate::world::{Money, PropertyId};

/// A player action that was refused. Refusals never mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no property {0}")]
    UnknownProperty(PropertyId),
    #[error("not enough cash: price {price}, available {cash}")]
    InsufficientFunds { price: Money, cash: Money },
    #[error("property {0} is already owned")]
    AlreadyOwned(PropertyId),
    #[error("property {0} is not owned")]
    NotOwned(PropertyId),
    #[error("ESG of property {0} is already at its maximum")]
    EsgSaturated(PropertyId),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed save: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("save version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("invalid save: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("invalid scenario: {0}")]
    Scenario(#[from] ScenarioError),
}
