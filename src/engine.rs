use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    catalog,
    dashboard::Dashboard,
    error::{ActionError, EngineError, SaveError},
    rng::{RngExt, RngManager, RngStream},
    save::SaveSlot,
    scenario::{MarketEvent, Scenario},
    systems::{BookkeepingSystem, MarketEventSystem, RentSystem},
    world::{GameState, Money, Property, PropertyId, PropertyType},
};

/// Read-only inputs shared by every system during one monthly turn.
pub struct TurnContext<'a> {
    pub month: u32,
    pub scenario: &'a Scenario,
}

/// Outcome of one monthly turn, filled in by the systems as they run.
#[derive(Debug, Clone, Default)]
pub struct TurnReport {
    pub rent_collected: Money,
    pub event: Option<MarketEvent>,
}

/// One phase of the monthly turn. Systems run in registration order, each
/// with its own random stream.
pub trait TurnSystem: Send {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &TurnContext,
        state: &mut GameState,
        rng: &mut ChaCha8Rng,
        report: &mut TurnReport,
    );
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthReport {
    pub month: u32,
    pub rent_collected: Money,
    pub event: Option<String>,
    pub message: String,
    pub dashboard: Dashboard,
}

/// Result of a successful buy, sell or renovation.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub message: String,
    pub dashboard: Dashboard,
}

pub struct EngineBuilder {
    scenario: Scenario,
    seed: Option<u64>,
    slot: SaveSlot,
    systems: Vec<Box<dyn TurnSystem>>,
}

impl EngineBuilder {
    /// Starts with no turn systems. Register them, usually through
    /// [`EngineBuilder::with_standard_systems`], or `advance_month` only
    /// moves the clock: no rent, no events, no month log entry.
    pub fn new(scenario: Scenario) -> Self {
        Self {
            seed: scenario.seed,
            scenario,
            slot: SaveSlot::disabled(),
            systems: Vec::new(),
        }
    }

    /// Pin the seed of new games, overriding the scenario.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_save_slot(mut self, slot: SaveSlot) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_system(mut self, system: impl TurnSystem + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Rent, then market events, then bookkeeping.
    pub fn with_standard_systems(self) -> Self {
        self.with_system(RentSystem::new())
            .with_system(MarketEventSystem::new())
            .with_system(BookkeepingSystem::new())
    }

    /// Start a fresh game and write it to the save slot.
    pub fn new_game(self) -> Result<Engine, EngineError> {
        let mut engine = self.assemble(None);
        engine.new_game()?;
        Ok(engine)
    }

    /// Resume the saved game, or start fresh when the slot is empty or
    /// holds a save that cannot be trusted.
    pub fn load_or_new(self) -> Result<Engine, EngineError> {
        self.scenario.validate()?;
        let loaded = self.slot.load();
        match loaded {
            Ok(Some(state)) => {
                info!(month = state.month, cash = state.cash, "resuming saved game");
                Ok(self.assemble(Some(state)))
            }
            Ok(None) => self.new_game(),
            Err(err) => {
                warn!("discarding unusable save: {err}");
                self.new_game()
            }
        }
    }

    /// Wrap an existing state without touching the save slot.
    pub fn from_state(self, state: GameState) -> Engine {
        self.assemble(Some(state))
    }

    fn assemble(self, state: Option<GameState>) -> Engine {
        let state = state.unwrap_or_else(|| GameState {
            seed: 0,
            month: 0,
            cash: 0,
            properties: Vec::new(),
            target_yield: self.scenario.economy.target_yield,
            target_esg: self.scenario.economy.target_esg,
            event_log: Vec::new(),
        });
        Engine {
            rng: RngManager::new(state.seed),
            state,
            pinned_seed: self.seed,
            scenario: self.scenario,
            slot: self.slot,
            systems: self.systems,
            type_filter: None,
        }
    }
}

/// Owns the game and is the only thing allowed to change it. Every
/// successful mutation recomputes the dashboard and persists the game.
pub struct Engine {
    scenario: Scenario,
    state: GameState,
    rng: RngManager,
    pinned_seed: Option<u64>,
    slot: SaveSlot,
    systems: Vec<Box<dyn TurnSystem>>,
    type_filter: Option<PropertyType>,
}

impl Engine {
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::compute(&self.state)
    }

    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.state.property(id)
    }

    /// Restrict [`Engine::listings`] to one type. Display only: the game
    /// itself is untouched and nothing is saved.
    pub fn set_type_filter(&mut self, filter: Option<PropertyType>) {
        self.type_filter = filter;
    }

    pub fn type_filter(&self) -> Option<PropertyType> {
        self.type_filter
    }

    pub fn listings(&self) -> Vec<&Property> {
        self.state
            .properties
            .iter()
            .filter(|p| self.type_filter.map_or(true, |kind| p.kind == kind))
            .collect()
    }

    /// Discard the current game and generate a new one, overwriting the save.
    pub fn new_game(&mut self) -> Result<Dashboard, EngineError> {
        self.scenario.validate()?;
        let rng = match self.pinned_seed {
            Some(seed) => RngManager::new(seed),
            None => RngManager::from_entropy(),
        };
        let economy = &self.scenario.economy;
        let cash = rng
            .stream(RngStream::Setup, 0)
            .uniform_i64(economy.start_cash_min, economy.start_cash_max);
        let properties = catalog::generate(
            self.scenario.catalog.count,
            &self.scenario.catalog,
            &mut rng.stream(RngStream::Catalog, 0),
        );

        self.state = GameState {
            seed: rng.seed(),
            month: 0,
            cash,
            properties,
            target_yield: economy.target_yield,
            target_esg: economy.target_esg,
            event_log: Vec::new(),
        };
        self.state.log("🆕 New game started.");
        self.rng = rng;
        info!(
            seed = self.state.seed,
            cash,
            properties = self.state.properties.len(),
            "new game"
        );
        Ok(self.commit()?)
    }

    pub fn buy(&mut self, id: PropertyId) -> Result<Receipt, EngineError> {
        let cash = self.state.cash;
        let property = self
            .state
            .property_mut(id)
            .ok_or(ActionError::UnknownProperty(id))?;
        if property.owner {
            return Err(ActionError::AlreadyOwned(id).into());
        }
        if cash < property.price {
            return Err(ActionError::InsufficientFunds {
                price: property.price,
                cash,
            }
            .into());
        }
        property.owner = true;
        let price = property.price;
        let kind = property.kind;
        self.state.cash -= price;
        debug!(%id, price, cash = self.state.cash, "bought");
        self.receipt(format!("✅ You bought the {} {}.", kind.label(), id))
    }

    pub fn sell(&mut self, id: PropertyId) -> Result<Receipt, EngineError> {
        let property = self
            .state
            .property_mut(id)
            .ok_or(ActionError::UnknownProperty(id))?;
        if !property.owner {
            return Err(ActionError::NotOwned(id).into());
        }
        property.owner = false;
        let price = property.price;
        let kind = property.kind;
        self.state.cash += price;
        debug!(%id, price, cash = self.state.cash, "sold");
        self.receipt(format!("💰 You sold the {} {}.", kind.label(), id))
    }

    pub fn renovate(&mut self, id: PropertyId) -> Result<Receipt, EngineError> {
        let gain = self.scenario.economy.renovation_esg_gain;
        let property = self
            .state
            .property_mut(id)
            .ok_or(ActionError::UnknownProperty(id))?;
        if !property.owner {
            return Err(ActionError::NotOwned(id).into());
        }
        if property.is_esg_saturated() {
            return Err(ActionError::EsgSaturated(id).into());
        }
        let before = property.esg;
        property.adjust_esg(gain);
        let after = property.esg;
        let kind = property.kind;
        debug!(%id, before, after, "renovated");
        self.receipt(format!(
            "🌱 ESG raised by {} for the {} {}.",
            after - before,
            kind.label(),
            id
        ))
    }

    /// Run one monthly turn: rent, then a possible market event, then
    /// bookkeeping. The month always advances by exactly one.
    pub fn advance_month(&mut self) -> Result<MonthReport, EngineError> {
        self.state.month += 1;
        let month = self.state.month;
        let ctx = TurnContext {
            month,
            scenario: &self.scenario,
        };
        let mut report = TurnReport::default();
        for system in &mut self.systems {
            let mut rng = self.rng.named(system.name(), month);
            system.run(&ctx, &mut self.state, &mut rng, &mut report);
        }

        let message = self
            .state
            .event_log
            .last()
            .filter(|entry| entry.month == month)
            .map(|entry| entry.message.clone())
            .unwrap_or_else(|| format!("Month {month} completed."));
        info!(
            month,
            rent = report.rent_collected,
            cash = self.state.cash,
            event = report.event.as_ref().map(|e| e.name.as_str()),
            "month advanced"
        );
        let dashboard = self.commit()?;
        Ok(MonthReport {
            month,
            rent_collected: report.rent_collected,
            event: report.event.map(|e| e.name),
            message,
            dashboard,
        })
    }

    pub fn advance_months(&mut self, months: u32) -> Result<Vec<MonthReport>, EngineError> {
        (0..months).map(|_| self.advance_month()).collect()
    }

    /// Overwrite cash and the two risk thresholds. No bounds are applied.
    pub fn apply_settings(
        &mut self,
        cash: Money,
        target_esg: i64,
        target_yield: i64,
    ) -> Result<Dashboard, EngineError> {
        self.state.cash = cash;
        self.state.target_esg = target_esg;
        self.state.target_yield = target_yield;
        info!(cash, target_esg, target_yield, "settings applied");
        Ok(self.commit()?)
    }

    fn receipt(&mut self, message: String) -> Result<Receipt, EngineError> {
        let dashboard = self.commit()?;
        Ok(Receipt { message, dashboard })
    }

    fn commit(&mut self) -> Result<Dashboard, SaveError> {
        self.slot.store(&self.state)?;
        Ok(self.dashboard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioError;

    fn engine() -> Engine {
        let mut scenario = Scenario::default();
        scenario.economy.event_probability = 0.0;
        scenario.economy.rent_fluctuation = 0;
        EngineBuilder::new(scenario)
            .with_seed(5)
            .with_standard_systems()
            .new_game()
            .unwrap()
    }

    #[test]
    fn new_game_starts_at_month_zero_within_cash_range() {
        let engine = engine();
        let economy = &engine.scenario().economy;
        assert_eq!(engine.state().month, 0);
        assert!(engine.state().cash >= economy.start_cash_min);
        assert!(engine.state().cash < economy.start_cash_max);
        assert_eq!(engine.state().properties.len(), 25);
        assert_eq!(engine.state().owned_count(), 0);
        assert_eq!(engine.state().event_log.len(), 1);
    }

    #[test]
    fn pinned_seed_reproduces_game() {
        assert_eq!(engine().state(), engine().state());
    }

    #[test]
    fn type_filter_does_not_touch_state() {
        let mut engine = engine();
        let before = engine.state().clone();
        engine.set_type_filter(Some(PropertyType::Hotel));
        assert!(engine.listings().iter().all(|p| p.kind == PropertyType::Hotel));
        engine.set_type_filter(None);
        assert_eq!(engine.listings().len(), 25);
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn invalid_scenario_is_refused_before_generation() {
        let mut scenario = Scenario::default();
        scenario.catalog.types.clear();
        let result = EngineBuilder::new(scenario.clone())
            .with_seed(1)
            .with_standard_systems()
            .new_game();
        assert!(matches!(
            result,
            Err(EngineError::Scenario(ScenarioError::NoTypes))
        ));

        let result = EngineBuilder::new(scenario)
            .with_standard_systems()
            .load_or_new();
        assert!(matches!(
            result,
            Err(EngineError::Scenario(ScenarioError::NoTypes))
        ));
    }

    #[test]
    fn bare_builder_only_moves_the_clock() {
        let mut engine = EngineBuilder::new(Scenario::default())
            .with_seed(5)
            .new_game()
            .unwrap();
        let id = engine.state().properties[0].id;
        engine.buy(id).unwrap();
        let cash = engine.state().cash;

        let report = engine.advance_month().unwrap();
        assert_eq!(report.month, 1);
        assert_eq!(report.rent_collected, 0);
        assert_eq!(report.message, "Month 1 completed.");
        assert_eq!(engine.state().cash, cash);
    }

    #[test]
    fn unknown_property_is_reported() {
        let mut engine = engine();
        let id = PropertyId::new(999);
        assert!(matches!(
            engine.buy(id),
            Err(EngineError::Action(ActionError::UnknownProperty(_)))
        ));
        assert!(matches!(
            engine.sell(id),
            Err(EngineError::Action(ActionError::UnknownProperty(_)))
        ));
        assert!(matches!(
            engine.renovate(id),
            Err(EngineError::Action(ActionError::UnknownProperty(_)))
        ));
    }
}
