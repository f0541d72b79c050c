use rand_chacha::ChaCha8Rng;

use crate::{
    engine::{TurnContext, TurnReport, TurnSystem},
    world::{GameState, ESG_MAX, ESG_MIN},
};

/// Re-asserts property invariants at the end of a turn and trims the
/// event log when a capacity is configured.
pub struct BookkeepingSystem;

impl BookkeepingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BookkeepingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnSystem for BookkeepingSystem {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn run(
        &mut self,
        ctx: &TurnContext,
        state: &mut GameState,
        _rng: &mut ChaCha8Rng,
        _report: &mut TurnReport,
    ) {
        let floor = ctx.scenario.economy.price_floor;
        for property in state.properties.iter_mut() {
            property.esg = property.esg.clamp(ESG_MIN, ESG_MAX);
            property.price = property.price.max(floor);
            property.rent = property.rent.max(0);
        }
        if let Some(capacity) = ctx.scenario.economy.log_capacity {
            let excess = state.event_log.len().saturating_sub(capacity);
            if excess > 0 {
                state.event_log.drain(..excess);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngManager;
    use crate::scenario::Scenario;
    use crate::world::{LogEntry, Location, Property, PropertyId, PropertyType};

    #[test]
    fn restores_invariants_and_trims_log() {
        let mut scenario = Scenario::default();
        scenario.economy.log_capacity = Some(2);
        scenario.economy.price_floor = 10;
        let ctx = TurnContext {
            month: 3,
            scenario: &scenario,
        };
        let mut state = GameState {
            seed: 1,
            month: 3,
            cash: 0,
            properties: vec![Property {
                id: PropertyId::new(0),
                kind: PropertyType::Retail,
                price: 0,
                rent: -5,
                esg: 130,
                location: Location { lat: 0.0, lng: 0.0 },
                owner: true,
            }],
            target_yield: 8,
            target_esg: 70,
            event_log: (1..=3)
                .map(|month| LogEntry {
                    month,
                    message: format!("Month {month}"),
                })
                .collect(),
        };

        let mut rng = RngManager::new(1).named("bookkeeping", 3);
        BookkeepingSystem::new().run(&ctx, &mut state, &mut rng, &mut TurnReport::default());

        let property = &state.properties[0];
        assert_eq!(property.esg, 100);
        assert_eq!(property.price, 10);
        assert_eq!(property.rent, 0);
        assert_eq!(state.event_log.len(), 2);
        assert_eq!(state.event_log[0].month, 2);
    }
}
