use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::{
    engine::{TurnContext, TurnReport, TurnSystem},
    rng::RngExt,
    scenario::MarketEvent,
    world::{GameState, Money},
};

/// Rolls for a random market event and records the month's outcome in
/// the event log.
pub struct MarketEventSystem;

impl MarketEventSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarketEventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnSystem for MarketEventSystem {
    fn name(&self) -> &str {
        "market_events"
    }

    fn run(
        &mut self,
        ctx: &TurnContext,
        state: &mut GameState,
        rng: &mut ChaCha8Rng,
        report: &mut TurnReport,
    ) {
        let events = &ctx.scenario.events;
        let fires = !events.is_empty() && rng.chance(ctx.scenario.economy.event_probability);
        if !fires {
            state.log(format!("Month {}: no event this month.", ctx.month));
            return;
        }

        let event = &events[rng.gen_range(0..events.len())];
        apply_event(state, event, ctx.scenario.economy.price_floor);
        info!(
            month = ctx.month,
            event = %event.name,
            cash = state.cash,
            "market event"
        );
        state.log(format!("Month {}: ⚡ {}", ctx.month, event.message));
        report.event = Some(event.clone());
    }
}

/// Apply `event` to the portfolio. Cash scales multiplicatively and is
/// never clamped; owned properties get the ESG delta (clamped to [0, 100])
/// and the value delta (price floored at `price_floor`, rent at 0).
pub fn apply_event(state: &mut GameState, event: &MarketEvent, price_floor: Money) {
    state.cash = scale(state.cash, event.cash_impact);
    for property in state.owned_mut() {
        property.adjust_esg(event.esg_impact);
        if event.value_impact != 0.0 {
            property.price = scale(property.price, event.value_impact).max(price_floor);
            property.rent = scale(property.rent, event.value_impact).max(0);
        }
    }
}

fn scale(amount: Money, delta: f64) -> Money {
    (amount as f64 * (1.0 + delta)).round() as Money
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Location, Property, PropertyId, PropertyType};

    fn state(cash: Money) -> GameState {
        let property = |id, esg, owner| Property {
            id: PropertyId::new(id),
            kind: PropertyType::Luxury,
            price: 2_000_000,
            rent: 8_000,
            esg,
            location: Location { lat: 0.0, lng: 0.0 },
            owner,
        };
        GameState {
            seed: 1,
            month: 1,
            cash,
            properties: vec![
                property(0, 3, true),
                property(1, 98, true),
                property(2, 50, false),
            ],
            target_yield: 8,
            target_esg: 70,
            event_log: Vec::new(),
        }
    }

    fn event(cash_impact: f64, esg_impact: i32, value_impact: f64) -> MarketEvent {
        MarketEvent {
            name: "Test".into(),
            message: "test event".into(),
            cash_impact,
            esg_impact,
            value_impact,
        }
    }

    #[test]
    fn cash_impact_is_multiplicative() {
        let mut state = state(1_000_000);
        apply_event(&mut state, &event(-0.15, 0, 0.0), 1);
        assert_eq!(state.cash, 850_000);
    }

    #[test]
    fn negative_cash_is_not_clamped() {
        let mut state = state(-200_000);
        apply_event(&mut state, &event(0.10, 0, 0.0), 1);
        assert_eq!(state.cash, -220_000);
    }

    #[test]
    fn esg_impact_hits_owned_properties_and_clamps() {
        let mut state = state(0);
        apply_event(&mut state, &event(0.0, -5, 0.0), 1);
        assert_eq!(state.properties[0].esg, 0);
        assert_eq!(state.properties[1].esg, 93);
        assert_eq!(state.properties[2].esg, 50);

        apply_event(&mut state, &event(0.0, 10, 0.0), 1);
        assert_eq!(state.properties[1].esg, 100);
    }

    #[test]
    fn value_impact_respects_price_floor() {
        let mut state = state(0);
        apply_event(&mut state, &event(0.0, 0, -0.5), 1);
        assert_eq!(state.properties[0].price, 1_000_000);
        assert_eq!(state.properties[0].rent, 4_000);
        assert_eq!(state.properties[2].price, 2_000_000);

        apply_event(&mut state, &event(0.0, 0, -1.5), 750);
        assert_eq!(state.properties[0].price, 750);
        assert_eq!(state.properties[0].rent, 0);
    }
}
