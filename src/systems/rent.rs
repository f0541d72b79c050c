use rand_chacha::ChaCha8Rng;

use crate::{
    engine::{TurnContext, TurnReport, TurnSystem},
    rng::RngExt,
    world::GameState,
};

/// Credits the rent of every owned property, with a bounded fluctuation.
pub struct RentSystem;

impl RentSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RentSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnSystem for RentSystem {
    fn name(&self) -> &str {
        "rent"
    }

    fn run(
        &mut self,
        ctx: &TurnContext,
        state: &mut GameState,
        rng: &mut ChaCha8Rng,
        report: &mut TurnReport,
    ) {
        let spread = ctx.scenario.economy.rent_fluctuation;
        let mut collected = 0;
        for property in state.owned() {
            let fluctuation = if spread > 0 {
                rng.uniform_i64(-spread, spread)
            } else {
                0
            };
            collected += property.rent + fluctuation;
        }
        state.cash += collected;
        report.rent_collected += collected;
    }
}
