use std::path::PathBuf;

use estate_tycoon::{
    engine::EngineBuilder,
    scenario::{Scenario, ScenarioLoader},
};

fn scenario_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios")
}

fn load(name: &str) -> Scenario {
    ScenarioLoader::new(scenario_dir())
        .load(name)
        .unwrap_or_else(|err| panic!("failed to load {name}: {err:#}"))
}

#[test]
fn casablanca_matches_built_in_rules() {
    let scenario = load("casablanca.yaml");
    let defaults = Scenario::default();
    assert_eq!(scenario.catalog, defaults.catalog);
    assert_eq!(scenario.economy, defaults.economy);
    assert_eq!(scenario.events, defaults.events);
}

#[test]
fn quiet_market_collects_rent_only() {
    let scenario = load("quiet_market.yaml");
    let mut engine = EngineBuilder::new(scenario)
        .with_standard_systems()
        .new_game()
        .unwrap();
    assert_eq!(engine.state().seed, 7);
    assert_eq!(engine.state().cash, 20_000_000);

    let id = engine
        .state()
        .properties
        .iter()
        .find(|p| p.price <= 20_000_000)
        .map(|p| p.id)
        .expect("an affordable property");
    engine.buy(id).unwrap();
    let cash = engine.state().cash;
    let rent = engine.property(id).unwrap().rent;

    let report = engine.advance_month().unwrap();
    assert!(report.event.is_none());
    assert_eq!(report.rent_collected, rent);
    assert_eq!(engine.state().cash, cash + rent);
}
