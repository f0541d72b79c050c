//! Property catalog generation for a new game.

use rand::Rng;

use crate::{
    rng::RngExt,
    scenario::CatalogRules,
    world::{Location, Money, Property, PropertyId, ESG_MAX, ESG_MIN},
};

/// Generate `count` unowned properties with sequential ids starting at 0.
///
/// Rent is drawn once here as `price * rent_base_rate` plus noise and is
/// never recomputed afterwards. Assumes `rules` passed
/// [`Scenario::validate`](crate::scenario::Scenario::validate).
pub fn generate<R: Rng>(count: usize, rules: &CatalogRules, rng: &mut R) -> Vec<Property> {
    let mut properties = Vec::with_capacity(count);
    for index in 0..count {
        let kind = rules.types[rng.gen_range(0..rules.types.len())];
        let price = rng.uniform_i64(rules.price_min, rules.price_max).max(1);
        let noise = rng.uniform_f64(0.0, rules.rent_noise_max as f64);
        let rent = ((price as f64 * rules.rent_base_rate + noise).floor() as Money).max(1);
        let esg = (rng.uniform_i64(rules.esg_min as i64, rules.esg_max as i64) as i32)
            .clamp(ESG_MIN, ESG_MAX);
        let bounds = &rules.bounds;
        let location = Location {
            lat: rng.uniform_f64(bounds.lat_min, bounds.lat_max),
            lng: rng.uniform_f64(bounds.lng_min, bounds.lng_max),
        };
        properties.push(Property {
            id: PropertyId::new(index as u32),
            kind,
            price,
            rent,
            esg,
            location,
            owner: false,
        });
    }
    properties
}
