use serde::{Deserialize, Serialize};

use crate::world::{GameState, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    Low,
    Elevated,
}

impl RiskLabel {
    /// Low only when the portfolio meets both the ESG and the yield target.
    pub fn classify(
        average_esg: i64,
        average_yield: i64,
        target_esg: i64,
        target_yield: i64,
    ) -> Self {
        if average_esg >= target_esg && average_yield >= target_yield {
            RiskLabel::Low
        } else {
            RiskLabel::Elevated
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            RiskLabel::Low => "✔️",
            RiskLabel::Elevated => "⚠️",
        }
    }
}

/// Aggregate portfolio figures shown after every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub month: u32,
    pub cash: Money,
    pub net_worth: Money,
    pub total_monthly_rent: Money,
    /// Monthly rent as a whole percentage of owned value.
    pub average_yield: i64,
    pub average_esg: i64,
    pub risk: RiskLabel,
    pub owned_count: usize,
}

impl Dashboard {
    pub fn compute(state: &GameState) -> Self {
        let mut net_worth: Money = 0;
        let mut total_rent: Money = 0;
        let mut esg_sum: i64 = 0;
        let mut owned_count = 0usize;
        for property in state.owned() {
            net_worth += property.price;
            total_rent += property.rent;
            esg_sum += property.esg as i64;
            owned_count += 1;
        }

        let average_yield = if net_worth > 0 {
            (total_rent as f64 / net_worth as f64 * 100.0).round() as i64
        } else {
            0
        };
        let average_esg = if owned_count > 0 {
            (esg_sum as f64 / owned_count as f64).round() as i64
        } else {
            0
        };

        Self {
            month: state.month,
            cash: state.cash,
            net_worth,
            total_monthly_rent: total_rent,
            average_yield,
            average_esg,
            risk: RiskLabel::classify(
                average_esg,
                average_yield,
                state.target_esg,
                state.target_yield,
            ),
            owned_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Location, Property, PropertyId, PropertyType};

    fn property(id: u32, price: Money, rent: Money, esg: i32, owner: bool) -> Property {
        Property {
            id: PropertyId::new(id),
            kind: PropertyType::Residential,
            price,
            rent,
            esg,
            location: Location { lat: 0.0, lng: 0.0 },
            owner,
        }
    }

    fn state(properties: Vec<Property>) -> GameState {
        GameState {
            seed: 0,
            month: 4,
            cash: 1_000,
            properties,
            target_yield: 8,
            target_esg: 70,
            event_log: Vec::new(),
        }
    }

    #[test]
    fn empty_portfolio_is_zero_and_elevated() {
        let dashboard = Dashboard::compute(&state(vec![property(0, 100, 10, 90, false)]));
        assert_eq!(dashboard.net_worth, 0);
        assert_eq!(dashboard.average_yield, 0);
        assert_eq!(dashboard.average_esg, 0);
        assert_eq!(dashboard.owned_count, 0);
        assert_eq!(dashboard.risk, RiskLabel::Elevated);
        assert_eq!(dashboard.month, 4);
        assert_eq!(dashboard.cash, 1_000);
    }

    #[test]
    fn aggregates_only_owned_properties() {
        let dashboard = Dashboard::compute(&state(vec![
            property(0, 1_000, 50, 80, true),
            property(1, 3_000, 250, 71, true),
            property(2, 9_000, 900, 10, false),
        ]));
        assert_eq!(dashboard.net_worth, 4_000);
        assert_eq!(dashboard.total_monthly_rent, 300);
        // 300 / 4000 = 7.5% rounds to 8
        assert_eq!(dashboard.average_yield, 8);
        // (80 + 71) / 2 = 75.5 rounds to 76
        assert_eq!(dashboard.average_esg, 76);
        assert_eq!(dashboard.risk, RiskLabel::Low);
    }

    #[test]
    fn risk_requires_both_thresholds() {
        assert_eq!(RiskLabel::classify(70, 8, 70, 8), RiskLabel::Low);
        assert_eq!(RiskLabel::classify(69, 20, 70, 8), RiskLabel::Elevated);
        assert_eq!(RiskLabel::classify(100, 7, 70, 8), RiskLabel::Elevated);
    }
}
