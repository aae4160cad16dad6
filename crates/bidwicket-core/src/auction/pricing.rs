// Opening (base) price policy for a lot.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// One rung of a tiered price ladder: players rated strictly above
/// `above` open at `price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    pub above: u32,
    pub price: Money,
}

/// How the opening price of a lot is derived from the player's rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasePricePolicy {
    /// Every player opens at the same price.
    Flat { price: Money },
    /// Highest matching tier wins; players below every tier open at `floor`.
    Tiered { tiers: Vec<PriceTier>, floor: Money },
}

impl BasePricePolicy {
    /// Build a tiered policy. Tiers are stored highest threshold first so
    /// lookup can stop at the first match regardless of input order.
    pub fn tiered(mut tiers: Vec<PriceTier>, floor: Money) -> Self {
        tiers.sort_by(|a, b| b.above.cmp(&a.above));
        BasePricePolicy::Tiered { tiers, floor }
    }

    /// Opening price for a player with the given rating.
    pub fn base_price(&self, rating: u32) -> Money {
        match self {
            BasePricePolicy::Flat { price } => *price,
            BasePricePolicy::Tiered { tiers, floor } => tiers
                .iter()
                .find(|tier| rating > tier.above)
                .map(|tier| tier.price)
                .unwrap_or(*floor),
        }
    }
}

impl Default for BasePricePolicy {
    /// The classic ladder: above 85 opens at 2.0, above 80 at 1.5, else 1.0.
    fn default() -> Self {
        BasePricePolicy::tiered(
            vec![
                PriceTier {
                    above: 85,
                    price: Money::from_lakhs(200),
                },
                PriceTier {
                    above: 80,
                    price: Money::from_lakhs(150),
                },
            ],
            Money::from_lakhs(100),
        )
    }
}
