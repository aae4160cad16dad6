// Team purse and roster bookkeeping.

use serde::{Deserialize, Serialize};

use super::player::Player;
use crate::money::Money;

/// A player won (or retained) by a team, with the price paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signing {
    pub player: Player,
    pub price: Money,
}

/// The state of a single team during the auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team name; also the identifier used when bidding.
    pub name: String,
    /// Money left to spend.
    pub purse: Money,
    /// Purse at the start of the auction.
    pub starting_purse: Money,
    /// Players won so far, in the order they were signed.
    pub roster: Vec<Signing>,
}

impl Team {
    pub fn new(name: impl Into<String>, purse: Money) -> Self {
        Self {
            name: name.into(),
            purse,
            starting_purse: purse,
            roster: Vec::new(),
        }
    }

    /// Total paid for the current roster.
    pub fn spent(&self) -> Money {
        self.starting_purse - self.purse
    }

    pub fn can_afford(&self, price: Money) -> bool {
        self.purse >= price
    }

    pub fn has_player(&self, player_name: &str) -> bool {
        self.roster.iter().any(|s| s.player.name == player_name)
    }

    /// Deduct `price` and append the signing. Returns `false` and leaves the
    /// team untouched if the purse cannot cover it.
    pub(crate) fn sign(&mut self, player: Player, price: Money) -> bool {
        match self.purse.checked_sub(price) {
            Some(remaining) => {
                self.purse = remaining;
                self.roster.push(Signing { player, price });
                true
            }
            None => false,
        }
    }

    /// Remove the most recent signing of `player_name` and refund its price.
    pub(crate) fn release(&mut self, player_name: &str) -> Option<Signing> {
        let idx = self
            .roster
            .iter()
            .rposition(|s| s.player.name == player_name)?;
        let signing = self.roster.remove(idx);
        self.purse += signing.price;
        Some(signing)
    }
}
