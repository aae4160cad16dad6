// The auction ledger: teams, unsold pool, active lot, and sale history.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::player::{Player, Role};
use super::pricing::BasePricePolicy;
use super::selection::PlayerSelector;
use super::team::Team;
use crate::money::Money;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Expected, recoverable rejections. A rejected operation never changes state.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AuctionError {
    #[error("no lot is currently active")]
    NoActiveLot,

    #[error("a lot is already active for {player}")]
    LotAlreadyActive { player: String },

    #[error("the player pool is exhausted")]
    PoolExhausted,

    #[error("{team} cannot bid {required}: only {available} left in purse")]
    InsufficientFunds {
        team: String,
        required: Money,
        available: Money,
    },

    #[error("nothing to undo")]
    EmptyHistory,

    #[error("{team} already holds the highest bid")]
    TeamAlreadyLeading { team: String },

    #[error("unknown team: {team}")]
    UnknownTeam { team: String },

    #[error("player not in pool: {player}")]
    UnknownPlayer { player: String },
}

/// Problems with the initial teams/pool handed to [`AuctionLedger::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("an auction needs at least one team")]
    NoTeams,

    #[error("duplicate team name: {0}")]
    DuplicateTeam(String),

    #[error("duplicate player name: {0}")]
    DuplicatePlayer(String),

    #[error("bid increment must be greater than zero")]
    ZeroIncrement,
}

// ---------------------------------------------------------------------------
// Lot and history
// ---------------------------------------------------------------------------

/// The player currently under the hammer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub player: Player,
    /// Current asking price; the base price until the first bid.
    pub price: Money,
    /// Team holding the highest bid, if anyone has bid.
    pub leader: Option<String>,
    /// Number of accepted bids on this lot.
    pub bids: u32,
    /// Position in the pool the player was drawn from.
    #[serde(skip)]
    pool_index: usize,
}

/// How a lot ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LotOutcome {
    Sold { team: String, price: Money },
    Unsold,
}

/// Immutable record of a finalized lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub player: Player,
    pub outcome: LotOutcome,
    #[serde(skip)]
    pool_index: usize,
}

impl HistoryEntry {
    pub fn is_sold(&self) -> bool {
        matches!(self.outcome, LotOutcome::Sold { .. })
    }
}

// ---------------------------------------------------------------------------
// Rules and snapshot
// ---------------------------------------------------------------------------

/// Fixed parameters of an auction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionRules {
    /// Amount every bid adds to the current price.
    pub increment: Money,
    pub base_price: BasePricePolicy,
}

impl Default for AuctionRules {
    fn default() -> Self {
        Self {
            increment: Money::from_lakhs(50),
            base_price: BasePricePolicy::default(),
        }
    }
}

/// Owned copy of the whole ledger for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSnapshot {
    pub lot: Option<Lot>,
    pub teams: Vec<Team>,
    pub pool: Vec<Player>,
    pub history: Vec<HistoryEntry>,
}

// ---------------------------------------------------------------------------
// AuctionLedger
// ---------------------------------------------------------------------------

/// Owns all auction state and enforces the lot state machine
/// (`NoLot -> Active -> NoLot`).
///
/// Every player is always in exactly one of: the pool, the active lot, a
/// team roster, or (once passed over) the unsold entries of the history.
/// Purses never go negative.
#[derive(Debug)]
pub struct AuctionLedger {
    teams: Vec<Team>,
    pool: Vec<Player>,
    lot: Option<Lot>,
    history: Vec<HistoryEntry>,
    rules: AuctionRules,
    selector: Box<dyn PlayerSelector>,
}

impl AuctionLedger {
    /// Create a ledger with every player in the pool and no active lot.
    ///
    /// Team order is preserved for display; team and player names must be
    /// unique.
    pub fn new(
        teams: Vec<Team>,
        players: Vec<Player>,
        rules: AuctionRules,
        selector: Box<dyn PlayerSelector>,
    ) -> Result<Self, SetupError> {
        if teams.is_empty() {
            return Err(SetupError::NoTeams);
        }
        if rules.increment.is_zero() {
            return Err(SetupError::ZeroIncrement);
        }

        if let Some(name) = first_duplicate(teams.iter().map(|t| t.name.as_str())) {
            return Err(SetupError::DuplicateTeam(name.to_string()));
        }
        let rostered = teams.iter().flat_map(|t| t.roster.iter().map(|s| &s.player));
        let all_players = players.iter().chain(rostered).map(|p| p.name.as_str());
        if let Some(name) = first_duplicate(all_players) {
            return Err(SetupError::DuplicatePlayer(name.to_string()));
        }

        info!(
            "Auction ledger ready: {} teams, {} players, increment {}",
            teams.len(),
            players.len(),
            rules.increment
        );

        Ok(Self {
            teams,
            pool: players,
            lot: None,
            history: Vec::new(),
            rules,
            selector,
        })
    }

    /// Draw the next player from the pool and open bidding at its base price.
    pub fn start_lot(&mut self) -> Result<&Lot, AuctionError> {
        if let Some(lot) = &self.lot {
            return Err(AuctionError::LotAlreadyActive {
                player: lot.player.name.clone(),
            });
        }
        if self.pool.is_empty() {
            return Err(AuctionError::PoolExhausted);
        }

        let pool_index = self.selector.select(&self.pool).min(self.pool.len() - 1);
        let player = self.pool.remove(pool_index);
        let price = self.rules.base_price.base_price(player.rating);
        info!(
            "Lot opened: {} ({}, rating {}) at {}",
            player.name, player.role, player.rating, price
        );

        Ok(self.lot.insert(Lot {
            player,
            price,
            leader: None,
            bids: 0,
            pool_index,
        }))
    }

    /// Raise the active lot by one increment on behalf of `team`.
    pub fn place_bid(&mut self, team: &str) -> Result<&Lot, AuctionError> {
        let Some(lot) = self.lot.as_mut() else {
            return Err(AuctionError::NoActiveLot);
        };
        let Some(bidder) = self.teams.iter().find(|t| t.name == team) else {
            return Err(AuctionError::UnknownTeam { team: team.into() });
        };
        if lot.leader.as_deref() == Some(team) {
            return Err(AuctionError::TeamAlreadyLeading { team: team.into() });
        }

        let next_price = lot.price.checked_add(self.rules.increment);
        let next_price = match next_price {
            Some(price) if bidder.can_afford(price) => price,
            _ => {
                return Err(AuctionError::InsufficientFunds {
                    team: team.into(),
                    required: lot.price + self.rules.increment,
                    available: bidder.purse,
                });
            }
        };

        lot.price = next_price;
        lot.leader = Some(bidder.name.clone());
        lot.bids += 1;
        debug!("{} bids {} for {}", team, next_price, lot.player.name);

        Ok(lot)
    }

    /// Close the active lot: sell to the leader, or mark the player unsold.
    ///
    /// Unsold players are withdrawn from the auction; only [`undo_last`]
    /// puts them back in the pool.
    ///
    /// [`undo_last`]: AuctionLedger::undo_last
    pub fn finalize_lot(&mut self) -> Result<&HistoryEntry, AuctionError> {
        let Some(lot) = self.lot.take() else {
            return Err(AuctionError::NoActiveLot);
        };

        let outcome = match lot.leader.clone() {
            Some(leader) => {
                let signed = self
                    .teams
                    .iter_mut()
                    .find(|t| t.name == leader)
                    .map(|t| (t.purse, t.sign(lot.player.clone(), lot.price)));
                let err = match signed {
                    Some((_, true)) => None,
                    Some((available, false)) => Some(AuctionError::InsufficientFunds {
                        team: leader.clone(),
                        required: lot.price,
                        available,
                    }),
                    None => Some(AuctionError::UnknownTeam {
                        team: leader.clone(),
                    }),
                };
                if let Some(err) = err {
                    self.lot = Some(lot);
                    return Err(err);
                }
                info!("{} sold to {} for {}", lot.player.name, leader, lot.price);
                LotOutcome::Sold {
                    team: leader,
                    price: lot.price,
                }
            }
            None => {
                info!("{} goes unsold", lot.player.name);
                LotOutcome::Unsold
            }
        };

        self.history.push(HistoryEntry {
            player: lot.player,
            outcome,
            pool_index: lot.pool_index,
        });
        let last = self.history.len() - 1;
        Ok(&self.history[last])
    }

    /// Reverse the most recent finalize.
    ///
    /// A sold player is released from the roster with a full refund; either
    /// way the player goes back to the pool position it was drawn from.
    /// Refused while a lot is open.
    pub fn undo_last(&mut self) -> Result<HistoryEntry, AuctionError> {
        if let Some(lot) = &self.lot {
            return Err(AuctionError::LotAlreadyActive {
                player: lot.player.name.clone(),
            });
        }
        let Some(entry) = self.history.pop() else {
            return Err(AuctionError::EmptyHistory);
        };

        if let LotOutcome::Sold { team, price } = &entry.outcome {
            let released = self
                .teams
                .iter_mut()
                .find(|t| &t.name == team)
                .and_then(|t| t.release(&entry.player.name));
            match released {
                Some(_) => info!(
                    "Undo: {} released by {}, {} refunded",
                    entry.player.name, team, price
                ),
                None => warn!(
                    "Undo: {} not found on {}'s roster, returning to pool anyway",
                    entry.player.name, team
                ),
            }
        } else {
            info!("Undo: {} returns to the pool", entry.player.name);
        }

        let idx = entry.pool_index.min(self.pool.len());
        self.pool.insert(idx, entry.player.clone());
        Ok(entry)
    }

    /// Assign a pool player to `team` before bidding starts on it.
    ///
    /// Retentions are not part of the lot history and cannot be undone.
    pub fn retain(&mut self, team: &str, player: &str, price: Money) -> Result<&Team, AuctionError> {
        if let Some(lot) = &self.lot {
            return Err(AuctionError::LotAlreadyActive {
                player: lot.player.name.clone(),
            });
        }
        let Some(pool_idx) = self.pool.iter().position(|p| p.name == player) else {
            return Err(AuctionError::UnknownPlayer {
                player: player.into(),
            });
        };
        let Some(owner) = self.teams.iter_mut().find(|t| t.name == team) else {
            return Err(AuctionError::UnknownTeam { team: team.into() });
        };
        if !owner.can_afford(price) {
            return Err(AuctionError::InsufficientFunds {
                team: team.into(),
                required: price,
                available: owner.purse,
            });
        }

        let retained = self.pool.remove(pool_idx);
        info!("{} retained by {} for {}", retained.name, team, price);
        owner.sign(retained, price);
        Ok(owner)
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn current_lot(&self) -> Option<&Lot> {
        self.lot.as_ref()
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name == name)
    }

    /// Players still waiting to be auctioned.
    pub fn pool(&self) -> &[Player] {
        &self.pool
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn rules(&self) -> &AuctionRules {
        &self.rules
    }

    /// The remaining pool grouped by role, best rated first within a role.
    pub fn pool_by_role(&self) -> BTreeMap<Role, Vec<&Player>> {
        let mut groups: BTreeMap<Role, Vec<&Player>> = BTreeMap::new();
        for player in &self.pool {
            groups.entry(player.role).or_default().push(player);
        }
        for players in groups.values_mut() {
            players.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.name.cmp(&b.name)));
        }
        groups
    }

    /// True once every player has been through the hammer.
    pub fn is_complete(&self) -> bool {
        self.pool.is_empty() && self.lot.is_none()
    }

    pub fn snapshot(&self) -> AuctionSnapshot {
        AuctionSnapshot {
            lot: self.lot.clone(),
            teams: self.teams.clone(),
            pool: self.pool.clone(),
            history: self.history.clone(),
        }
    }
}

fn first_duplicate<'a>(mut names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.find(|name| !seen.insert(*name))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
