pub mod ledger;
pub mod player;
pub mod pricing;
pub mod selection;
pub mod team;

pub use ledger::{
    AuctionError, AuctionLedger, AuctionRules, AuctionSnapshot, HistoryEntry, Lot, LotOutcome,
    SetupError,
};
pub use player::{Player, Role};
pub use pricing::{BasePricePolicy, PriceTier};
pub use selection::{PlayerSelector, RandomSelector, SequentialSelector};
pub use team::{Signing, Team};
