// Library root: the auction ledger and the layers that feed it
// (money, config, player pool input).

pub mod auction;
pub mod config;
pub mod money;
pub mod pool;

pub use auction::{AuctionError, AuctionLedger};
pub use money::Money;
