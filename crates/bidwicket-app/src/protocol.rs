// Messages exchanged between the session loop and its display collaborator.

use serde::Serialize;

use bidwicket_core::auction::{AuctionError, AuctionSnapshot, HistoryEntry};

/// Commands from the display layer (button presses).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuctionCommand {
    /// Put the next player up for bidding.
    StartLot,
    /// Raise the active lot on behalf of a team.
    Bid { team: String },
    /// Close the active lot now instead of waiting for the countdown.
    Pass,
    /// Reverse the most recent sale or pass.
    Undo,
    /// Ask for a fresh snapshot without changing anything.
    Snapshot,
    Quit,
}

/// Ledger state plus the lot countdown, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    #[serde(flatten)]
    pub auction: AuctionSnapshot,
    /// Whole seconds left before the active lot closes itself.
    pub time_remaining_secs: Option<u64>,
}

/// Updates pushed to the display layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum UiUpdate {
    StateSnapshot(Box<SessionSnapshot>),
    /// The countdown ran out and the lot was finalized.
    LotClosed(HistoryEntry),
    /// A command was refused; nothing changed.
    Rejected(AuctionError),
}

impl UiUpdate {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
