// Player records and playing roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cricket playing roles used to group the auction pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    AllRounder,
    Batsman,
    Bowler,
    Wicketkeeper,
}

impl Role {
    /// Parse a role string from a player sheet.
    ///
    /// Case-insensitive; accepts the usual spellings and abbreviations:
    /// - "Batsman", "Batter", "BAT" -> Batsman
    /// - "Bowler", "BOWL" -> Bowler
    /// - "All-Rounder", "Allrounder", "All Rounder", "AR" -> AllRounder
    /// - "Wicketkeeper", "Wicket-Keeper", "Keeper", "WK" -> Wicketkeeper
    pub fn from_str_role(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | ' ' | '_'))
            .collect::<String>()
            .to_uppercase();
        match normalized.as_str() {
            "BATSMAN" | "BATTER" | "BAT" => Some(Role::Batsman),
            "BOWLER" | "BOWL" => Some(Role::Bowler),
            "ALLROUNDER" | "AR" => Some(Role::AllRounder),
            "WICKETKEEPER" | "KEEPER" | "WK" => Some(Role::Wicketkeeper),
            _ => None,
        }
    }

    /// Return the display string for this role.
    pub fn display_str(&self) -> &'static str {
        match self {
            Role::AllRounder => "All-Rounder",
            Role::Batsman => "Batsman",
            Role::Bowler => "Bowler",
            Role::Wicketkeeper => "Wicketkeeper",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A player available for auction. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    /// Unique player name.
    pub name: String,
    pub role: Role,
    /// Scouting rating; drives the tiered base price.
    pub rating: u32,
}

impl Player {
    pub fn new(name: impl Into<String>, role: Role, rating: u32) -> Self {
        Self {
            name: name.into(),
            role,
            rating,
        }
    }
}
