// Configuration loading and parsing (config/auction.toml).

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::auction::ledger::AuctionRules;
use crate::auction::pricing::{BasePricePolicy, PriceTier};
use crate::auction::selection::{PlayerSelector, RandomSelector, SequentialSelector};
use crate::auction::team::Team;
use crate::money::Money;

/// Config file name inside `config/` (and `defaults/`).
pub const CONFIG_FILE: &str = "auction.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// auction.toml structs
// ---------------------------------------------------------------------------

/// The assembled auction configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub auction: AuctionSection,
    #[serde(default)]
    pub selection: SelectionConfig,
    pub base_price: BasePriceConfig,
    pub teams: Vec<TeamConfig>,
    #[serde(default)]
    pub retained: Vec<RetainedConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuctionSection {
    pub name: String,
    pub bid_increment: Money,
    pub lot_duration_secs: u64,
    pub players_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    #[default]
    Random,
    Sequential,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub strategy: SelectionStrategy,
    /// Fixed seed for reproducible random draws.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Flat,
    Tiered,
}

/// Raw `[base_price]` table; both policies' fields may be present, only the
/// selected one is used.
#[derive(Debug, Clone, Deserialize)]
pub struct BasePriceConfig {
    pub policy: PolicyKind,
    #[serde(default)]
    pub flat: Option<Money>,
    #[serde(default)]
    pub floor: Option<Money>,
    #[serde(default)]
    pub tiers: Vec<PriceTier>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    pub purse: Money,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetainedConfig {
    pub team: String,
    pub player: String,
    pub price: Money,
}

impl Config {
    pub fn rules(&self) -> AuctionRules {
        AuctionRules {
            increment: self.auction.bid_increment,
            base_price: self.base_price.to_policy(),
        }
    }

    /// Fresh teams with full purses, in config order.
    pub fn teams(&self) -> Vec<Team> {
        self.teams
            .iter()
            .map(|t| Team::new(t.name.clone(), t.purse))
            .collect()
    }

    pub fn selector(&self) -> Box<dyn PlayerSelector> {
        match (self.selection.strategy, self.selection.seed) {
            (SelectionStrategy::Sequential, _) => Box::new(SequentialSelector),
            (SelectionStrategy::Random, Some(seed)) => Box::new(RandomSelector::seeded(seed)),
            (SelectionStrategy::Random, None) => Box::new(RandomSelector::new()),
        }
    }

    pub fn lot_duration(&self) -> Duration {
        Duration::from_secs(self.auction.lot_duration_secs)
    }

    /// The player sheet path, resolved against `base_dir` when relative.
    pub fn players_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.auction.players_path)
    }
}

impl BasePriceConfig {
    /// Only meaningful after validation, which guarantees the selected
    /// policy's fields are present.
    pub fn to_policy(&self) -> BasePricePolicy {
        match self.policy {
            PolicyKind::Flat => BasePricePolicy::Flat {
                price: self.flat.unwrap_or_default(),
            },
            PolicyKind::Tiered => {
                BasePricePolicy::tiered(self.tiers.clone(), self.floor.unwrap_or_default())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/auction.toml` relative to `base_dir`.
///
/// Does not copy defaults; call [`ensure_config_files`] first for a fresh
/// project directory.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config = parse_config(&text).map_err(|source| ConfigError::ParseError {
        path: path.clone(),
        source,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Parse config text without validating it.
pub fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

/// Copy every config file missing from `config/` out of `defaults/`.
///
/// Existing files are never overwritten and `.example` files are skipped.
/// Returns the paths written. A project with `config/` but no `defaults/` is
/// left alone.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    match (defaults_dir.is_dir(), config_dir.is_dir()) {
        (false, false) => {
            return Err(copy_error(format!(
                "neither defaults/ nor config/ directory found in {}",
                base_dir.display()
            )));
        }
        (false, true) => return Ok(Vec::new()),
        _ => {}
    }

    fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("cannot create {}: {e}", config_dir.display())))?;
    let entries = fs::read_dir(&defaults_dir)
        .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?;

    let mut copied = Vec::new();
    for entry in entries {
        let source = entry
            .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?
            .path();
        let Some(file_name) = source.file_name().filter(|_| source.is_file()) else {
            continue;
        };
        if source.extension().is_some_and(|ext| ext == "example") {
            continue;
        }

        let target = config_dir.join(file_name);
        if copy_if_absent(&source, &target)? {
            info!("Copied default config {} to {}", source.display(), target.display());
            copied.push(target);
        }
    }
    Ok(copied)
}

/// Create `target` with the contents of `source` unless it already exists.
/// Returns whether anything was written.
fn copy_if_absent(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let mut dest = match fs::OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(copy_error(format!("cannot create {}: {e}", target.display())));
        }
    };
    let mut src = fs::File::open(source)
        .map_err(|e| copy_error(format!("cannot read {}: {e}", source.display())))?;
    io::copy(&mut src, &mut dest)
        .map_err(|e| copy_error(format!("cannot write {}: {e}", target.display())))?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// A configured name must be non-empty and carry no surrounding whitespace,
/// since the ledger matches names exactly.
fn checked_name(field: String, value: &str) -> Result<&str, ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    if value.trim() != value {
        return Err(invalid(
            field,
            format!("'{value}' has leading or trailing whitespace"),
        ));
    }
    Ok(value)
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.auction.bid_increment.is_zero() {
        return Err(invalid("auction.bid_increment", "must be greater than 0"));
    }
    if config.auction.lot_duration_secs == 0 {
        return Err(invalid("auction.lot_duration_secs", "must be greater than 0"));
    }

    match config.base_price.policy {
        PolicyKind::Flat if config.base_price.flat.is_none() => {
            return Err(invalid("base_price.flat", "required when policy = \"flat\""));
        }
        PolicyKind::Tiered if config.base_price.floor.is_none() => {
            return Err(invalid("base_price.floor", "required when policy = \"tiered\""));
        }
        _ => {}
    }

    if config.teams.is_empty() {
        return Err(invalid("teams", "at least one team is required"));
    }
    let mut names = HashSet::new();
    for (i, team) in config.teams.iter().enumerate() {
        let name = checked_name(format!("teams[{i}].name"), &team.name)?;
        if !names.insert(name) {
            return Err(invalid(
                format!("teams[{i}].name"),
                format!("duplicate team name '{name}'"),
            ));
        }
    }

    let mut retained_players = HashSet::new();
    for (i, r) in config.retained.iter().enumerate() {
        let team = checked_name(format!("retained[{i}].team"), &r.team)?;
        if !names.contains(team) {
            return Err(invalid(
                format!("retained[{i}].team"),
                format!("unknown team '{team}'"),
            ));
        }
        let player = checked_name(format!("retained[{i}].player"), &r.player)?;
        if !retained_players.insert(player) {
            return Err(invalid(
                format!("retained[{i}].player"),
                format!("'{player}' is retained more than once"),
            ));
        }
    }

    Ok(())
}
