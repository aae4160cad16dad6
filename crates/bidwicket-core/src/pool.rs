// Player pool loading.
//
// Reads a player sheet CSV with `name`, `role` and `rating` columns. Header
// names are matched case-insensitively and extra columns are ignored. Rows
// that cannot be used are logged and skipped rather than failing the load,
// but a sheet missing a required column or with no usable rows is an error.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::auction::player::{Player, Role};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} is missing the '{column}' column")]
    MissingColumn { path: String, column: &'static str },

    #[error("validation error: {0}")]
    Validation(String),
}

const REQUIRED_COLUMNS: [&str; 3] = ["name", "role", "rating"];

// ---------------------------------------------------------------------------
// Raw CSV row
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    name: String,
    role: String,
    /// Some sheets export ratings as decimals ("88.0").
    rating: f64,
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Load the player pool from a CSV file.
pub fn load_players(path: &Path) -> Result<Vec<Player>, PoolError> {
    let shown = path.display().to_string();
    let file = File::open(path).map_err(|source| PoolError::Io {
        path: shown.clone(),
        source,
    })?;
    let players = parse_players(file, &shown)?;
    info!("Loaded {} players from {}", players.len(), shown);
    Ok(players)
}

/// Parse a player sheet from any reader. Bad rows are skipped with a
/// warning; missing columns and an empty result are errors.
pub fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, PoolError> {
    parse_players(rdr, "<reader>")
}

fn parse_players<R: Read>(rdr: R, source_name: &str) -> Result<Vec<Player>, PoolError> {
    let csv_err = |source| PoolError::Csv {
        path: source_name.to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);

    let headers: csv::StringRecord = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();
    if let Some(column) = REQUIRED_COLUMNS
        .into_iter()
        .find(|c| !headers.iter().any(|h| h == *c))
    {
        return Err(PoolError::MissingColumn {
            path: source_name.to_string(),
            column,
        });
    }
    reader.set_headers(headers);

    let mut seen = HashSet::new();
    let mut players = Vec::new();
    for result in reader.deserialize::<RawPlayerRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };

        let name = raw.name.trim();
        if name.is_empty() {
            warn!("skipping player row with empty name");
            continue;
        }
        let Some(role) = Role::from_str_role(&raw.role) else {
            warn!("skipping player '{}': unknown role '{}'", name, raw.role);
            continue;
        };
        if !raw.rating.is_finite() || raw.rating < 0.0 {
            warn!("skipping player '{}': invalid rating {}", name, raw.rating);
            continue;
        }
        if !seen.insert(name.to_string()) {
            warn!("skipping duplicate player '{}'", name);
            continue;
        }

        players.push(Player::new(name, role, raw.rating.round() as u32));
    }

    if players.is_empty() {
        return Err(PoolError::Validation(format!(
            "player sheet {source_name} produced zero valid rows"
        )));
    }
    Ok(players)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_basic_sheet() {
        let csv = "name,role,rating\n\
                   Player A,Batsman,88\n\
                   Player B,Bowler,84\n\
                   Player C,All-Rounder,92\n";
        let players = load_players_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(players.len(), 3);
        assert_eq!(players[0], Player::new("Player A", Role::Batsman, 88));
        assert_eq!(players[2].role, Role::AllRounder);
    }

    #[test]
    fn headers_are_case_insensitive_and_extra_columns_ignored() {
        let csv = "Team,Name,Rating,Role\n\
                   CSK, Player D ,80.4,Wicketkeeper\n";
        let players = load_players_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(players, vec![Player::new("Player D", Role::Wicketkeeper, 80)]);
    }

    #[test]
    fn skips_bad_rows() {
        let csv = "name,role,rating\n\
                   Good,Batsman,70\n\
                   BadRating,Batsman,abc\n\
                   BadRole,Umpire,70\n\
                   ,Bowler,70\n\
                   Negative,Bowler,-3\n\
                   Good,Bowler,99\n\
                   Also Good,WK,65\n";
        let players = load_players_from_reader(csv.as_bytes()).unwrap();
        let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Good", "Also Good"]);
        // First occurrence of a duplicate wins.
        assert_eq!(players[0].role, Role::Batsman);
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "name,rating\nPlayer A,88\nPlayer B,84\n";
        let err = load_players_from_reader(csv.as_bytes()).unwrap_err();
        match err {
            PoolError::MissingColumn { column, .. } => assert_eq!(column, "role"),
            other => panic!("expected MissingColumn, got: {other}"),
        }
    }

    #[test]
    fn sheet_without_usable_rows_is_an_error() {
        let csv = "name,role,rating\nBadRole,Umpire,70\n,Bowler,70\n";
        let err = load_players_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, PoolError::Validation(_)));

        let header_only = "Name,Role,Rating\n";
        let err = load_players_from_reader(header_only.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("zero valid rows"));
    }

    #[test]
    fn load_players_reports_path_for_missing_column() {
        let dir = std::env::temp_dir().join("bidwicket_pool_missing_column");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("players.csv");
        std::fs::write(&path, "name,role\nPlayer A,Batsman\n").unwrap();

        let err = load_players(&path).unwrap_err();
        assert!(err.to_string().contains("players.csv"));
        assert!(err.to_string().contains("'rating'"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn loads_fixture_file() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/players.csv");
        let players = load_players(&path).unwrap();
        assert_eq!(players.len(), 8);
        assert!(players.iter().any(|p| p.name == "Player C" && p.rating == 92));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_players(Path::new("/definitely/not/here.csv")).unwrap_err();
        match err {
            PoolError::Io { path, .. } => assert!(path.ends_with("here.csv")),
            other => panic!("expected Io error, got: {other}"),
        }
    }
}
