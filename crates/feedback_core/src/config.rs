use crate::schema::AdminIdentity;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub database: DatabaseConfig,
    pub display: DisplayConfig,
    pub departments: DepartmentConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("feedback.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Districts/reporters listed per issue before collapsing into "+N others".
    pub list_limit: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { list_limit: 3 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DepartmentConfig {
    pub predefined: Vec<String>,
}

impl Default for DepartmentConfig {
    fn default() -> Self {
        Self {
            predefined: [
                "Water",
                "Sanitation",
                "Road",
                "Electricity",
                "Health",
                "Transport",
                "Safety",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl DashboardConfig {
    /// Reads a TOML config. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        info!(path = %path.display(), "loaded dashboard config");
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RosterFile {
    admins: Vec<AdminIdentity>,
}

/// Reads a YAML admin roster used to seed the identity table.
pub fn load_admin_roster(path: &Path) -> Result<Vec<AdminIdentity>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_admin_roster(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn parse_admin_roster(raw: &str) -> Result<Vec<AdminIdentity>> {
    let roster: RosterFile = serde_yaml::from_str(raw)?;
    Ok(roster.admins)
}
