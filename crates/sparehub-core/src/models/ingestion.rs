use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// How validated rows of one upload are written to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// Each row is inserted on its own; a failing row is reported and skipped.
    #[default]
    Isolated,
    /// All rows commit together or not at all.
    Transactional,
}

impl PersistMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistMode::Isolated => "isolated",
            PersistMode::Transactional => "transactional",
        }
    }
}

impl fmt::Display for PersistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersistMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "isolated" => Ok(PersistMode::Isolated),
            "transactional" | "atomic" => Ok(PersistMode::Transactional),
            other => Err(format!(
                "unknown persist mode '{}' (expected 'isolated' or 'transactional')",
                other
            )),
        }
    }
}

/// Summary of one ingestion run.
///
/// In isolated mode `success + failed == total`. In transactional mode either every
/// row succeeded or none did and `errors` holds a single aggregate message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IngestionProgress {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}
