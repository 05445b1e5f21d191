use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Why a snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotReason {
    PlayerDeath,
    Restoration,
}

impl SnapshotReason {
    pub const ALL: [SnapshotReason; 2] = [SnapshotReason::PlayerDeath, SnapshotReason::Restoration];

    /// Human readable label shown next to a snapshot.
    pub fn label(&self) -> &'static str {
        match self {
            SnapshotReason::PlayerDeath => "Player died",
            SnapshotReason::Restoration => "Inventory restored",
        }
    }

    /// Stable name persisted in the `reason` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotReason::PlayerDeath => "PLAYER_DEATH",
            SnapshotReason::Restoration => "RESTORATION",
        }
    }
}

impl fmt::Display for SnapshotReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown snapshot reason '{0}'")]
pub struct UnknownReason(pub String);

impl FromStr for SnapshotReason {
    type Err = UnknownReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SnapshotReason::ALL
            .into_iter()
            .find(|reason| reason.as_str() == s)
            .ok_or_else(|| UnknownReason(s.to_string()))
    }
}
