use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Trust classification of a value returned by a device.
///
/// Ordered by trust: `Good > Uncertain > Bad`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DataQuality {
    /// Value is fresh and trustworthy
    #[default]
    Good,
    /// Value is present but stale, out of range, or read over a degraded link
    Uncertain,
    /// Value is absent or untrustworthy
    Bad,
}

impl DataQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Uncertain => "uncertain",
            Self::Bad => "bad",
        }
    }

    /// Good and Uncertain values may be consumed; Bad ones may not.
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Bad)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Bad => 0,
            Self::Uncertain => 1,
            Self::Good => 2,
        }
    }

    /// The least trusted of two qualities.
    pub fn worst(self, other: Self) -> Self {
        self.min(other)
    }
}

impl PartialOrd for DataQuality {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataQuality {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for DataQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
