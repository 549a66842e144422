// Cluster assignment — maps reduced vectors onto the fitted topic clusters.

pub mod kmeans;
pub mod traits;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one fitted cluster. The set of ids is closed: it is fixed
/// when the cluster model is fitted and never grows at inference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub u32);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ClusterId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ClusterId)
    }
}
