//! Algorithm selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use verity_core::errors::InferenceError;

/// Every estimator this crate can run, by its stable kebab-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    DawidSkene,
    FastDawidSkene,
    HybridDawidSkene,
    Catd,
    Crh,
    #[serde(rename = "zencrowd")]
    ZenCrowd,
    CrowdtruthClosed,
    CrowdtruthOpen,
    Majority,
    AdaptiveMajority,
}

impl Algorithm {
    pub const ALL: [Algorithm; 10] = [
        Algorithm::DawidSkene,
        Algorithm::FastDawidSkene,
        Algorithm::HybridDawidSkene,
        Algorithm::Catd,
        Algorithm::Crh,
        Algorithm::ZenCrowd,
        Algorithm::CrowdtruthClosed,
        Algorithm::CrowdtruthOpen,
        Algorithm::Majority,
        Algorithm::AdaptiveMajority,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DawidSkene => "dawid-skene",
            Self::FastDawidSkene => "fast-dawid-skene",
            Self::HybridDawidSkene => "hybrid-dawid-skene",
            Self::Catd => "catd",
            Self::Crh => "crh",
            Self::ZenCrowd => "zencrowd",
            Self::CrowdtruthClosed => "crowdtruth-closed",
            Self::CrowdtruthOpen => "crowdtruth-open",
            Self::Majority => "majority",
            Self::AdaptiveMajority => "adaptive-majority",
        }
    }

    /// Whether the output carries per-choice probabilities that sum to 1.
    pub fn is_probabilistic(&self) -> bool {
        matches!(
            self,
            Self::DawidSkene | Self::FastDawidSkene | Self::HybridDawidSkene | Self::ZenCrowd
        )
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = InferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or(InferenceError::UnknownAlgorithm {
                name: s.to_string(),
            })
    }
}
