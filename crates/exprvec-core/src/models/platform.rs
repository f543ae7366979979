use serde::{Deserialize, Serialize};

use super::ids::{PlatformId, ProbeId};

/// Measurement technology of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnologyType {
    OneColor,
    TwoColor,
    DualMode,
    Sequencing,
    GeneList,
}

impl TechnologyType {
    /// Two-channel technologies carry a separately computed missing-value
    /// (presence/absence) matrix that must be merged into the signal.
    pub fn is_two_channel(self) -> bool {
        matches!(self, TechnologyType::TwoColor | TechnologyType::DualMode)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TechnologyType::OneColor => "one_color",
            TechnologyType::TwoColor => "two_color",
            TechnologyType::DualMode => "dual_mode",
            TechnologyType::Sequencing => "sequencing",
            TechnologyType::GeneList => "gene_list",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one_color" => Some(TechnologyType::OneColor),
            "two_color" => Some(TechnologyType::TwoColor),
            "dual_mode" => Some(TechnologyType::DualMode),
            "sequencing" => Some(TechnologyType::Sequencing),
            "gene_list" => Some(TechnologyType::GeneList),
            _ => None,
        }
    }
}

/// An array design. `technology` is `None` until curated; rebuilding an
/// experiment on an unclassified platform is a configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: PlatformId,
    pub short_name: String,
    pub technology: Option<TechnologyType>,
}

/// A design element on a platform. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probe {
    pub id: ProbeId,
    pub platform: PlatformId,
    pub name: String,
}
