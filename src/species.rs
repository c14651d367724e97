use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString};

/// Swim-performance guild, used when speeds come from the categorical
/// column instead of the measured one.
#[derive(Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash)]
#[strum(ascii_case_insensitive)]
pub enum Guild {
    Strong,
    Moderate,
    Weak,
}

impl Guild {
    /// Relative swim speed assigned to the guild.
    pub fn swim_speed(&self) -> f64 {
        match self {
            Self::Strong => 1.0,
            Self::Moderate => 0.7,
            Self::Weak => 0.4,
        }
    }
}

/// One species to be clustered: a scalar swim speed plus a 0/1 presence
/// vector over the watershed columns of the distribution matrix.
#[derive(Debug, Clone, Serialize)]
pub struct Species {
    pub id: String,
    pub speed: f64,
    pub distribution: Vec<u8>,
}

impl Species {
    pub fn new(id: impl Into<String>, speed: f64, distribution: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            speed,
            distribution,
        }
    }

    /// Number of watersheds the species is present in.
    pub fn presence_count(&self) -> usize {
        self.distribution.iter().filter(|&&b| b == 1).count()
    }
}

/// Joined dataset: species rows plus the watershed names their
/// distribution bits index.
#[derive(Debug, Clone)]
pub struct SpeciesData {
    pub species: Vec<Species>,
    pub watersheds: Vec<String>,
}
