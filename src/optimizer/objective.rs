use super::individual::{Assignment, Cluster, Individual};
use crate::config::GaParams;
use crate::error::{GfResult, GuildForgeError};
use crate::species::Species;

/// Scoring state resolved for one run: objective weights plus the two
/// normalizers, taken from the parameters when given and derived from
/// the data otherwise. Read-only while a run is in flight.
#[derive(Debug, Clone)]
pub struct Objective {
    pub weight_speed: f64,
    pub weight_distro: f64,
    pub norm_speed: f64,
    pub norm_distro: f64,
}

impl Objective {
    pub fn resolve(
        params: &GaParams,
        derived_norm_speed: f64,
        derived_norm_distro: f64,
    ) -> GfResult<Self> {
        let norm_speed = params.norm_speed.unwrap_or(derived_norm_speed);
        let norm_distro = params.norm_distro.unwrap_or(derived_norm_distro);
        if !(norm_speed > 0.0) {
            return Err(GuildForgeError::Config(format!(
                "norm_speed must be positive, got {}",
                norm_speed
            )));
        }
        if !(norm_distro > 0.0) {
            return Err(GuildForgeError::Config(format!(
                "norm_distro must be positive, got {}",
                norm_distro
            )));
        }
        Ok(Self {
            weight_speed: params.weight_speed,
            weight_distro: params.weight_distro,
            norm_speed,
            norm_distro,
        })
    }

    pub fn speed_error(&self, species: &Species, cluster: &Cluster) -> f64 {
        let d = species.speed - cluster.speed;
        d * d / self.norm_speed
    }

    /// Per-watershed term (1 - s - c)^2: 1 where the species and cluster
    /// bits agree, 0 where they differ.
    pub fn distro_fit(&self, species: &Species, cluster: &Cluster) -> f64 {
        let mut sum = 0.0;
        for (&s, &c) in species.distribution.iter().zip(&cluster.watersheds) {
            let d = 1.0 - f64::from(s) - f64::from(c);
            sum += d * d;
        }
        sum / self.norm_distro
    }

    /// Contribution of one assignment to the candidate fitness.
    pub fn value_of(&self, assignment: &Assignment) -> f64 {
        self.weight_distro * assignment.distro_fit - self.weight_speed * assignment.speed_error
    }

    /// Best cluster for one species, first-encountered on ties.
    pub fn assign_one(&self, species: &Species, clusters: &[Cluster]) -> Assignment {
        let mut best = self.fit(species, &clusters[0], 0);
        let mut best_value = self.value_of(&best);
        for (i, cluster) in clusters.iter().enumerate().skip(1) {
            let candidate = self.fit(species, cluster, i);
            let value = self.value_of(&candidate);
            if value > best_value {
                best = candidate;
                best_value = value;
            }
        }
        best
    }

    /// Reassigns every species to its best cluster and recomputes the
    /// fitness as the sum of assignment values. Called after any
    /// structural change to the candidate.
    pub fn evaluate(&self, species: &[Species], individual: &mut Individual) {
        individual.assignments.clear();
        individual.assignments.reserve(species.len());
        let mut fitness = 0.0;
        for sp in species {
            let assignment = self.assign_one(sp, &individual.clusters);
            fitness += self.value_of(&assignment);
            individual.assignments.push(assignment);
        }
        individual.fitness = fitness;
    }

    fn fit(&self, species: &Species, cluster: &Cluster, index: usize) -> Assignment {
        Assignment {
            cluster: index,
            speed_error: self.speed_error(species, cluster),
            distro_fit: self.distro_fit(species, cluster),
        }
    }
}
