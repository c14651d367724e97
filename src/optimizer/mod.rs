pub mod individual;
pub mod objective;
pub mod runner;

pub use individual::{crossover, Assignment, Cluster, Individual};
pub use objective::Objective;
pub use runner::{SearchResult, TrajectoryPoint};

use crate::config::GaParams;
use crate::error::{GfResult, GuildForgeError};
use crate::species::Species;
use fastrand::Rng;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Owns the species list and the constants derived from it once at
/// construction. Read-only afterwards; runs borrow it freely.
pub struct Optimizer {
    species: Vec<Species>,
    n_watersheds: usize,
    min_speed: f64,
    max_speed: f64,
    norm_speed: f64,
    norm_distro: f64,
}

impl Optimizer {
    pub fn new(species: Vec<Species>) -> GfResult<Self> {
        if species.is_empty() {
            return Err(GuildForgeError::Validation(
                "species list is empty".to_string(),
            ));
        }

        let n_watersheds = species[0].distribution.len();
        let mut min_speed = f64::INFINITY;
        let mut max_speed = f64::NEG_INFINITY;
        let mut norm_speed = 0.0;
        for sp in &species {
            if sp.distribution.len() != n_watersheds {
                return Err(GuildForgeError::Validation(format!(
                    "species '{}' has {} presence entries, expected {}",
                    sp.id,
                    sp.distribution.len(),
                    n_watersheds
                )));
            }
            if sp.distribution.iter().any(|&b| b > 1) {
                return Err(GuildForgeError::Validation(format!(
                    "species '{}' has a presence value outside 0/1",
                    sp.id
                )));
            }
            min_speed = min_speed.min(sp.speed);
            max_speed = max_speed.max(sp.speed);
            norm_speed += sp.speed * sp.speed;
        }
        let norm_distro = (species.len() * n_watersheds) as f64;

        Ok(Self {
            species,
            n_watersheds,
            min_speed,
            max_speed,
            norm_speed,
            norm_distro,
        })
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    pub fn n_watersheds(&self) -> usize {
        self.n_watersheds
    }

    pub fn speed_range(&self) -> (f64, f64) {
        (self.min_speed, self.max_speed)
    }

    pub(crate) fn resolve_objective(&self, params: &GaParams) -> GfResult<Objective> {
        Objective::resolve(params, self.norm_speed, self.norm_distro)
    }

    /// Fresh random candidate, assigned and evaluated.
    pub fn random_individual(
        &self,
        objective: &Objective,
        n_clusters: usize,
        rng: &mut Rng,
    ) -> Individual {
        let mut individual = Individual::random(
            n_clusters,
            self.n_watersheds,
            self.min_speed,
            self.max_speed,
            rng,
        );
        objective.evaluate(&self.species, &mut individual);
        individual
    }

    /// Draws `init_size` random candidates and keeps the best `popsize`,
    /// sorted best-first. Construction is parallel; per-draw seeds are
    /// taken from the run RNG up front so the result does not depend on
    /// thread scheduling.
    pub(crate) fn initialize_population(
        &self,
        objective: &Objective,
        params: &GaParams,
        rng: &mut Rng,
    ) -> Vec<Individual> {
        let seeds: Vec<u64> = (0..params.init_size).map(|_| rng.u64(..)).collect();
        let mut pool: Vec<Individual> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut local = Rng::with_seed(seed);
                self.random_individual(objective, params.n_clusters, &mut local)
            })
            .collect();

        pool.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap_or(Ordering::Equal));
        pool.truncate(params.popsize);
        pool
    }
}
