use crate::error::{GfResult, GuildForgeError};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// All knobs of the genetic search. Defaults here and in the clap
/// attributes must stay in sync; a JSON parameter file may override any
/// subset, and explicit CLI flags win over the file.
#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaParams {
    // === Operators ===
    #[arg(long, default_value_t = 0.01)]
    pub mutate_speed: f64,
    #[arg(long, default_value_t = 0.01)]
    pub mutate_distro: f64,
    #[arg(long, default_value_t = 0.7)]
    pub crossrate: f64,
    #[arg(long, default_value_t = 0.01)]
    pub migration: f64,

    // === Objective ===
    #[arg(long, default_value_t = 1.0)]
    pub weight_speed: f64,
    #[arg(long, default_value_t = 1.0)]
    pub weight_distro: f64,

    // Normalizer overrides; derived from the data when absent.
    #[arg(long)]
    pub norm_speed: Option<f64>,
    #[arg(long)]
    pub norm_distro: Option<f64>,

    // === Population ===
    #[arg(long, default_value_t = 20)]
    pub popsize: usize,
    #[arg(long, default_value_t = 1000)]
    pub init_size: usize,
    #[arg(long, default_value_t = 1)]
    pub n_clusters: usize,
    #[arg(long, default_value_t = 0.1)]
    pub elite: f64,
    #[arg(long, default_value_t = 0.05)]
    pub keepworse: f64,

    // === Termination ===
    #[arg(long, default_value_t = 1000)]
    pub generations: usize,
    #[arg(long, default_value_t = 0.0001)]
    pub stopcv: f64,

    // === Parsimony (outer search) ===
    #[arg(long, default_value_t = 1.0)]
    pub discount_weight: f64,

    // Per-cluster discount; 1 / species count when absent.
    #[arg(long)]
    pub discount: Option<f64>,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            mutate_speed: 0.01,
            mutate_distro: 0.01,
            crossrate: 0.7,
            migration: 0.01,
            weight_speed: 1.0,
            weight_distro: 1.0,
            norm_speed: None,
            norm_distro: None,
            popsize: 20,
            init_size: 1000,
            n_clusters: 1,
            elite: 0.1,
            keepworse: 0.05,
            generations: 1000,
            stopcv: 0.0001,
            discount_weight: 1.0,
            discount: None,
        }
    }
}

impl GaParams {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GfResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overwrites fields the user set explicitly on the command line,
    /// leaving file-loaded values in place everywhere else.
    pub fn merge_from_cli(&mut self, cli_params: &GaParams, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli_params.$field.clone();
                }
            };
        }

        update_if_present!(mutate_speed);
        update_if_present!(mutate_distro);
        update_if_present!(crossrate);
        update_if_present!(migration);

        update_if_present!(weight_speed);
        update_if_present!(weight_distro);
        update_if_present!(norm_speed);
        update_if_present!(norm_distro);

        update_if_present!(popsize);
        update_if_present!(init_size);
        update_if_present!(n_clusters);
        update_if_present!(elite);
        update_if_present!(keepworse);

        update_if_present!(generations);
        update_if_present!(stopcv);

        update_if_present!(discount_weight);
        update_if_present!(discount);
    }

    /// Per-cluster parsimony discount for a dataset of the given size.
    pub fn resolved_discount(&self, n_species: usize) -> f64 {
        self.discount.unwrap_or(1.0 / n_species as f64)
    }

    /// Checks every constraint that can be judged before a run starts.
    /// Fails fast; nothing stochastic happens on a bad configuration.
    pub fn validate(&self, n_species: usize) -> GfResult<()> {
        if self.popsize < 2 {
            return Err(GuildForgeError::Config(format!(
                "popsize must be at least 2, got {} (parent selection needs two candidates)",
                self.popsize
            )));
        }
        if self.init_size < self.popsize {
            return Err(GuildForgeError::Config(format!(
                "init_size ({}) must be at least popsize ({})",
                self.init_size, self.popsize
            )));
        }
        if self.n_clusters < 1 || self.n_clusters > n_species {
            return Err(GuildForgeError::Config(format!(
                "n_clusters must be within [1, {}], got {}",
                n_species, self.n_clusters
            )));
        }
        if self.generations < 1 {
            return Err(GuildForgeError::Config(
                "generations must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("mutate_speed", self.mutate_speed),
            ("mutate_distro", self.mutate_distro),
            ("crossrate", self.crossrate),
            ("migration", self.migration),
            ("elite", self.elite),
            ("keepworse", self.keepworse),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GuildForgeError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
