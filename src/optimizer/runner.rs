use super::individual::{crossover, Individual};
use super::Optimizer;
use crate::config::GaParams;
use crate::error::{GfResult, GuildForgeError};
use fastrand::Rng;
use serde::Serialize;
use tracing::{debug, info};

/// One visited point of the outer cluster-count search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub n_clusters: usize,
    pub fitness: f64,
    pub score: f64,
}

/// Outcome of the outer search: the winning candidate, its cluster
/// count, and every (count, fitness, adjusted score) point visited.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub best: Individual,
    pub n_clusters: usize,
    pub trajectory: Vec<TrajectoryPoint>,
}

impl Optimizer {
    /// Evolves clusterings at the fixed count `params.n_clusters` and
    /// returns the fittest candidate of the final generation.
    pub fn optimize_clusters(&self, params: &GaParams, rng: &mut Rng) -> GfResult<Individual> {
        params.validate(self.n_species())?;
        let objective = self.resolve_objective(params)?;

        let popsize = params.popsize;
        let n_elite = (params.elite * popsize as f64).round() as usize;
        let speed_step = (self.max_speed - self.min_speed) * params.mutate_speed;

        let mut population = self.initialize_population(&objective, params, rng);
        let mut generation = 0usize;

        loop {
            let fit_order = ascending_fitness_order(&population);
            let best = population[fit_order[popsize - 1]].fitness;
            debug!(
                "Generation {}. Best: {:.2}. Median: {:.2}",
                generation,
                best,
                median_fitness(&population, &fit_order)
            );

            // rank 1 = worst, popsize = best
            let mut ranks = vec![0usize; popsize];
            for (position, &idx) in fit_order.iter().enumerate() {
                ranks[idx] = position + 1;
            }

            let mut next_gen: Vec<Individual> = Vec::with_capacity(popsize);
            for &idx in &fit_order[popsize - n_elite..] {
                next_gen.push(population[idx].clone());
            }

            while next_gen.len() < popsize {
                let (p1, p2) = select_parents(&ranks, rng);
                let parent1 = &population[p1];

                let migrant;
                let parent2 = if rng.f64() < params.migration {
                    migrant = self.random_individual(&objective, params.n_clusters, rng);
                    &migrant
                } else {
                    &population[p2]
                };

                let mut offspring = crossover(parent1, parent2, params.crossrate, rng);
                offspring.mutate(speed_step, params.mutate_distro, rng);
                objective.evaluate(&self.species, &mut offspring);

                if offspring.fitness >= parent1.fitness || rng.f64() < params.keepworse {
                    next_gen.push(offspring);
                }
            }

            generation += 1;
            if generation == params.generations {
                debug!("Generation budget exhausted at {}", generation);
                population = next_gen;
                break;
            }
            if let Some(cv) = fitness_cv(&next_gen) {
                if cv < params.stopcv {
                    debug!("Converged after {} generations (cv {:.6})", generation, cv);
                    population = next_gen;
                    break;
                }
            }
            population = next_gen;
        }

        Ok(best_of(population))
    }

    /// Searches cluster counts from 1 upward. Each count gets a full
    /// generational run; the first drop in the parsimony-adjusted score
    /// ends the search and the previous count wins. Greedy single pass.
    /// `params.n_clusters` is ignored here; the loop sets it.
    pub fn optimize_cluster_count(
        &self,
        params: &GaParams,
        rng: &mut Rng,
    ) -> GfResult<SearchResult> {
        let discount = params.resolved_discount(self.n_species());
        let total_weight = params.discount_weight * discount;

        let mut previous: Option<(Individual, usize)> = None;
        let mut previous_score = f64::NEG_INFINITY;
        let mut current: Option<(Individual, usize)> = None;
        let mut current_score = f64::NEG_INFINITY;
        let mut trajectory: Vec<TrajectoryPoint> = Vec::new();

        for n in 1..=self.n_species() {
            if previous_score > current_score {
                if let Some((best, n_clusters)) = previous {
                    info!("🏆 Adjusted score dropped; keeping {} clusters", n_clusters);
                    return Ok(SearchResult {
                        best,
                        n_clusters,
                        trajectory,
                    });
                }
            }
            previous = current.take();
            previous_score = current_score;

            let mut run_params = params.clone();
            run_params.n_clusters = n;
            let best = self.optimize_clusters(&run_params, rng)?;
            current_score = best.fitness - total_weight * n as f64;
            info!(
                "➡️  {} cluster(s) | fitness {:.4} | adjusted score {:.4}",
                n, best.fitness, current_score
            );
            trajectory.push(TrajectoryPoint {
                n_clusters: n,
                fitness: best.fitness,
                score: current_score,
            });
            current = Some((best, n));
        }

        // The score never dropped; the last count evaluated stands.
        match current {
            Some((best, n_clusters)) => Ok(SearchResult {
                best,
                n_clusters,
                trajectory,
            }),
            None => Err(GuildForgeError::Validation(
                "cluster count search visited no counts".to_string(),
            )),
        }
    }
}

/// Indices of `population` ordered by ascending fitness.
fn ascending_fitness_order(population: &[Individual]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..population.len()).collect();
    order.sort_by(|&a, &b| {
        population[a]
            .fitness
            .partial_cmp(&population[b].fitness)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

fn median_fitness(population: &[Individual], fit_order: &[usize]) -> f64 {
    let n = fit_order.len();
    let lo = population[fit_order[(n - 1) / 2]].fitness;
    let hi = population[fit_order[n / 2]].fitness;
    (lo + hi) / 2.0
}

/// Rank-weighted stochastic selection: one uniform draw per candidate,
/// multiplied by its rank; the largest product becomes parent 2 and the
/// runner-up parent 1. Ties keep the earlier candidate.
fn select_parents(ranks: &[usize], rng: &mut Rng) -> (usize, usize) {
    let mut top = 0usize;
    let mut top_product = f64::NEG_INFINITY;
    let mut second = 0usize;
    let mut second_product = f64::NEG_INFINITY;

    for (i, &rank) in ranks.iter().enumerate() {
        let product = rng.f64() * rank as f64;
        if product > top_product {
            second = top;
            second_product = top_product;
            top = i;
            top_product = product;
        } else if product > second_product {
            second = i;
            second_product = product;
        }
    }
    (second, top)
}

/// Coefficient of variation of population fitness (population standard
/// deviation over mean). None when the mean is too close to zero for
/// the division to mean anything; callers treat that as not converged.
fn fitness_cv(population: &[Individual]) -> Option<f64> {
    let n = population.len() as f64;
    let mean = population.iter().map(|ind| ind.fitness).sum::<f64>() / n;
    if mean.abs() < f64::EPSILON {
        return None;
    }
    let variance = population
        .iter()
        .map(|ind| {
            let d = ind.fitness - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    Some(variance.sqrt() / mean)
}

/// Fittest member, first-encountered on ties.
fn best_of(mut population: Vec<Individual>) -> Individual {
    let mut best = population.remove(0);
    for individual in population {
        if individual.fitness > best.fitness {
            best = individual;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::individual::Cluster;

    fn individual_with_fitness(fitness: f64) -> Individual {
        Individual {
            clusters: vec![Cluster {
                speed: 0.0,
                watersheds: vec![0],
            }],
            assignments: Vec::new(),
            fitness,
        }
    }

    #[test]
    fn test_ascending_fitness_order() {
        let pop: Vec<Individual> = [3.0, 1.0, 2.0]
            .iter()
            .map(|&f| individual_with_fitness(f))
            .collect();
        assert_eq!(ascending_fitness_order(&pop), vec![1, 2, 0]);
    }

    #[test]
    fn test_median_fitness_even_population() {
        let pop: Vec<Individual> = [4.0, 1.0, 3.0, 2.0]
            .iter()
            .map(|&f| individual_with_fitness(f))
            .collect();
        let order = ascending_fitness_order(&pop);
        assert_eq!(median_fitness(&pop, &order), 2.5);
    }

    #[test]
    fn test_select_parents_returns_distinct_indices() {
        let ranks = vec![1, 2, 3, 4, 5];
        let mut rng = Rng::with_seed(99);
        for _ in 0..100 {
            let (p1, p2) = select_parents(&ranks, &mut rng);
            assert_ne!(p1, p2);
            assert!(p1 < ranks.len() && p2 < ranks.len());
        }
    }

    #[test]
    fn test_fitness_cv_of_uniform_population_is_zero() {
        let pop: Vec<Individual> = (0..4).map(|_| individual_with_fitness(2.0)).collect();
        assert_eq!(fitness_cv(&pop), Some(0.0));
    }

    #[test]
    fn test_fitness_cv_guards_zero_mean() {
        let pop: Vec<Individual> = [1.0, -1.0]
            .iter()
            .map(|&f| individual_with_fitness(f))
            .collect();
        assert_eq!(fitness_cv(&pop), None);
    }

    #[test]
    fn test_best_of_takes_first_on_ties() {
        let mut first = individual_with_fitness(5.0);
        first.clusters[0].speed = 1.0;
        let mut twin = individual_with_fitness(5.0);
        twin.clusters[0].speed = 2.0;
        let best = best_of(vec![first.clone(), twin]);
        assert_eq!(best, first);
    }
}
