use fastrand::Rng;
use serde::Serialize;

/// One candidate group: a representative speed plus a 0/1 presence
/// vector over the watersheds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub speed: f64,
    pub watersheds: Vec<u8>,
}

impl Cluster {
    pub fn random(n_watersheds: usize, min_speed: f64, max_speed: f64, rng: &mut Rng) -> Self {
        let speed = min_speed + rng.f64() * (max_speed - min_speed);
        let watersheds = (0..n_watersheds).map(|_| u8::from(rng.bool())).collect();
        Self { speed, watersheds }
    }

    /// Nudges the speed by at most `speed_step` in a random direction
    /// (one draw in three leaves it untouched) and flips each presence
    /// bit independently with probability `flip_rate`.
    pub fn mutate(&mut self, speed_step: f64, flip_rate: f64, rng: &mut Rng) {
        let direction = rng.i32(-1..2) as f64;
        self.speed += speed_step * direction * rng.f64();
        for bit in &mut self.watersheds {
            if rng.f64() < flip_rate {
                *bit ^= 1;
            }
        }
    }
}

/// Where one species landed: the winning cluster index and the two
/// error terms of that fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assignment {
    pub cluster: usize,
    pub speed_error: f64,
    pub distro_fit: f64,
}

/// One full clustering solution. `assignments` runs parallel to the
/// optimizer's species list; `fitness` is NEG_INFINITY until the
/// candidate has been evaluated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Individual {
    pub clusters: Vec<Cluster>,
    pub assignments: Vec<Assignment>,
    pub fitness: f64,
}

impl Individual {
    pub fn random(
        n_clusters: usize,
        n_watersheds: usize,
        min_speed: f64,
        max_speed: f64,
        rng: &mut Rng,
    ) -> Self {
        let clusters = (0..n_clusters)
            .map(|_| Cluster::random(n_watersheds, min_speed, max_speed, rng))
            .collect();
        Self {
            clusters,
            assignments: Vec::new(),
            fitness: f64::NEG_INFINITY,
        }
    }

    /// Structural copy: clusters are deep-cloned, assignments and fitness
    /// are dropped. They are re-derived after any structural change.
    pub fn structural_clone(&self) -> Self {
        Self {
            clusters: self.clusters.clone(),
            assignments: Vec::new(),
            fitness: f64::NEG_INFINITY,
        }
    }

    /// Mutates every cluster in place. Invalidates assignments and
    /// fitness; the caller re-evaluates.
    pub fn mutate(&mut self, speed_step: f64, flip_rate: f64, rng: &mut Rng) {
        for cluster in &mut self.clusters {
            cluster.mutate(speed_step, flip_rate, rng);
        }
    }
}

/// Uniform cluster-level crossover. A single gate draw decides whether
/// any swapping happens at all; when it fires, each position takes
/// parent 2's cluster on an independent coin flip. The offspring starts
/// as a structural copy of parent 1 and carries no assignments.
pub fn crossover(
    parent1: &Individual,
    parent2: &Individual,
    crossrate: f64,
    rng: &mut Rng,
) -> Individual {
    let mut child = parent1.structural_clone();
    if rng.f64() < crossrate {
        for (position, cluster) in child.clusters.iter_mut().enumerate() {
            if rng.f64() < 0.5 {
                *cluster = parent2.clusters[position].clone();
            }
        }
    }
    child
}
