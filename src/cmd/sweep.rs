use crate::reports;
use clap::Args;
use guildforge::config::GaParams;
use guildforge::error::{GfResult, GuildForgeError};
use guildforge::optimizer::{Individual, Optimizer, TrajectoryPoint};
use guildforge::species::SpeciesData;
use std::cmp::Ordering;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub params: GaParams,

    /// Lowest cluster count to run.
    #[arg(long, default_value_t = 1)]
    pub min_clusters: usize,

    /// Highest cluster count to run; species count when absent.
    #[arg(long)]
    pub max_clusters: Option<usize>,

    /// Write every count's clusters as CSV, one block per count.
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Runs the generational loop for every cluster count in the range, with
/// no early stop. Useful for inspecting the whole fitness/score curve.
pub fn run(
    args: &SweepArgs,
    params: &GaParams,
    data: &SpeciesData,
    seed: Option<u64>,
) -> GfResult<()> {
    let optimizer = Optimizer::new(data.species.clone())?;
    let max_clusters = args.max_clusters.unwrap_or(optimizer.n_species());
    if args.min_clusters < 1
        || max_clusters > optimizer.n_species()
        || args.min_clusters > max_clusters
    {
        return Err(GuildForgeError::Config(format!(
            "cluster range [{}, {}] is invalid for {} species",
            args.min_clusters,
            max_clusters,
            optimizer.n_species()
        )));
    }

    let mut rng = match seed {
        Some(s) => fastrand::Rng::with_seed(s),
        None => fastrand::Rng::new(),
    };
    let total_weight = params.discount_weight * params.resolved_discount(optimizer.n_species());

    info!(
        "🔎 Sweeping cluster counts {}..={}",
        args.min_clusters, max_clusters
    );

    let mut results: Vec<(usize, Individual)> = Vec::new();
    let mut summary: Vec<TrajectoryPoint> = Vec::new();
    for n in args.min_clusters..=max_clusters {
        let mut run_params = params.clone();
        run_params.n_clusters = n;
        let best = optimizer.optimize_clusters(&run_params, &mut rng)?;
        info!("➡️  {} cluster(s) | fitness {:.4}", n, best.fitness);
        summary.push(TrajectoryPoint {
            n_clusters: n,
            fitness: best.fitness,
            score: best.fitness - total_weight * n as f64,
        });
        results.push((n, best));
    }

    let winner = summary
        .iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal))
        .map(|point| point.n_clusters)
        .unwrap_or(args.min_clusters);

    reports::print_trajectory_table(&summary, winner);
    if let Some((_, best)) = results.iter().find(|(n, _)| *n == winner) {
        info!("🏆 Best adjusted score at {} cluster(s)", winner);
        reports::print_cluster_table(optimizer.species(), best);
    }

    if let Some(path) = &args.output {
        let blocks: Vec<(usize, &Individual)> =
            results.iter().map(|(n, ind)| (*n, ind)).collect();
        reports::write_clusters_csv(path, optimizer.species(), &data.watersheds, &blocks)?;
        info!("Wrote clusters to {}", path);
    }

    Ok(())
}
