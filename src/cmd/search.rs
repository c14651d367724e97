use crate::reports;
use clap::Args;
use guildforge::config::GaParams;
use guildforge::error::GfResult;
use guildforge::optimizer::Optimizer;
use guildforge::species::SpeciesData;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub params: GaParams,

    /// Write the winning clusters as CSV.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write a full JSON report (params, clusters, assignments, trajectory).
    #[arg(long)]
    pub json: Option<String>,
}

pub fn run(
    args: &SearchArgs,
    params: &GaParams,
    data: &SpeciesData,
    seed: Option<u64>,
) -> GfResult<()> {
    let optimizer = Optimizer::new(data.species.clone())?;
    let mut rng = match seed {
        Some(s) => fastrand::Rng::with_seed(s),
        None => fastrand::Rng::new(),
    };

    let result = optimizer.optimize_cluster_count(params, &mut rng)?;

    info!(
        "🏆 Best partition: {} cluster(s), fitness {:.4}",
        result.n_clusters, result.best.fitness
    );
    reports::print_trajectory_table(&result.trajectory, result.n_clusters);
    reports::print_cluster_table(optimizer.species(), &result.best);

    if let Some(path) = &args.output {
        reports::write_clusters_csv(
            path,
            optimizer.species(),
            &data.watersheds,
            &[(result.n_clusters, &result.best)],
        )?;
        info!("Wrote clusters to {}", path);
    }
    if let Some(path) = &args.json {
        reports::write_json_report(path, params, optimizer.species(), &result)?;
        info!("Wrote JSON report to {}", path);
    }

    Ok(())
}
