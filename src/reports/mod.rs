use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use guildforge::config::GaParams;
use guildforge::error::GfResult;
use guildforge::optimizer::{Cluster, Individual, SearchResult, TrajectoryPoint};
use guildforge::species::Species;
use serde::Serialize;
use std::fs::File;

/// One row per cluster: representative speed, member and watershed
/// counts, and the member species ids.
pub fn print_cluster_table(species: &[Species], individual: &Individual) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Cluster").add_attribute(Attribute::Bold),
        Cell::new("Speed").fg(Color::Cyan),
        Cell::new("Species"),
        Cell::new("Watersheds"),
        Cell::new("Members").add_attribute(Attribute::Bold),
    ]);

    for (index, cluster) in individual.clusters.iter().enumerate() {
        let members: Vec<&str> = species
            .iter()
            .zip(&individual.assignments)
            .filter(|(_, a)| a.cluster == index)
            .map(|(sp, _)| sp.id.as_str())
            .collect();
        let n_watersheds = cluster.watersheds.iter().filter(|&&b| b == 1).count();

        table.add_row(vec![
            Cell::new(index),
            Cell::new(format!("{:.3}", cluster.speed)),
            Cell::new(members.len()),
            Cell::new(n_watersheds),
            Cell::new(members.join(", ")),
        ]);
    }

    for i in 0..=3 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    println!("\nFitness: {:.4}", individual.fitness);
    println!("{}", table);
}

/// One row per visited cluster count; the winning count is highlighted.
pub fn print_trajectory_table(points: &[TrajectoryPoint], winner: usize) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    table.add_row(vec![
        Cell::new("Clusters").add_attribute(Attribute::Bold),
        Cell::new("Fitness"),
        Cell::new("Adjusted Score").fg(Color::Cyan),
    ]);

    for point in points {
        let mut cells = vec![
            Cell::new(point.n_clusters),
            Cell::new(format!("{:.4}", point.fitness)),
            Cell::new(format!("{:.4}", point.score)),
        ];
        if point.n_clusters == winner {
            cells = cells.into_iter().map(|c| c.fg(Color::Green)).collect();
        }
        table.add_row(cells);
    }

    for i in 0..=2 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    println!("{}", table);
}

/// Writes cluster rows as CSV, one block per entry. `Species` is the
/// comma-joined member ids; `Watersheds` the comma-joined names of
/// watersheds where the cluster bit is set.
pub fn write_clusters_csv(
    path: &str,
    species: &[Species],
    watersheds: &[String],
    blocks: &[(usize, &Individual)],
) -> GfResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["# Clusters", "Cluster", "Speed", "Species", "Watersheds"])?;

    for (n_clusters, individual) in blocks {
        for (index, cluster) in individual.clusters.iter().enumerate() {
            let members: Vec<&str> = species
                .iter()
                .zip(&individual.assignments)
                .filter(|(_, a)| a.cluster == index)
                .map(|(sp, _)| sp.id.as_str())
                .collect();
            let present: Vec<&str> = cluster
                .watersheds
                .iter()
                .zip(watersheds)
                .filter(|(&b, _)| b == 1)
                .map(|(_, name)| name.as_str())
                .collect();

            wtr.write_record(&[
                n_clusters.to_string(),
                index.to_string(),
                cluster.speed.to_string(),
                members.join(","),
                present.join(","),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentRecord<'a> {
    species: &'a str,
    cluster: usize,
    speed_error: f64,
    distro_fit: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchReport<'a> {
    params: &'a GaParams,
    n_clusters: usize,
    fitness: f64,
    clusters: &'a [Cluster],
    assignments: Vec<AssignmentRecord<'a>>,
    trajectory: &'a [TrajectoryPoint],
}

/// Full machine-readable record of a search run.
pub fn write_json_report(
    path: &str,
    params: &GaParams,
    species: &[Species],
    result: &SearchResult,
) -> GfResult<()> {
    let assignments = species
        .iter()
        .zip(&result.best.assignments)
        .map(|(sp, a)| AssignmentRecord {
            species: &sp.id,
            cluster: a.cluster,
            speed_error: a.speed_error,
            distro_fit: a.distro_fit,
        })
        .collect();

    let report = SearchReport {
        params,
        n_clusters: result.n_clusters,
        fitness: result.best.fitness,
        clusters: &result.best.clusters,
        assignments,
        trajectory: &result.trajectory,
    };

    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &report)?;
    Ok(())
}
