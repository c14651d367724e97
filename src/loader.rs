use crate::error::{GfResult, GuildForgeError};
use crate::species::{Guild, Species, SpeciesData};
use clap::ValueEnum;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use strum::IntoEnumIterator;
use tracing::{info, warn};

/// Which speeds-table column supplies the species speed.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedSource {
    /// Categorical `Guild` column, mapped through the guild speed table.
    Guild,
    /// Numeric `Speed (cm/s)` column.
    Value,
}

#[derive(Debug)]
pub struct RawSpeeds {
    pub entries: Vec<(String, f64)>,
}

#[derive(Debug)]
pub struct RawDistributions {
    pub watersheds: Vec<String>,
    pub rows: Vec<(String, Vec<u8>)>,
}

/// Reads the speeds table. Rows whose selected speed field is unusable
/// are skipped with a warning; the table itself must exist and carry the
/// `Species` column plus the column the source selects.
pub fn load_speeds<P: AsRef<Path>>(path: P, source: SpeedSource) -> GfResult<RawSpeeds> {
    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(file);

    let headers = rdr.headers()?.clone();
    let find_col = |name: &str| headers.iter().position(|h| h.trim() == name);

    let species_col = find_col("Species").ok_or_else(|| {
        GuildForgeError::Validation("speeds table has no 'Species' column".to_string())
    })?;
    let (value_name, value_col) = match source {
        SpeedSource::Value => ("Speed (cm/s)", find_col("Speed (cm/s)")),
        SpeedSource::Guild => ("Guild", find_col("Guild")),
    };
    let value_col = value_col.ok_or_else(|| {
        GuildForgeError::Validation(format!("speeds table has no '{}' column", value_name))
    })?;

    let known_guilds = Guild::iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for record in rdr.records().flatten() {
        if record.len() <= species_col.max(value_col) {
            skipped += 1;
            continue;
        }
        let id = record[species_col].trim();
        if id.is_empty() {
            skipped += 1;
            continue;
        }
        let raw = record[value_col].trim();
        match source {
            SpeedSource::Guild => match Guild::from_str(raw) {
                Ok(guild) => entries.push((id.to_string(), guild.swim_speed())),
                Err(_) => {
                    skipped += 1;
                    warn!(
                        "⚠️  Unknown guild '{}' for '{}' (expected one of: {})",
                        raw, id, known_guilds
                    );
                }
            },
            SpeedSource::Value => match raw.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => entries.push((id.to_string(), v)),
                _ => {
                    skipped += 1;
                    warn!("⚠️  Unparseable speed '{}' for '{}'", raw, id);
                }
            },
        }
    }

    if skipped > 0 {
        warn!("⚠️  Skipped {} speeds row(s)", skipped);
    }
    Ok(RawSpeeds { entries })
}

/// Reads the presence matrix. The header row is an id cell followed by
/// watershed names; every record must carry exactly one 0/1 cell per
/// watershed. Shape violations are fatal.
pub fn load_distributions<P: AsRef<Path>>(path: P) -> GfResult<RawDistributions> {
    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file);

    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err(GuildForgeError::Validation(
            "distribution matrix needs at least one watershed column".to_string(),
        ));
    }
    let watersheds: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let line = i + 2;
        if record.len() != watersheds.len() + 1 {
            return Err(GuildForgeError::Validation(format!(
                "distribution row {}: expected {} presence cells, found {}",
                line,
                watersheds.len(),
                record.len().saturating_sub(1)
            )));
        }
        let id = record[0].trim().to_string();
        let mut bits = Vec::with_capacity(watersheds.len());
        for (j, cell) in record.iter().skip(1).enumerate() {
            match cell.trim() {
                "0" => bits.push(0u8),
                "1" => bits.push(1u8),
                other => {
                    return Err(GuildForgeError::Validation(format!(
                        "distribution row {} ('{}'), watershed '{}': presence must be 0 or 1, found '{}'",
                        line, id, watersheds[j], other
                    )));
                }
            }
        }
        rows.push((id, bits));
    }

    Ok(RawDistributions { watersheds, rows })
}

/// Joins the two tables. Species keep the distribution-file row order;
/// ids present in only one table are dropped with a warning. An empty
/// join is fatal.
pub fn build_species(speeds: RawSpeeds, distros: RawDistributions) -> GfResult<SpeciesData> {
    let speed_by_id: HashMap<String, f64> = speeds.entries.into_iter().collect();

    let mut species = Vec::new();
    let mut missing_speed = 0usize;
    let mut matched = 0usize;
    for (id, bits) in distros.rows {
        match speed_by_id.get(&id) {
            Some(&speed) => {
                matched += 1;
                species.push(Species::new(id, speed, bits));
            }
            None => missing_speed += 1,
        }
    }
    let unused_speeds = speed_by_id.len().saturating_sub(matched);

    if missing_speed > 0 {
        warn!(
            "⚠️  {} distribution row(s) have no speed entry and were dropped",
            missing_speed
        );
    }
    if unused_speeds > 0 {
        warn!(
            "⚠️  {} speeds entr(ies) never appear in the distribution matrix",
            unused_speeds
        );
    }
    if species.is_empty() {
        return Err(GuildForgeError::Validation(
            "no species present in both the speeds table and the distribution matrix".to_string(),
        ));
    }

    info!(
        "📂 Loaded {} species across {} watersheds",
        species.len(),
        distros.watersheds.len()
    );
    Ok(SpeciesData {
        species,
        watersheds: distros.watersheds,
    })
}

/// Loads and joins both input tables.
pub fn load_species_data<P: AsRef<Path>>(
    speeds_path: P,
    distributions_path: P,
    source: SpeedSource,
) -> GfResult<SpeciesData> {
    let speeds = load_speeds(speeds_path, source)?;
    let distros = load_distributions(distributions_path)?;
    build_species(speeds, distros)
}
