use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use guildforge::config::GaParams;
use guildforge::loader::{self, SpeedSource};
use std::process;
use tracing::{error, info};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(global = true, short, long, default_value = "data/speeds.csv")]
    speeds: String,

    #[arg(global = true, short, long, default_value = "data/spp_x_trib.csv")]
    distributions: String,

    /// Column the species speed comes from.
    #[arg(global = true, long, value_enum, default_value = "guild")]
    speed_source: SpeedSource,

    /// JSON parameter file; explicit CLI flags override its values.
    #[arg(global = true, long)]
    params: Option<String>,

    #[arg(global = true, long)]
    seed: Option<u64>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Search(cmd::search::SearchArgs),
    Sweep(cmd::sweep::SweepArgs),
}

fn main() {
    // 1. Parse raw matches to distinguish user input from defaults.
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if cli.debug {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }

    info!("🚀 Initializing GuildForge...");

    // 2. Per-subcommand matches; the GA flags live there, not at the root.
    let (cli_params_ref, sub_matches) = match &cli.command {
        Commands::Search(args) => (
            &args.params,
            matches.subcommand_matches("search").unwrap(),
        ),
        Commands::Sweep(args) => (&args.params, matches.subcommand_matches("sweep").unwrap()),
    };

    // 3. Parameter file (if any) is the base; explicit CLI flags win.
    let mut params = if let Some(path) = &cli.params {
        info!("⚖️  Loading parameters from: {}", path);
        match GaParams::load_from_file(path) {
            Ok(p) => p,
            Err(e) => {
                error!("❌ {}", e);
                process::exit(1);
            }
        }
    } else {
        GaParams::default()
    };
    params.merge_from_cli(cli_params_ref, sub_matches);

    // 4. Load and join the input tables.
    info!("📂 Loading species: {}", cli.speeds);
    info!("📂 Loading distributions: {}", cli.distributions);
    let data = match loader::load_species_data(&cli.speeds, &cli.distributions, cli.speed_source) {
        Ok(d) => d,
        Err(e) => {
            error!("❌ {}", e);
            process::exit(1);
        }
    };

    // 5. Execute.
    let outcome = match &cli.command {
        Commands::Search(args) => cmd::search::run(args, &params, &data, cli.seed),
        Commands::Sweep(args) => cmd::sweep::run(args, &params, &data, cli.seed),
    };

    if let Err(e) = outcome {
        error!("❌ {}", e);
        process::exit(1);
    }
}
