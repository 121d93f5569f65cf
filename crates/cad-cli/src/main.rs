use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cad-cli")]
#[command(about = "Capital adequacy desk: CET1 simulation and exposure allocation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> scenario -> stress...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Generate a random book, optimize it toward the target ratio and report.
    Simulate {
        /// Layered config paths in merge order (defaults apply when omitted)
        #[arg(long = "config", num_args = 1..)]
        config_paths: Vec<String>,

        /// Seed override for reproducible books
        #[arg(long)]
        seed: Option<u64>,

        /// Target CET1 ratio override (e.g. 0.15)
        #[arg(long)]
        target_ratio: Option<f64>,

        /// Promote suggestions to live exposures after optimizing
        #[arg(long, default_value_t = false)]
        apply: bool,

        /// Print the report as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Fail on config keys nothing reads (default: warn)
        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },

    /// Optimize a portfolio snapshot read from a JSON file; prints the annotated snapshot.
    Optimize {
        /// Path to a PortfolioSnapshot JSON file
        #[arg(long)]
        portfolio: String,

        /// Target CET1 ratio override (default: the snapshot's own)
        #[arg(long)]
        target_ratio: Option<f64>,

        /// Layered config paths; only the allocation section is read
        #[arg(long = "config", num_args = 1..)]
        config_paths: Vec<String>,
    },
}

fn main() -> Result<()> {
    // dev-time bootstrap; a missing file is fine
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = cad_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Simulate {
            config_paths,
            seed,
            target_ratio,
            apply,
            json,
            strict_config,
        } => commands::simulate::run(commands::simulate::SimulateArgs {
            config_paths: &config_paths,
            seed,
            target_ratio,
            apply,
            json,
            strict_config,
        })?,

        Commands::Optimize {
            portfolio,
            target_ratio,
            config_paths,
        } => commands::optimize::run(&portfolio, target_ratio, &config_paths)?,
    }

    Ok(())
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
