//! fretcam CLI - offset, plan, emit and simulate pocket toolpaths
//!
//! Every command reads a JSON request from a file (or `-` for stdin) and
//! writes the JSON response to stdout.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use fretcam::api::{self, EmitRequest, OffsetRequest, PlanRequest, SimulateRequest};
use fretcam::postdb::PostProfileProvider;
use fretcam::{init_logging, Config, BUILD_DATE, VERSION};

#[derive(Parser)]
#[command(name = "fretcam")]
#[command(about = "Pocket toolpath planning, G-code emission and simulation", long_about = None)]
struct Cli {
    /// Configuration file (.json or .toml); defaults to the user config
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute nested offset rings
    Offset {
        /// OffsetRequest JSON file, `-` for stdin
        request: PathBuf,
    },
    /// Offset and plan a pocket toolpath
    Plan {
        /// PlanRequest JSON file, `-` for stdin
        request: PathBuf,
    },
    /// Render moves as G-code
    Emit {
        /// EmitRequest JSON file, `-` for stdin
        request: PathBuf,
        /// Print the raw G-code instead of a JSON response
        #[arg(long)]
        raw: bool,
    },
    /// Simulate G-code
    Simulate {
        /// SimulateRequest JSON file, `-` for stdin
        request: PathBuf,
    },
    /// List the available post profiles
    Profiles,
}

fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read request from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&content).context("Invalid request JSON")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json)?;
    info!("fretcam {} (built {})", VERSION, BUILD_DATE);

    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Offset { request } => {
            let request: OffsetRequest = read_request(&request)?;
            print_json(&api::offset(&request, &config)?)?;
        }
        Commands::Plan { request } => {
            let request: PlanRequest = read_request(&request)?;
            print_json(&api::plan(&request, &config)?)?;
        }
        Commands::Emit { request, raw } => {
            let request: EmitRequest = read_request(&request)?;
            let profiles = config.profile_registry()?;
            let response = api::emit(&request, &config, &profiles)?;
            if raw {
                print!("{}", response.gcode_text);
            } else {
                print_json(&response)?;
            }
        }
        Commands::Simulate { request } => {
            let request: SimulateRequest = read_request(&request)?;
            print_json(&api::simulate(&request, &config))?;
        }
        Commands::Profiles => {
            let profiles = config.profile_registry()?;
            for id in profiles.profile_ids() {
                if let Ok(profile) = profiles.get_profile(&id) {
                    println!("{:<12} {}", id, profile.name);
                }
            }
        }
    }

    Ok(())
}
