//! stager CLI — specialize configuration graphs described in `stager.toml`.

mod commands;
mod manifest;
mod telemetry;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};

use manifest::{parse_override, StagerManifest};

#[derive(Parser)]
#[command(name = "stager", version, about = "Configuration graph specializer")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new stager project
    Init {
        /// Project name
        name: String,
    },
    /// Build, normalize and validate the configuration graph
    Check {
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Normalize the graph and resolve its conditionals
    Specialize {
        /// Only resolve conditionals whose key is bound
        #[arg(long)]
        partial: bool,
        /// Bind a key, overriding stager.toml (KEY=true|false)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Render a diagnostic view of the graph
    Inspect {
        /// View to render (dot, summary)
        #[arg(long)]
        view: Option<String>,
        /// Pipeline stage to render (raw, normalized, evaluated)
        #[arg(long)]
        stage: Option<String>,
        /// Bind a key for the evaluated stage (KEY=true|false)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
        /// Write the rendering to a file instead of stdout
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Fully evaluate and clean every component
    Clean {
        /// Bind a key, overriding stager.toml (KEY=true|false)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Fully evaluate, configure components and print the connection plan
    Plan {
        /// Bind a key, overriding stager.toml (KEY=true|false)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { name } => commands::init::run(&name),

        Commands::Check { format } => {
            let (manifest, _) = load_manifest_required(&cwd)?;
            commands::check::run(&manifest, format.as_deref())
        }

        Commands::Specialize {
            partial,
            set,
            format,
        } => {
            let (manifest, _) = load_manifest_required(&cwd)?;
            let overrides = parse_overrides(&set)?;
            commands::specialize::run(&manifest, partial, &overrides, format.as_deref())
        }

        Commands::Inspect {
            view,
            stage,
            set,
            format,
            export,
        } => {
            let (manifest, _) = load_manifest_required(&cwd)?;
            let overrides = parse_overrides(&set)?;
            commands::inspect::run(
                &manifest,
                view.as_deref(),
                stage.as_deref(),
                &overrides,
                format.as_deref(),
                export.as_deref(),
            )
        }

        Commands::Clean { set } => {
            let (manifest, _) = load_manifest_required(&cwd)?;
            let overrides = parse_overrides(&set)?;
            commands::clean::run(&manifest, &overrides)
        }

        Commands::Plan { set, format } => {
            let (manifest, _) = load_manifest_required(&cwd)?;
            let overrides = parse_overrides(&set)?;
            commands::plan::run(&manifest, &overrides, format.as_deref())
        }
    }
}

/// Load manifest, returning error if not found.
fn load_manifest_required(cwd: &Path) -> anyhow::Result<(StagerManifest, PathBuf)> {
    require_manifest(StagerManifest::find_and_load(cwd)?)
}

fn require_manifest(
    found: Option<(StagerManifest, PathBuf)>,
) -> anyhow::Result<(StagerManifest, PathBuf)> {
    match found {
        Some((manifest, dir)) => {
            tracing::debug!(dir = %dir.display(), "loaded manifest");
            Ok((manifest, dir))
        }
        None => anyhow::bail!("no stager.toml found (run `stager init` first)"),
    }
}

fn parse_overrides(set: &[String]) -> anyhow::Result<Vec<(String, bool)>> {
    set.iter().map(|s| parse_override(s)).collect()
}
