//! `pbxgen`: generate Xcode projects from declarative manifests.

mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_generate, cmd_targets};

/// Generate and inspect Xcode project files
#[derive(Parser)]
#[command(name = "pbxgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build a project from a JSON manifest and write project.pbxproj
  Generate {
    /// Path to the manifest
    manifest: PathBuf,

    /// Output bundle (default: <name>.xcodeproj next to the manifest); project paths stay
    /// relative to the manifest
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Use reproducible object identities
    #[arg(long)]
    deterministic: bool,
  },

  /// List the targets of an existing project
  Targets {
    /// Project bundle (.xcodeproj) or project.pbxproj file
    project: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Generate {
      manifest,
      output,
      deterministic,
    } => cmd_generate(&manifest, output.as_deref(), deterministic, cli.verbose),
    Commands::Targets { project, json } => cmd_targets(&project, json),
  }
}
