//! natlib - bundled native library tooling CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use natlib_cli::cmd;
use natlib_cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Platform => cmd::platform::platform(&cli),
        Commands::Name { name, all } => cmd::name::name(&cli, name, *all),
        Commands::Hash { set } => cmd::hash::hash(&cli, set),
        Commands::Extract { set } => cmd::extract::extract(&cli, set),
        Commands::Load {
            package,
            library,
            manifest,
        } => cmd::load::load(&cli, package.as_deref(), library.as_deref(), manifest.as_deref()),
        Commands::Clean { dry_run } => cmd::clean::clean(&cli, *dry_run),
        Commands::Completions { shell } => {
            cmd::completions::completions(*shell);
            Ok(())
        }
    }
}
