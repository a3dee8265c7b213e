//! metagen entry point.
//!
//! Logging goes to stderr so generated JSON piped from tooling around
//! the binary stays clean.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use metagen_client::{Goal, Provider};
use metagen_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod goals;
mod providers;
mod registry;
mod runner;
mod upstream;

use registry::Registry;

#[derive(Debug, Parser)]
#[command(name = "metagen", version, about = "Launcher metadata generator")]
struct Cli {
    /// User-Agent header for upstream requests
    #[arg(short = 'u', long, global = true)]
    user_agent: Option<String>,

    /// Directory generated metadata is written to
    #[arg(short = 'o', long, global = true)]
    output_dir: Option<PathBuf>,

    /// Directory cached upstream responses live in
    #[arg(short = 'c', long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Treat every cached response as fresh, skipping revalidation
    #[arg(short = 'A', long, global = true)]
    assume_up_to_date: bool,

    /// Emit version records without whitespace
    #[arg(short = 'M', long, global = true)]
    minify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate packages for the named goals (default: all) and run
    /// the providers they depend on
    Build { goals: Vec<String> },

    /// Run the named providers (default: all) to warm the cache
    /// without generating output
    Prepare { providers: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let registry = Registry::new();
    let matches = Cli::command().after_help(known_ids(&registry)).get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let mut config = AppConfig::load()?;
    if let Some(user_agent) = cli.user_agent {
        config.user_agent = user_agent;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }
    config.assume_up_to_date |= cli.assume_up_to_date;
    config.minify |= cli.minify;
    config.validate()?;

    match cli.command {
        Command::Build { goals } => {
            let goals = select_goals(&registry, &goals)?;
            runner::build(goals, &config).await?;
        }
        Command::Prepare { providers } => {
            let providers = select_providers(&registry, &providers)?;
            runner::prepare(providers, &config).await?;
        }
    }

    Ok(())
}

fn select_goals(registry: &Registry, ids: &[String]) -> Result<Vec<Arc<dyn Goal>>> {
    if ids.is_empty() {
        return Ok(registry.all_goals());
    }
    ids.iter()
        .map(|id| {
            registry
                .goal(id)
                .ok_or_else(|| anyhow::anyhow!("unknown goal '{id}' (known: {})", registry.goal_ids().join(", ")))
        })
        .collect()
}

fn select_providers(registry: &Registry, ids: &[String]) -> Result<Vec<Arc<dyn Provider>>> {
    if ids.is_empty() {
        return Ok(registry.all_providers());
    }
    ids.iter()
        .map(|id| {
            registry.provider(id).ok_or_else(|| {
                anyhow::anyhow!("unknown provider '{id}' (known: {})", registry.provider_ids().join(", "))
            })
        })
        .collect()
}

fn known_ids(registry: &Registry) -> String {
    format!(
        "Providers:\n  {}\n\nGoals:\n  {}",
        registry.provider_ids().join("\n  "),
        registry.goal_ids().join("\n  ")
    )
}
