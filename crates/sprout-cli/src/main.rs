//! # sprout-cli
//!
//! Interactive terminal client for searching, inspecting and installing npm
//! packages.
//!
//! This is the main entry point for the Sprout CLI. It parses arguments,
//! sets up logging and error reporting, loads settings and dispatches to
//! the command handlers. Without a subcommand it starts the interactive
//! session.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sprout_config::SettingsLoader;

mod app;
mod commands;
mod installer;
mod output;
mod services;

use commands::CommandContext;
use output::ErrorFormatter;
use services::Services;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("BUILD_DATE"),
    " with ",
    env!("RUSTC_VERSION"),
    ")"
);

/// Search, inspect and install npm packages from the terminal
#[derive(Parser)]
#[command(name = "sprout", version, long_version = LONG_VERSION, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file to use instead of ~/.sprout/config.toml
    #[arg(long, global = true, env = "SPROUT_CONFIG", value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Maximum concurrent metadata lookups
    #[arg(long, global = true, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "SPROUT_LOG_JSON")]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive session (the default)
    Interactive,
    /// Search the registry
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        /// Number of results
        #[arg(long, value_name = "N")]
        size: Option<u32>,
    },
    /// List the dependencies of the nearest package.json
    List,
    /// Show a package's details, download trend and README
    Info {
        name: String,
        /// Trend window in days
        #[arg(long, value_name = "DAYS")]
        days: Option<i64>,
        /// Skip fetching the README
        #[arg(long)]
        no_readme: bool,
    },
    /// Install a package with the project's package manager
    Install {
        name: String,
        /// Install as a dev dependency
        #[arg(short = 'D', long)]
        dev: bool,
    },
    /// Update a package to its latest version
    Update { name: String },
}

impl Cli {
    fn settings_loader(&self) -> SettingsLoader {
        let mut loader = SettingsLoader::new()
            .with_config_path(self.config.clone())
            .with_env(SettingsLoader::collect_env_overrides());

        if let Some(concurrency) = self.concurrency {
            loader = loader.with_cli_override("concurrency", concurrency);
        }
        match &self.command {
            Some(Commands::Search { size: Some(size), .. }) => {
                loader = loader.with_cli_override("page_size", size);
            }
            Some(Commands::Info { days: Some(days), .. }) => {
                loader = loader.with_cli_override("window_days", days);
            }
            _ => {}
        }
        loader
    }
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_json);
    setup_panic_handler();

    info!("Starting Sprout v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_cli(cli) {
        eprintln!("{}", ErrorFormatter::new().format_any(&e));
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

    let loader = cli.settings_loader();
    let command = cli.command;

    let result = rt.block_on(async move {
        let settings = loader.load().await?;
        let services = Services::from_settings(settings)?;
        let ctx = CommandContext::new(services)?;
        commands::dispatch_command(command, &ctx).await?;
        Ok::<(), anyhow::Error>(())
    });

    // A pending stdin read must not keep the process alive
    rt.shutdown_background();
    result
}

fn setup_logging(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "sprout={level},sprout_core={level},sprout_config={level},sprout_registry={level}"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Sprout encountered an unexpected error: {}", panic_info);
        eprintln!("🌱 Sprout crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/sprout-tui/sprout/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
