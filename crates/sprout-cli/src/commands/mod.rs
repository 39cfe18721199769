//! Command implementations and dispatch logic.
//!
//! Each command is an async function taking the parsed arguments and a
//! shared [`CommandContext`].

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use sprout_core::error::{SproutError, SproutResult};

pub mod info;
pub mod install;
pub mod interactive;
pub mod list;
pub mod search;


use crate::output::OutputHandler;
use crate::services::Services;
use crate::Commands;

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: PathBuf,
    pub output: OutputHandler,
    pub services: Arc<Services>,
}

impl CommandContext {
    /// Create a context rooted at the current directory
    pub fn new(services: Arc<Services>) -> SproutResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| SproutError::io("Failed to get current directory".to_string(), e))?;

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
            services,
        })
    }
}

/// Dispatch a command to its handler; no command starts the interactive session
pub async fn dispatch_command(command: Option<Commands>, ctx: &CommandContext) -> SproutResult<()> {
    match command {
        None | Some(Commands::Interactive) => {
            info!("Starting interactive session");
            interactive::execute(ctx).await
        }
        Some(Commands::Search { query, .. }) => {
            let query = query.join(" ");
            info!("Searching for '{}'", query);
            search::execute(&query, ctx).await
        }
        Some(Commands::List) => {
            info!("Listing project dependencies");
            list::execute(ctx).await
        }
        Some(Commands::Info { name, no_readme, .. }) => {
            info!("Showing package {}", name);
            info::execute(&name, !no_readme, ctx).await
        }
        Some(Commands::Install { name, dev }) => {
            info!("Installing {} (dev: {})", name, dev);
            install::execute(&name, dev, ctx).await
        }
        Some(Commands::Update { name }) => {
            info!("Updating {}", name);
            install::update(&name, ctx).await
        }
    }
}
