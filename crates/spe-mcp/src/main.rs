//! MCP server for SharePoint Embedded.
//!
//! Usage:
//! ```bash
//! spe-mcp serve                     # MCP over stdio (spawned by the agent host)
//! spe-mcp serve --http              # MCP over streamable HTTP on 127.0.0.1:3333/mcp
//! spe-mcp call <tool> <json>        # Run one tool and print its report
//! spe-mcp tools                     # List the available tools
//! ```
//!
//! Logs go to stderr so stdout stays free for the stdio transport.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "spe-mcp", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the tools over MCP
    Serve(commands::serve::ServeArgs),

    /// Call a tool directly
    Call(commands::call::CallArgs),

    /// List available tools
    Tools(commands::tools::ToolsArgs),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serve(_) => f.debug_tuple("Serve").finish(),
            Self::Call(_) => f.debug_tuple("Call").finish(),
            Self::Tools(_) => f.debug_tuple("Tools").finish(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("info".parse().context("failed to parse log directive")?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Serve(args) => commands::serve::run(args).await,
        Command::Call(args) => commands::call::run(args).await,
        Command::Tools(args) => commands::tools::run(args),
    }
}
