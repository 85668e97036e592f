//! `spe-mcp call` command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde_json::{Map, Value};
use spe_core::Config;
use spe_runtime::Toolbox;

/// Arguments for the `call` command.
#[derive(Args)]
pub struct CallArgs {
    /// Tool name (e.g., "upload_folder").
    pub tool: String,

    /// Input JSON (inline or @file.json).
    pub input: String,

    /// Path to the config file (defaults to the first `spe-mcp.toml` found).
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub async fn run(args: &CallArgs) -> Result<()> {
    let arguments = parse_input(&args.input)?;

    let config =
        Config::load_or_resolve(args.config.as_deref()).context("failed to load configuration")?;
    let toolbox = Toolbox::initialize(&config).context("failed to initialize Graph client")?;

    eprintln!(
        "{} Calling tool: {}",
        style("→").cyan(),
        style(&args.tool).bold()
    );

    let output = toolbox
        .call(&args.tool, arguments)
        .await
        .context("failed to call tool")?;
    println!("{output}");

    toolbox.shutdown();
    Ok(())
}

/// Reads the tool input, either inline JSON or `@path` to a JSON file.
fn parse_input(input: &str) -> Result<Map<String, Value>> {
    let json = match input.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file: {path}"))?,
        None => input.to_string(),
    };

    match serde_json::from_str(&json).context("invalid input JSON")? {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("input must be a JSON object"),
    }
}
