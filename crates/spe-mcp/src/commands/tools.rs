//! `spe-mcp tools`: list the tools the server exposes.
//!
//! Needs no configuration or credentials.

use anyhow::Result;
use clap::Args;
use console::style;
use spe_runtime::{ToolDescriptor, tool_descriptors};

#[derive(Args)]
pub struct ToolsArgs {
    /// Output format: "table" for a human-readable table or "json" for
    /// names, descriptions and input schemas
    #[arg(short, long, default_value = "table")]
    pub format: String,
}

pub fn run(args: &ToolsArgs) -> Result<()> {
    let tools = tool_descriptors();

    if args.format == "json" {
        let tools_json: Vec<_> = tools.iter().map(tool_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&tools_json)?);
        return Ok(());
    }

    println!(
        "{:<24} {:<22} {}",
        style("TOOL").bold(),
        style("TITLE").bold(),
        style("DESCRIPTION").bold()
    );
    println!("{}", "-".repeat(80));
    for tool in &tools {
        println!(
            "{:<24} {:<22} {}",
            tool.name,
            tool.title,
            truncate_description(tool.description)
        );
    }
    println!("\n{} {} tool(s) available", style("✓").green(), tools.len());
    Ok(())
}

fn tool_to_json(tool: &ToolDescriptor) -> serde_json::Value {
    serde_json::json!({
        "name": tool.name,
        "title": tool.title,
        "description": tool.description,
        "inputSchema": tool.input_schema,
    })
}

/// Truncates to 40 characters, ending in "..." when shortened.
fn truncate_description(description: &str) -> String {
    const MAX_DESCRIPTION_CHARS: usize = 40;
    const ELLIPSIS: &str = "...";
    const TRUNCATED_CHARS: usize = MAX_DESCRIPTION_CHARS - ELLIPSIS.len();

    let mut chars = description.chars();
    let head: String = chars.by_ref().take(MAX_DESCRIPTION_CHARS).collect();

    if chars.next().is_none() {
        return head;
    }

    let prefix: String = head.chars().take(TRUNCATED_CHARS).collect();
    format!("{prefix}{ELLIPSIS}")
}
