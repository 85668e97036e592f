//! `spe-mcp serve`: run the MCP server.
//!
//! Stdio is the default, since agent hosts usually spawn the server as a
//! child process. `--http` serves the streamable HTTP transport instead.

use std::{future::Future, net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use rmcp::{
    service::ServiceExt,
    transport::{stdio, streamable_http_server::StreamableHttpServerConfig},
};
use spe_core::Config;
use spe_runtime::{McpService, Toolbox};
use tokio::signal;
use tracing::info;

#[derive(Args)]
pub struct ServeArgs {
    /// Path to the config file (defaults to the first `spe-mcp.toml` found).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Serve streamable HTTP instead of stdio.
    #[arg(long, default_value_t = false)]
    pub http: bool,

    /// Address to bind the HTTP server to.
    #[arg(short = 'a', long, default_value = "127.0.0.1:3333")]
    pub addr: String,

    /// HTTP path for the MCP endpoint.
    #[arg(long, default_value = "/mcp")]
    pub path: String,
}

pub async fn run(args: &ServeArgs) -> Result<()> {
    let shutdown = async {
        let _ = signal::ctrl_c().await;
        info!("Received shutdown signal");
    };
    run_with_shutdown(args, shutdown).await
}

async fn run_with_shutdown<F>(args: &ServeArgs, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let config =
        Config::load_or_resolve(args.config.as_deref()).context("failed to load configuration")?;
    let toolbox = Toolbox::initialize(&config).context("failed to initialize Graph client")?;

    if args.http {
        run_http(args, toolbox.clone(), shutdown).await?;
    } else {
        run_stdio(toolbox.clone()).await?;
    }

    toolbox.shutdown();
    info!("SharePoint Embedded MCP server stopped");
    Ok(())
}

async fn run_http<F>(args: &ServeArgs, toolbox: Toolbox, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = args
        .addr
        .parse()
        .with_context(|| format!("invalid --addr value: {}", args.addr))?;
    let path = normalize_path(&args.path);

    eprintln!("{} Starting MCP server...", style("→").cyan());
    eprintln!(
        "{} Loaded {} tool(s)",
        style("✓").green().bold(),
        toolbox.descriptors().len()
    );

    let service = McpService::new(toolbox).streamable_http_service_with_config(
        StreamableHttpServerConfig {
            // Stateless mode keeps compatibility with MCP clients that don't send
            // the initialized notification after initialize.
            stateful_mode: false,
            ..Default::default()
        },
    );
    let router = axum::Router::new().nest_service(path.as_str(), service);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind MCP server on {addr}"))?;

    info!(address = %addr, path = %path, "Starting MCP server");
    eprintln!(
        "{} MCP server running on http://{}{}",
        style("✓").green().bold(),
        addr,
        path
    );
    eprintln!("Press Ctrl+C to stop\n");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("mcp server error")
}

async fn run_stdio(toolbox: Toolbox) -> Result<()> {
    eprintln!("{} Starting MCP stdio server...", style("→").cyan());
    eprintln!(
        "{} Loaded {} tool(s)",
        style("✓").green().bold(),
        toolbox.descriptors().len()
    );

    let (stdin, stdout) = stdio();
    let running = McpService::new(toolbox)
        .serve((stdin, stdout))
        .await
        .context("failed to start MCP stdio server")?;

    eprintln!("{} MCP stdio server running", style("✓").green().bold());

    let cancel = running.cancellation_token();
    let mut waiting = Box::pin(running.waiting());

    tokio::select! {
        result = &mut waiting => {
            result.context("mcp stdio server exited")?;
        }
        _ = signal::ctrl_c() => {
            cancel.cancel();
            let _ = waiting.await;
        }
    }

    Ok(())
}

/// Normalizes an HTTP path to start with `/`. Empty means `/mcp`.
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        "/mcp".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct ServeArgsCli {
        #[command(flatten)]
        serve: ServeArgs,
    }

    #[test]
    fn test_serve_args_parse_flags() {
        let cli = ServeArgsCli::try_parse_from([
            "test",
            "--config",
            "custom.toml",
            "--http",
            "--addr",
            "0.0.0.0:9000",
            "--path",
            "/custom",
        ])
        .expect("args should parse");
        assert_eq!(cli.serve.config, Some(PathBuf::from("custom.toml")));
        assert!(cli.serve.http);
        assert_eq!(cli.serve.addr, "0.0.0.0:9000");
        assert_eq!(cli.serve.path, "/custom");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/mcp");
        assert_eq!(normalize_path("/custom"), "/custom");
        assert_eq!(normalize_path("custom"), "/custom");
    }

    #[tokio::test]
    async fn test_serve_fails_without_credentials() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let config = temp.path().join("spe-mcp.toml");
        fs::write(&config, "[graph]\ntimeout_secs = 5\n").expect("write config");

        let args = ServeArgs {
            config: Some(config),
            http: true,
            addr: "127.0.0.1:0".to_string(),
            path: "/mcp".to_string(),
        };
        let err = run_with_shutdown(&args, async {})
            .await
            .expect_err("missing credentials should fail");
        assert!(format!("{err:#}").contains("failed to initialize Graph client"));
    }

    #[tokio::test]
    async fn test_serve_rejects_invalid_addr() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let config = temp.path().join("spe-mcp.toml");
        fs::write(&config, "[azure_ad]\naccess_token = \"token\"\n").expect("write config");

        let args = ServeArgs {
            config: Some(config),
            http: true,
            addr: "not-an-address".to_string(),
            path: "/mcp".to_string(),
        };
        let err = run_with_shutdown(&args, async {})
            .await
            .expect_err("invalid addr should fail");
        assert!(err.to_string().contains("invalid --addr value"));
    }
}
