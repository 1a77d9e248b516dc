//! dirsync CLI - Operator interface for the dirsync engine

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9533";

#[derive(Parser)]
#[command(name = "dirsync")]
#[command(about = "dirsync engine CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "DIRSYNC_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Trigger a full sync fan-out now
    Trigger,

    /// Show per-phase sync results for a source
    Status {
        /// Source ID
        source_id: String,
    },

    /// List configured sources
    Sources,

    /// Register a new source
    AddSource {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Register disabled (no jobs submitted until enabled)
        #[arg(long)]
        disabled: bool,

        /// Connector settings as JSON string
        #[arg(long, default_value = "null")]
        settings: String,
    },

    /// Enable or disable a source
    SetEnabled {
        /// Source ID
        source_id: String,

        /// true or false
        enabled: bool,
    },

    /// Delete a source
    DeleteSource {
        /// Source ID
        source_id: String,
    },

    /// Show system status
    Stats,

    /// Run maintenance operations
    Maintenance {
        /// Force VACUUM even if not needed
        #[arg(long)]
        force_vacuum: bool,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct SourceRow {
    id: String,
    name: String,
    enabled: bool,
    slug: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn colored_status(status: &str) -> String {
    match status {
        "SUCCESSFUL" => status.green().to_string(),
        "ERROR" => status.red().to_string(),
        _ => status.yellow().to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Trigger => {
            let result = call_rpc(&cli.rpc_url, "sync.trigger.v1", json!({})).await?;
            let enqueued = result["jobs_enqueued"].as_u64().unwrap_or(0);
            println!("{} {} sync jobs enqueued", "OK".green().bold(), enqueued);
        }

        Commands::Status { source_id } => {
            let result = call_rpc(
                &cli.rpc_url,
                "sync.status.v1",
                json!({ "source_id": source_id }),
            )
            .await?;

            println!(
                "{} ({})",
                result["source_name"].as_str().unwrap_or("?").bold(),
                result["source_id"].as_str().unwrap_or("?")
            );

            for phase in result["phases"].as_array().cloned().unwrap_or_default() {
                let status = phase["status"].as_str().unwrap_or("UNKNOWN");
                println!(
                    "  {:<12} {:<12} {}",
                    phase["phase"].as_str().unwrap_or("?"),
                    colored_status(status),
                    phase["uid"].as_str().unwrap_or("?")
                );
                for message in phase["messages"].as_array().cloned().unwrap_or_default() {
                    println!("    {}", message.as_str().unwrap_or(""));
                }
                if let Some(error) = phase["error"].as_str() {
                    println!("    {}", error.red());
                }
            }
        }

        Commands::Sources => {
            let result = call_rpc(&cli.rpc_url, "source.list.v1", json!({})).await?;
            let sources: Vec<SourceRow> =
                serde_json::from_value(result["sources"].clone()).context("Invalid source list")?;

            if sources.is_empty() {
                println!("No sources configured");
            } else {
                println!("{}", Table::new(sources));
            }
        }

        Commands::AddSource {
            name,
            disabled,
            settings,
        } => {
            let settings_json: serde_json::Value =
                serde_json::from_str(&settings).context("Invalid JSON settings")?;

            let result = call_rpc(
                &cli.rpc_url,
                "source.add.v1",
                json!({
                    "name": name,
                    "enabled": !disabled,
                    "settings": settings_json,
                }),
            )
            .await?;

            println!(
                "{} source {} ({})",
                "Added".green().bold(),
                result["name"].as_str().unwrap_or("?"),
                result["id"].as_str().unwrap_or("?")
            );
        }

        Commands::SetEnabled { source_id, enabled } => {
            call_rpc(
                &cli.rpc_url,
                "source.set-enabled.v1",
                json!({ "source_id": source_id, "enabled": enabled }),
            )
            .await?;
            let verb = if enabled { "Enabled" } else { "Disabled" };
            println!("{} source {}", verb.green().bold(), source_id);
        }

        Commands::DeleteSource { source_id } => {
            call_rpc(
                &cli.rpc_url,
                "source.delete.v1",
                json!({ "source_id": source_id }),
            )
            .await?;
            println!("{} source {}", "Deleted".green().bold(), source_id);
        }

        Commands::Stats => {
            let result = call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await?;

            println!("{}", "dirsync engine".bold());
            println!("  total jobs:     {}", result["total_jobs"]);
            println!("  queued:         {}", result["queued_jobs"]);
            println!("  running:        {}", result["running_jobs"]);
            println!("  done:           {}", result["done_jobs"]);
            println!("  failed:         {}", result["failed_jobs"]);
            println!("  stored results: {}", result["stored_results"]);
            println!("  db size:        {} bytes", result["db_size_bytes"]);
            println!("  uptime:         {} s", result["uptime_seconds"]);
        }

        Commands::Maintenance { force_vacuum } => {
            let result = call_rpc(
                &cli.rpc_url,
                "admin.maintenance.v1",
                json!({ "force_vacuum": force_vacuum }),
            )
            .await?;

            println!("{}", "Maintenance completed".green().bold());
            println!("  vacuum run:      {}", result["vacuum_run"]);
            println!("  jobs deleted:    {}", result["jobs_deleted"]);
            println!("  results purged:  {}", result["results_purged"]);
            println!(
                "  db size:         {} -> {} bytes",
                result["db_size_before"], result["db_size_after"]
            );
        }
    }

    Ok(())
}
