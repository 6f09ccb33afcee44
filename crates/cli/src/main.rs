//! ytflow CLI - Command-line client for the ytflow HTTP API

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};

const DEFAULT_URL: &str = "http://127.0.0.1:3000";

#[derive(Parser)]
#[command(name = "ytflow")]
#[command(about = "ytflow submission pipeline CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Daemon base URL
    #[arg(long, env = "YTFLOW_URL", default_value = DEFAULT_URL)]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a channel for processing
    Submit {
        /// Channel name or handle
        #[arg(short, long)]
        channel: String,

        /// Address that receives the result
        #[arg(short, long)]
        email: String,
    },

    /// Show a stored job
    Status {
        /// Job ID (e.g., job_1700000000000_...)
        job_id: String,
    },

    /// Check that the daemon is up
    Health,
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    channel: &'a str,
    email: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    job_id: String,
    message: String,
}

#[derive(Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct JobView {
    job_id: String,
    channel: String,
    email: String,
    state: String,
    created_at: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    details: Vec<FieldErrorView>,
}

#[derive(Deserialize)]
struct FieldErrorView {
    field: String,
    message: String,
}

/// Turn a non-2xx response into a readable error
async fn api_error(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) if body.details.is_empty() => anyhow::anyhow!("{} ({})", body.error, status),
        Ok(body) => {
            let details: Vec<String> = body
                .details
                .iter()
                .map(|d| format!("{}: {}", d.field, d.message))
                .collect();
            anyhow::anyhow!("{} ({}): {}", body.error, status, details.join(", "))
        }
        Err(_) => anyhow::anyhow!("Request failed ({})", status),
    }
}

/// Daemon URL with `segments` appended, each percent-encoded
fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("Invalid daemon URL {}", base))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Daemon URL {} cannot take a path", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Submit { channel, email } => {
            let response = client
                .post(endpoint(&cli.url, &["yt"])?)
                .json(&SubmitRequest {
                    channel: &channel,
                    email: &email,
                })
                .send()
                .await
                .context("Failed to connect to daemon")?;

            if response.status() != StatusCode::CREATED {
                return Err(api_error(response).await);
            }

            let result: SubmitResponse = response
                .json()
                .await
                .context("Failed to parse response")?;

            println!("{}", format!("✓ {}", result.message).green().bold());
            println!("  {} {}", "Job ID:".bold(), result.job_id);
        }

        Commands::Status { job_id } => {
            let response = client
                .get(endpoint(&cli.url, &["yt", job_id.as_str()])?)
                .send()
                .await
                .context("Failed to connect to daemon")?;

            if response.status() == StatusCode::NOT_FOUND {
                println!("{}", format!("No job {}", job_id).yellow());
                return Ok(());
            }
            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            let job: JobView = response
                .json()
                .await
                .context("Failed to parse response")?;

            println!("{}", Table::new(vec![job]));
        }

        Commands::Health => {
            println!("{}", "System Status".cyan().bold());
            println!();
            println!("  {} {}", "URL:".bold(), cli.url);

            let result = client.get(endpoint(&cli.url, &["health"])?).send().await;
            match result {
                Ok(response) if response.status().is_success() => {
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                }
                Ok(response) => {
                    println!("  {} {}", "Status:".bold(), "DEGRADED".yellow());
                    println!("  {} HTTP {}", "Error:".bold(), response.status());
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "OFFLINE".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
