//! tfdeploy CLI - Command-line client for the tfdeploy daemon

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tabled::{Table, Tabled};

const DEFAULT_URL: &str = "http://127.0.0.1:8000";
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const POLL_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Parser)]
#[command(name = "tfdeploy")]
#[command(about = "Submit Terraform deployments to a tfdeploy daemon", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Daemon base URL
    #[arg(long, env = "TFDEPLOY_URL", default_value = DEFAULT_URL)]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a Terraform file and follow the job
    Deploy {
        /// Terraform source file
        file: PathBuf,

        /// DigitalOcean token (the daemon's default is used when omitted)
        #[arg(long, env = "DO_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Print the job id and return without polling
        #[arg(long)]
        no_wait: bool,
    },

    /// Show a job's status
    Status {
        /// Job ID
        job_id: String,

        /// Poll until the job finishes
        #[arg(long)]
        wait: bool,
    },

    /// Push a snippet to the agent inbox
    Push {
        /// Terraform source file
        file: PathBuf,

        /// Agent shared secret
        #[arg(long, env = "TFDEPLOY_AGENT_SECRET", hide_env_values = true)]
        secret: String,

        /// Also deploy the snippet
        #[arg(long)]
        deploy: bool,

        /// DigitalOcean token for the deploy
        #[arg(long, env = "DO_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Print the latest agent snippet
    Latest,

    /// Show daemon health and job counts
    Health,
}

#[derive(Debug, Deserialize)]
struct Accepted {
    job_id: String,
    status_url: String,
}

#[derive(Debug, Deserialize)]
struct JobView {
    job_id: String,
    status: String,
    message: String,
    #[serde(default)]
    details: Option<String>,
    updated_at: i64,
}

impl JobView {
    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "done" | "error")
    }
}

#[derive(Tabled)]
struct JobRow {
    job_id: String,
    status: String,
    message: String,
    updated_at: i64,
}

impl From<&JobView> for JobRow {
    fn from(job: &JobView) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: job.status.clone(),
            message: job.message.clone(),
            updated_at: job.updated_at,
        }
    }
}

struct Api {
    client: reqwest::Client,
    base_url: String,
}

impl Api {
    fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute URL for a path or an already absolute `status_url`
    fn resolve(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else {
            format!("{}/{}", self.base_url, path_or_url.trim_start_matches('/'))
        }
    }

    async fn get(&self, path_or_url: &str) -> Result<Value> {
        let response = self
            .client
            .get(self.resolve(path_or_url))
            .send()
            .await
            .context("Failed to connect to daemon")?;
        read_json(response).await
    }

    async fn post(&self, path: &str, body: &Value, secret: Option<&str>) -> Result<Value> {
        let mut request = self.client.post(self.resolve(path)).json(body);
        if let Some(secret) = secret {
            request = request.header("X-Agent-Secret", secret);
        }
        let response = request.send().await.context("Failed to connect to daemon")?;
        read_json(response).await
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        bail!("{}", error_message(status, &body));
    }
    Ok(body)
}

fn error_message(status: StatusCode, body: &Value) -> String {
    let detail = body
        .get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"));
    format!("HTTP {}: {}", status.as_u16(), detail)
}

fn read_source(file: &Path) -> Result<String> {
    let code = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    if code.trim().is_empty() {
        bail!("{} is empty", file.display());
    }
    Ok(code)
}

/// Poll until the job is terminal; an `error` job becomes an `Err`
async fn wait_for_job(api: &Api, status_url: &str) -> Result<JobView> {
    let start = Instant::now();
    let mut last_status = String::new();

    while start.elapsed() < POLL_TIMEOUT {
        let job: JobView = serde_json::from_value(api.get(status_url).await?)
            .context("Unexpected job status response")?;

        if job.status != last_status {
            println!("  {} {}", "→".cyan(), job.status.bold());
            last_status = job.status.clone();
        }
        if job.is_terminal() {
            return Ok(job);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    bail!("Timed out waiting for deployment status")
}

fn print_job(job: &JobView) {
    println!("{}", Table::new([JobRow::from(job)]));
    if let Some(details) = &job.details {
        println!();
        println!("{}", "Details:".bold());
        println!("{}", details);
    }
}

fn finish(job: JobView) -> Result<()> {
    match job.status.as_str() {
        "done" => {
            println!("{}", format!("✓ {}", job.message).green().bold());
            Ok(())
        }
        _ => {
            println!("{}", format!("✗ {}", job.message).red().bold());
            if let Some(details) = &job.details {
                println!("{}", details);
            }
            bail!("Deployment {} failed", job.job_id)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = Api::new(&cli.url)?;

    match cli.command {
        Commands::Deploy {
            file,
            token,
            no_wait,
        } => {
            let code = read_source(&file)?;
            let mut body = json!({ "tf_code": code });
            if let Some(token) = token {
                body["do_token"] = Value::String(token);
            }

            let accepted: Accepted = serde_json::from_value(api.post("/trigger-deploy", &body, None).await?)
                .context("Unexpected deploy response")?;
            println!(
                "{}",
                format!("✓ Deployment accepted: {}", accepted.job_id).green().bold()
            );

            if no_wait {
                println!("  {} {}", "Status URL:".bold(), api.resolve(&accepted.status_url));
                return Ok(());
            }
            let job = wait_for_job(&api, &accepted.status_url).await?;
            finish(job)?;
        }

        Commands::Status { job_id, wait } => {
            let path = format!("/jobs/{}", job_id);
            if wait {
                let job = wait_for_job(&api, &path).await?;
                print_job(&job);
                finish(job)?;
            } else {
                let job: JobView = serde_json::from_value(api.get(&path).await?)
                    .context("Unexpected job status response")?;
                print_job(&job);
            }
        }

        Commands::Push {
            file,
            secret,
            deploy,
            token,
        } => {
            let code = read_source(&file)?;
            let mut body = json!({ "code": code, "deploy": deploy });
            if let Some(token) = token {
                body["do_token"] = Value::String(token);
            }

            let result = api.post("/agent/push", &body, Some(&secret)).await?;
            println!("{}", format!("✓ Snippet stored (ts {})", result["ts"]).green().bold());
            if let Some(job_id) = result.get("job_id").and_then(Value::as_str) {
                println!("  {} {}", "Deployment:".bold(), job_id);
            } else if deploy {
                println!("  {} no token available, deploy skipped", "!".yellow());
            }
        }

        Commands::Latest => {
            let latest = api.get("/agent/latest").await?;
            match latest.get("code").and_then(Value::as_str) {
                Some(code) => {
                    println!("{}", format!("Latest snippet (ts {}):", latest["ts"]).cyan().bold());
                    println!("{}", code);
                }
                None => println!("{}", "No snippet pushed yet".yellow()),
            }
        }

        Commands::Health => {
            println!("{}", "Daemon Status".cyan().bold());
            println!();

            match api.get("/healthz").await {
                Ok(health) => {
                    println!("  {} {}", "URL:".bold(), api.base_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {}", "Version:".bold(), health["version"]);
                    println!();
                    println!("  {} {}", "Pending:".bold(), health["jobs"]["pending"]);
                    println!("  {} {}", "Running:".bold(), health["jobs"]["running"]);
                    println!("  {} {}", "Done:".bold(), health["jobs"]["done"]);
                    println!("  {} {}", "Error:".bold(), health["jobs"]["error"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let api = Api::new("http://localhost:8000/").unwrap();

        assert_eq!(api.resolve("/jobs/abc"), "http://localhost:8000/jobs/abc");
        assert_eq!(
            api.resolve("https://deploy.example.com/jobs/abc"),
            "https://deploy.example.com/jobs/abc"
        );
    }

    #[test]
    fn test_error_message_prefers_body() {
        let body = json!({"status": "error", "message": "DigitalOcean token is required"});
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, &body),
            "HTTP 400: DigitalOcean token is required"
        );

        let body = json!({"error": "job not found"});
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, &body),
            "HTTP 404: job not found"
        );

        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, &Value::Null),
            "HTTP 502: Bad Gateway"
        );
    }

    #[test]
    fn test_terminal_statuses() {
        let job = |status: &str| JobView {
            job_id: "j".into(),
            status: status.into(),
            message: String::new(),
            details: None,
            updated_at: 0,
        };
        assert!(job("done").is_terminal());
        assert!(job("error").is_terminal());
        assert!(!job("running").is_terminal());
        assert!(!job("pending").is_terminal());
    }

    #[test]
    fn test_cli_parses_deploy() {
        let cli = Cli::try_parse_from([
            "tfdeploy",
            "--url",
            "http://d:8000",
            "deploy",
            "main.tf",
            "--no-wait",
        ])
        .unwrap();

        assert_eq!(cli.url, "http://d:8000");
        match cli.command {
            Commands::Deploy { file, no_wait, .. } => {
                assert_eq!(file, PathBuf::from("main.tf"));
                assert!(no_wait);
            }
            _ => panic!("expected deploy"),
        }
    }
}
