use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;

use kyc_gateway::cache::{ConnectionCheck, RedisConnectionCheck};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operations CLI for the KYC gateway", long_about = None)]
struct Cli {
    /// Base URL of a running gateway.
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness probe (GET /health)
    Health,
    /// Readiness probe, re-checks the cache (GET /ready)
    Ready,
    /// Fetch the greeting page (GET /)
    Index,
    /// Run the startup cache check without starting the gateway
    CheckCache {
        #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
        cache_url: String,

        #[arg(long, default_value_t = 5)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let ok = match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_json(res).await?
        }
        Commands::Ready => {
            let res = client.get(format!("{}/ready", cli.url)).send().await?;
            print_json(res).await?
        }
        Commands::Index => {
            let res = client.get(format!("{}/", cli.url)).send().await?;
            let status = res.status();
            println!("{}", res.text().await?);
            status.is_success()
        }
        Commands::CheckCache {
            cache_url,
            timeout_secs,
        } => {
            let check =
                RedisConnectionCheck::from_url(&cache_url, Duration::from_secs(timeout_secs))?;
            match check.check_connection().await {
                Ok(()) => {
                    println!("{}: reachable", check.describe());
                    true
                }
                Err(e) => {
                    eprintln!("{}: {}", check.describe(), e);
                    false
                }
            }
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn print_json(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;
    if status.is_success() {
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("{}", serde_json::to_string_pretty(&json)?);
    }
    Ok(status.is_success())
}
