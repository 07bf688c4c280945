use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use api_versioning::admin::handlers::summarize;
use api_versioning::config::{build_registry, load_config};
use api_versioning::demo;
use api_versioning::versioning::filter::filter_for_endpoint;
use api_versioning::versioning::{resolve, Change, Endpoint};

#[derive(Parser)]
#[command(name = "versions-cli")]
#[command(about = "Inspect API version registries, locally or on a running server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and print its registry
    Check { config: PathBuf },
    /// Print the changes a request would go through
    Resolve {
        config: PathBuf,
        #[arg(long = "version")]
        version: String,
        #[arg(long)]
        handler: String,
        #[arg(long)]
        action: String,
    },
    /// List the versions a running server knows
    Versions,
    /// Check server status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            let registry = build_registry(&config, &demo::catalog()?)?;
            println!("{}", serde_json::to_string_pretty(&summarize(&registry))?);
        }
        Commands::Resolve {
            config,
            version,
            handler,
            action,
        } => {
            let config = load_config(&config)?;
            let registry = build_registry(&config, &demo::catalog()?)?;
            let endpoint = Endpoint::new(handler, action);

            let chain = filter_for_endpoint(resolve(&registry, Some(version.as_str()))?, Some(&endpoint));
            println!("endpoint: {}", endpoint);
            println!("request order:  {}", ids(chain.iter()));
            println!("response order: {}", ids(chain.iter().rev()));
        }
        Commands::Versions => admin_get(&cli.url, &cli.key, "versions").await?,
        Commands::Status => admin_get(&cli.url, &cli.key, "status").await?,
    }

    Ok(())
}

fn ids<'a>(chain: impl Iterator<Item = &'a Arc<dyn Change>>) -> String {
    let ids: Vec<&str> = chain.map(|change| change.id()).collect();
    if ids.is_empty() {
        "(none)".to_string()
    } else {
        ids.join(" → ")
    }
}

async fn admin_get(url: &str, key: &str, resource: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);

    let res = client
        .get(format!("{}/admin/{}", url, resource))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
