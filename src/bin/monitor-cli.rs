use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "monitor-cli")]
#[command(about = "Management CLI for the service monitor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "MONITOR_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show monitor status and any system error
    Status,
    /// List every service with its state and recent history
    Services,
    /// Run a check cycle now
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = match cli.command {
        Commands::Status => {
            client.get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Services => {
            let res = client.get(format!("{}/admin/services", cli.url))
                .headers(headers)
                .send()
                .await?;
            return print_services(res).await;
        }
        Commands::Check => {
            client.post(format!("{}/admin/check", cli.url))
                .headers(headers)
                .send()
                .await?
        }
    };

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

/// One line per service; a system error replaces the list.
async fn print_services(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        return print_response(res).await;
    }

    let report: Value = res.json().await?;
    if let Some(error) = report["system_error"].as_str() {
        println!("SYSTEM ERROR: {}", error);
        return Ok(());
    }

    let services = report["services"].as_array().cloned().unwrap_or_default();
    if services.is_empty() {
        println!("No services checked yet");
    }
    for service in services {
        let history: String = service["history"]
            .as_array()
            .map(|h| {
                h.iter()
                    .map(|e| if e["status"] == "ok" { 'O' } else { 'X' })
                    .collect()
            })
            .unwrap_or_default();
        println!(
            "{:<24} {:<8} {:<10} {}",
            service["name"].as_str().unwrap_or("?"),
            service["display_status"].as_str().unwrap_or("?"),
            history,
            service["message"].as_str().unwrap_or(""),
        );
    }
    Ok(())
}
