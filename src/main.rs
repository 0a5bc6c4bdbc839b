use std::path::PathBuf;

use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use tracing::{error, info, warn};

mod config;
mod fdi;
mod handlers;
mod llm;
mod preview;
mod utils;

use config::CONFIG;
use preview::{run_compose, ComposeArgs};
use utils::logging::{init_cli_logging, init_logging};

fn compose_usage() -> &'static str {
    "Usage: fdi-transform compose --input <form.json> [--scores-only]"
}

fn parse_compose_args(args: &[String]) -> Result<Option<ComposeArgs>> {
    if args.get(1).map(|value| value.as_str()) != Some("compose") {
        return Ok(None);
    }

    let mut input_path: Option<PathBuf> = None;
    let mut scores_only = false;

    let mut index = 2;
    while index < args.len() {
        match args[index].as_str() {
            "--input" | "-i" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --input"))?;
                input_path = Some(PathBuf::from(value));
            }
            "--scores-only" => {
                scores_only = true;
            }
            "--help" | "-h" => {
                return Err(anyhow!(compose_usage()));
            }
            other => {
                return Err(anyhow!(
                    "Unknown compose argument: {other}\n{}",
                    compose_usage()
                ));
            }
        }
        index += 1;
    }

    let input_path = input_path.ok_or_else(|| anyhow!("--input is required\n{}", compose_usage()))?;
    Ok(Some(ComposeArgs {
        input_path,
        scores_only,
    }))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if let Some(compose_args) = parse_compose_args(&args)? {
        init_cli_logging();
        let output = run_compose(&compose_args)?;
        println!("{output}");
        return Ok(());
    }

    let _guards = init_logging();
    info!("Starting FDI transformation service");
    if CONFIG.gemini_api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set; generation requests will fail until it is configured");
    }

    let listener = tokio::net::TcpListener::bind(CONFIG.bind_addr).await?;
    info!(
        addr = %CONFIG.bind_addr,
        model = %CONFIG.gemini_image_model,
        "Listening for transformation requests"
    );

    axum::serve(listener, handlers::generate::router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
