use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

mod config;
mod dashboard;
mod error;
mod opr;
mod pipeline;
mod prompt;
mod providers;

use config::{Command, Config};
use dashboard::AppState;
use pipeline::{OprCalculator, OprRequest};
use providers::{TheBlueAlliance, TheOrangeAlliance};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging (stderr, so reports on stdout stay clean)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let weighting = config.weighting_policy();
    let calculator = OprCalculator::new(config.season_fields())
        .with_source(
            Arc::new(TheBlueAlliance::new(&config.tba_api_url, config.http_timeout())?),
            config.tba_api_key.clone(),
        )
        .with_source(
            Arc::new(TheOrangeAlliance::new(&config.toa_api_url, config.http_timeout())?),
            config.toa_api_key.clone(),
        );

    match config.command.clone().unwrap_or(Command::Prompt) {
        Command::Prompt => {
            prompt::run(&calculator, weighting, tokio::io::stdin(), tokio::io::stdout()).await?;
        }
        Command::Calc {
            game,
            event,
            api_key,
        } => {
            let req = OprRequest {
                provider: game,
                event_key: event,
                api_key,
                weighting,
            };
            match calculator.calculate(&req).await {
                Ok(ratings) => println!("{}", ratings.report()),
                Err(e) => {
                    error!("OPR calculation failed: {:#}", e);
                    eprintln!("Error: {:#}", e);
                    eprintln!(
                        "Please ensure you have entered a valid {} API Key and Event Key.",
                        if game == providers::Provider::Tba { "TBA" } else { "TOA" }
                    );
                    std::process::exit(1);
                }
            }
        }
        Command::Serve => {
            let app = dashboard::router(AppState {
                calculator,
                weighting,
            });
            let addr: SocketAddr = config.dashboard_addr.parse()?;
            info!("OPR calculator listening on http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
