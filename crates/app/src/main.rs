//! QuoteConnect - command-line entry point.

use std::process::ExitCode;

use clap::Parser;
use quoteconnect::{Cli, run};
use quoteconnect_domain::NotificationLevel;
use quoteconnect_infrastructure::AppConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = cli.apply(AppConfig::from_env());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let report = run(&config, &cli.command).await;

    for notification in &report.notifications {
        let marker = match notification.level {
            NotificationLevel::Success => "+",
            NotificationLevel::Info => "*",
            NotificationLevel::Error => "!",
        };
        eprintln!("{marker} {}: {}", notification.title, notification.description);
    }

    match report.result {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
