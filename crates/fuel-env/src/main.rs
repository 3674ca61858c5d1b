//! fuel-env - create and deploy a Fuel environment from a settings file.

mod cli;
mod output;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use fuel_env::{NailgunClient, Settings, deploy};
use nailgun_http::HttpClient;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.json_logs, cli.log_file.as_deref()) {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }

    if let Err(e) = run(&cli).await {
        error!(error = %format!("{:#}", e), "Deployment failed");
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    info!("Start service");
    let settings = Settings::load(&cli.settings)?;
    info!(?settings, "Used settings");

    let client =
        HttpClient::new(settings.client_config()?).context("Failed to create Nailgun client")?;
    let mut nailgun = NailgunClient::new(client);

    let deployment = deploy::run(&mut nailgun, &settings).await?;

    output::success(&format!("Deploying environment `{}`", settings.env_name));
    output::field("Cluster", &deployment.cluster_id.to_string());
    output::field("Nodes", &deployment.nodes.to_string());
    if let Some(task_id) = deployment.task_id {
        output::field("Task", &task_id.to_string());
    }
    Ok(())
}

fn init_logging(verbosity: u8, json: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        }
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
    Ok(())
}
