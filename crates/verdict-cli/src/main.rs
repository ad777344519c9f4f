use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;
use verdict_client::GraphQLClient;
use verdict_common::log_if_error;
use verdict_common::monitoring::{Fmt, Metric};

use crate::command::{command_request, ConnectionParameters, Operation, RequestParameters};

mod command;
mod configuration;

#[derive(Error, Debug)]
pub enum Error {
    #[error("CLI configuration error: {0}")]
    Configuration(String),
    #[error("CLI validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Client(#[from] verdict_client::Error),
    #[error(transparent)]
    Monitoring(#[from] verdict_common::Error),
}

#[derive(Parser)]
#[command(name = "verdict")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    connection: ConnectionParameters,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Send a query and print the extracted data")]
    Query(RequestParameters),

    #[command(about = "Send a mutation and print the extracted payload")]
    Mutate(RequestParameters),
}

#[tokio::main]
async fn main() -> Result<ExitCode, Error> {
    let cli = Cli::parse();
    let configuration = cli.connection.configuration()?;

    let metric_layer = configuration.monitoring.as_ref().map(Metric::layer).transpose()?;
    let fmt_layer = Fmt::layer(&configuration.verbosity);

    let subscriber = Registry::default().with(fmt_layer).with(metric_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(|e| Error::Configuration(e.to_string()))?;

    let client = log_if_error!(configuration.client().and_then(|c| GraphQLClient::new(&c).map_err(Error::from)))?;

    let (operation, request) = match cli.command {
        Commands::Query(request) => (Operation::Query, request),
        Commands::Mutate(request) => (Operation::Mutation, request),
    };

    let (output, code) = match log_if_error!(command_request(operation, request, &client).await)? {
        Ok(value) => (serde_json::to_string_pretty(&value), ExitCode::SUCCESS),
        Err(failure) => (serde_json::to_string_pretty(&failure), ExitCode::FAILURE),
    };

    match output {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("could not render output: {}", e);
            return Ok(ExitCode::FAILURE);
        },
    }

    Ok(code)
}
