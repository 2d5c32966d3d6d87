use std::process::ExitCode;

use extstate::config::{load_config, print_schema};
use extstate::startup::run_from_env;
use extstate::utils::logger::init_logging;
use tracing::error;

const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    let arg = std::env::args().nth(1);

    if arg.as_deref() == Some("schema") {
        return match print_schema() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error printing schema: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let path = arg.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration from {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run_from_env(&config).await {
        Ok(document) => match serde_json::to_string_pretty(&document) {
            Ok(rendered) => {
                println!("{}", rendered);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to render output: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) if e.is_auth_failure() => {
            error!("{}. Set a fresh extension token in EXTENSION_TOKEN.", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
