use colored::Colorize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use walletwealth_backend::api;
use walletwealth_backend::cli::{self, CLI};
use walletwealth_backend::config::AppConfig;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().flatten_event(true))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    dotenv::dotenv().ok();

    if let Err(e) = run().await {
        eprintln!("{}", format!("Application error: {}", e).red());
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let args: Vec<String> = std::env::args().collect();

    // No arguments: serve the HTTP API
    if args.len() == 1 {
        api::start_http_server(config).await?;
        return Ok(());
    }

    match args[1].as_str() {
        "appointments" => {
            cli::handle_appointments_command(&args[2..], &config).await?;
        }
        "help" => {
            CLI::print_header();
            CLI::print_help();
        }
        _ => {
            CLI::print_error("Unknown command. Use 'help' to see available commands.");
        }
    }

    Ok(())
}
