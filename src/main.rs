mod cli;
mod config;
mod gemini_client;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::session::SessionController;
use crate::cli::chat::{ChatContext, ChatOptions};
use crate::config::Settings;
use crate::gemini_client::{CompletionClient, GeminiClient};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Your first name (skips the welcome form)
    #[arg(short, long)]
    name: Option<String>,

    /// Your region or state in Nigeria
    #[arg(short, long, requires = "name")]
    region: Option<String>,

    /// Ask a single question and exit
    #[arg(short, long, requires = "name")]
    input: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    // No input is accepted without a credential.
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("⚠️ {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    info!(model = %settings.model, "Starting FarmAssist");

    let client = GeminiClient::new(&settings)?;
    let session = SessionController::new(CompletionClient::new(client));

    let interactive = cli.input.is_none();
    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        ChatOptions {
            name: cli.name,
            region: cli.region,
            input: cli.input,
            interactive,
        },
        session,
    );
    chat_context.run().await
}
