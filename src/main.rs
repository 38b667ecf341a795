use std::process::ExitCode;

use clap::{Parser, Subcommand};
use enrolment_assistant::Result;
use enrolment_assistant::commands::{ask_question, load_config, run_chat, run_index, show_status};
use enrolment_assistant::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "enrolment-assistant")]
#[command(about = "Question answering over course enrolment documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the service endpoint, models and chunking
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Build the knowledge index from the documents directory
    Index,
    /// Start an interactive chat session
    Chat,
    /// Answer a single question and exit
    Ask {
        /// The question to answer
        question: String,
    },
    /// Show configuration, index and service status
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Index => {
            let config = load_config()?;
            if run_index(&config).await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Chat => {
            run_chat(&load_config()?).await?;
        }
        Commands::Ask { question } => {
            if !ask_question(&load_config()?, &question).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Status => {
            show_status(&load_config()?).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
