use clap::{Parser, Subcommand};
use docs_qa::commands::{ask_file, run_challenge, summarize_file};
use docs_qa::config::{run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docs-qa")]
#[command(about = "Summarize PDF and text documents, answer questions about them and quiz yourself")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the generation backend, embeddings and retrieval
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Summarize a .pdf or .txt document
    Summarize {
        /// Path to the document
        file: PathBuf,
        /// Target summary length in words (10-1000)
        #[arg(long, default_value_t = 150)]
        words: u32,
    },
    /// Ask a question about a document
    Ask {
        /// Path to the document
        file: PathBuf,
        /// The question to answer
        question: String,
    },
    /// Answer three generated comprehension questions and get feedback
    Challenge {
        /// Path to the document
        file: PathBuf,
        /// Answers in question order; missing answers are prompted for
        #[arg(long = "answer")]
        answers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Summarize { file, words } => {
            summarize_file(&file, words).await?;
        }
        Commands::Ask { file, question } => {
            ask_file(&file, &question).await?;
        }
        Commands::Challenge { file, answers } => {
            run_challenge(&file, answers).await?;
        }
    }

    Ok(())
}
