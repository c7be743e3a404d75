use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::session::{DocumentStore, SummaryOutcome};

/// Upload a file and print its summary
#[inline]
pub async fn summarize_file(path: &Path, words: u32) -> Result<()> {
    let store = open_store()?;
    let (bytes, filename) = read_document(path)?;

    let bar = spinner(format!("Summarizing {}", filename));
    let response = store.upload(bytes, &filename, words).await;
    bar.finish_and_clear();
    let response = response?;

    match response.summary {
        SummaryOutcome::Generated { text } => {
            eprintln!("{}", style(format!("Summary of {}", filename)).bold().cyan());
            println!("{}", text);
        }
        SummaryOutcome::Unavailable { kind, message } => {
            eprintln!(
                "{} {}",
                style(format!("Summary unavailable ({}):", kind)).red(),
                message
            );
        }
    }

    Ok(())
}

/// Upload a file and answer one question about it
#[inline]
pub async fn ask_file(path: &Path, question: &str) -> Result<()> {
    let store = open_store()?;
    let document_id = ingest(&store, path).await?;

    let bar = spinner("Thinking".to_string());
    let response = store.ask(document_id, question).await;
    bar.finish_and_clear();

    println!("{}", response?.answer);
    Ok(())
}

/// Upload a file, quiz the user with generated questions and print feedback.
///
/// Answers given on the command line are used in order; the rest are asked for
/// interactively when stdin is a terminal.
#[inline]
pub async fn run_challenge(path: &Path, answers: Vec<String>) -> Result<()> {
    let store = open_store()?;
    let document_id = ingest(&store, path).await?;

    let bar = spinner("Writing questions".to_string());
    let challenge = store.generate_challenges(document_id).await;
    bar.finish_and_clear();
    let questions = challenge?.questions;

    if questions.is_empty() {
        eprintln!("{}", style("No questions could be generated for this document.").yellow());
        return Ok(());
    }

    let answers = collect_answers(&questions, answers)?;

    let bar = spinner("Evaluating answers".to_string());
    let batch = store.evaluate_all(document_id, answers).await;
    bar.finish_and_clear();
    let batch = batch?;

    for outcome in &batch.results {
        eprintln!();
        eprintln!(
            "{} {}",
            style(format!("Q{}:", outcome.question_index + 1)).bold().yellow(),
            outcome.question
        );
        eprintln!("  Your answer: {}", style(&outcome.answer).cyan());
        if outcome.error.is_some() {
            println!("  {}", style(&outcome.feedback).red());
        } else {
            println!("  {}", outcome.feedback);
        }
    }

    info!(
        "Challenge finished with {} of {} evaluations failed",
        batch.failed(),
        batch.results.len()
    );
    Ok(())
}

fn collect_answers(questions: &[String], mut answers: Vec<String>) -> Result<Vec<String>> {
    answers.truncate(questions.len());
    let interactive = std::io::stdin().is_terminal();

    for (i, question) in questions.iter().enumerate().skip(answers.len()) {
        if !interactive {
            break;
        }
        let answer: String = Input::new()
            .with_prompt(format!("Q{}: {}", i + 1, question))
            .allow_empty(true)
            .interact_text()
            .context("Failed to read answer")?;
        answers.push(answer);
    }

    Ok(answers)
}

fn open_store() -> Result<DocumentStore> {
    let config = Config::load_default().context("Failed to load configuration")?;
    if !config.generation.has_api_key() {
        eprintln!(
            "{} set {} or add it to a .env file",
            style("No API key found:").yellow(),
            config.generation.api_key_env
        );
    }
    DocumentStore::from_config(&config).context("Failed to initialize document store")
}

async fn ingest(store: &DocumentStore, path: &Path) -> Result<Uuid> {
    let (bytes, filename) = read_document(path)?;

    let bar = spinner(format!("Indexing {}", filename));
    let document_id = store.ingest(bytes, &filename).await;
    bar.finish_and_clear();

    Ok(document_id?)
}

fn read_document(path: &Path) -> Result<(Vec<u8>, String)> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file path: {}", path.display()))?;
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((bytes, filename))
}

fn spinner(message: String) -> ProgressBar {
    if console::user_attended_stderr() {
        let bar = ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .expect("style template is valid"),
        );
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    } else {
        ProgressBar::hidden()
    }
}
