mod args;

use std::path::Path;

use anyhow::Context;
use args::{Cli, Command};
use chat_handler::{
    error::HandlerError, handle, handle_options, ChatEvent, HandlerResponse, HandlerState,
};
use clap::Parser;
use common::utils::{config::get_config, embedding::embed_or_unavailable};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();

    // Get config
    let config = get_config().context("loading configuration")?;
    info!(
        embedding_backend = ?config.embedding_backend,
        knowledge_path = %config.knowledge_path,
        chat_model = %config.chat_model,
        "Configuration loaded"
    );

    let state = HandlerState::new(&config);

    match cli.command {
        Command::Invoke { event: Some(path) } => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("opening event file {}", path.display()))?;
            invoke_lines(&state, BufReader::new(file)).await
        }
        Command::Invoke { event: None } => {
            invoke_lines(&state, BufReader::new(tokio::io::stdin())).await
        }
        Command::Ask { message } => {
            let response = handle(&state, ChatEvent::from_message(&message)).await;
            print_reply(&response);
            Ok(())
        }
        Command::Preflight => print_response(&handle_options()),
        Command::Kb => {
            summarize_knowledge(&state, Path::new(&config.knowledge_path)).await;
            Ok(())
        }
        Command::Embeddings => {
            check_embeddings(&state).await;
            Ok(())
        }
    }
}

/// Handles newline-delimited events with one shared, warm state.
async fn invoke_lines<R>(state: &HandlerState, reader: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ChatEvent>(&line) {
            Ok(event) => handle(state, event).await,
            Err(err) => {
                warn!(error = %err, "Skipping undecodable event");
                HandlerError::InternalError(err.to_string()).into_response()
            }
        };
        print_response(&response)?;
    }

    Ok(())
}

fn print_response(response: &HandlerResponse) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(response)?);
    Ok(())
}

fn print_reply(response: &HandlerResponse) {
    let body = response.body_json().unwrap_or_default();
    if response.status_code == 200 {
        println!("{}", body["reply"].as_str().unwrap_or_default());
        println!(
            "Context used: {}",
            if body["context_used"].as_bool().unwrap_or(false) {
                "Yes"
            } else {
                "No"
            }
        );
    } else {
        println!(
            "Error ({}): {}",
            response.status_code,
            body["error"].as_str().unwrap_or("unknown error")
        );
    }
}

async fn summarize_knowledge(state: &HandlerState, path: &Path) {
    let entries = state.knowledge.load().await;
    println!(
        "Knowledge base at {} has {} entries",
        path.display(),
        entries.len()
    );
    for entry in entries.iter().take(3) {
        println!("- {}", entry.topic);
    }
    if entries.len() > 3 {
        println!("... and {} more entries", entries.len().saturating_sub(3));
    }
}

async fn check_embeddings(state: &HandlerState) {
    let samples = vec![
        "Julia is a product manager".to_string(),
        "She works at Amazon".to_string(),
    ];
    match embed_or_unavailable(state.embedder.as_ref(), samples).await {
        Some(vectors) => println!(
            "Embeddings generated successfully. Dimension: {}",
            vectors.first().map_or(0, Vec::len)
        ),
        None => println!("Failed to generate embeddings"),
    }
}
