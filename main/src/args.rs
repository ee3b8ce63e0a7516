use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Answer questions about a profile knowledge base from the command line.
#[derive(Debug, Parser)]
#[command(name = "profile-chat", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Handle one trigger event per input line and print each response as JSON
    Invoke {
        /// File with newline-delimited events; stdin when omitted
        #[arg(long)]
        event: Option<PathBuf>,
    },
    /// Ask a single question and print the reply
    Ask {
        message: String,
    },
    /// Print the CORS preflight response
    Preflight,
    /// Load the knowledge base and summarize it
    Kb,
    /// Embed sample sentences to check the embedding backend
    Embeddings,
}
