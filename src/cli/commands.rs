use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `docqa` - ask questions about a single document, answered by Gemini with
/// automatic failover to an OpenAI-compatible provider.
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(version)]
#[command(about = "Single-document question answering with provider failover.", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk, embed and store a document (defaults to DOC_PATH)
    Ingest {
        /// Path to a UTF-8 text document
        path: Option<PathBuf>,
    },

    /// Ask one question and print the answer
    Ask {
        /// The question
        question: String,

        /// Document id (file stem) to query; defaults to DOC_PATH's
        #[arg(short, long)]
        document: Option<String>,
    },

    /// Serve the chat HTTP API
    Serve {
        /// Bind address (default from config: 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Port (default from config: 7860)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show resolved configuration and ingested documents
    Status,
}
