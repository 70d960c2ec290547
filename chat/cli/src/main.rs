//! Ragchat CLI - Ask questions and upload documents from a terminal
//!
//! # Usage
//!
//! ```bash
//! # One question
//! ragchat ask "Thủ tục cấp hộ chiếu là gì?"
//!
//! # Ingest documents
//! ragchat upload handbook.pdf faq.docx
//!
//! # Interactive session (default)
//! ragchat repl
//!
//! # Point at a local stack
//! ragchat --chat-url http://localhost:8000 --upload-url http://localhost:8001 repl
//!
//! # Verbose logging (stderr)
//! RUST_LOG=debug ragchat ask "..."
//! ```
//!
//! Inside the REPL, `/history` prints every committed turn, `/upload <paths>`
//! ingests documents and `/quit` exits.

mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tracing::{debug, info};

use ragchat_core::backend::load_files;
use ragchat_core::{
    load_config, prepare_query, ActiveChat, ActiveUpload, ChatStreamClient, ClientConfig,
    ConfigOverrides, ConversationStore, UploadState, UploadStreamClient,
};
use render::{format_history, source_line, ChatPrinter, UploadPrinter};

/// Ragchat - streaming question answering over your documents
#[derive(Parser, Debug)]
#[command(name = "ragchat")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "RAGCHAT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Chat service base URL (replaces the RunPod-derived URL)
    #[arg(long, value_name = "URL")]
    chat_url: Option<String>,

    /// Ingestion service base URL
    #[arg(long, value_name = "URL")]
    upload_url: Option<String>,

    /// Docs service base URL used for source links
    #[arg(long, value_name = "URL")]
    docs_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "RAGCHAT_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Ask a single question and stream the answer
    Ask {
        /// The question (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Upload documents to the ingestion service
    Upload {
        /// Files to upload
        #[arg(required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Interactive session
    Repl,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            chat_url: self.chat_url.clone(),
            upload_url: self.upload_url.clone(),
            docs_url: self.docs_url.clone(),
        }
    }
}

/// Initialize logging on stderr so stdout carries only answers
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("ragchat={level},ragchat_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Everything a command needs
struct Clients {
    chat: ChatStreamClient,
    upload: UploadStreamClient,
    docs_base_url: String,
}

impl Clients {
    fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            chat: ChatStreamClient::from_config(config)?,
            upload: UploadStreamClient::from_config(config)?,
            docs_base_url: config.docs_base_url.clone(),
        })
    }
}

async fn write_out(stdout: &mut Stdout, text: &str) -> Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

/// Ask one question, streaming the answer to stdout
async fn ask(
    clients: &Clients,
    store: &mut ConversationStore,
    stdout: &mut Stdout,
    question: &str,
) -> Result<()> {
    let Some(query) = prepare_query(question) else {
        return Ok(());
    };

    let mut printer = ChatPrinter::new();
    let mut chat = ActiveChat::start(&clients.chat, &query).await;
    while let Some(updates) = chat.next_updates().await {
        for update in &updates {
            if let Some(text) = printer.render(update) {
                write_out(stdout, &text).await?;
            }
        }
    }

    if let Some(index) = chat.finish(store) {
        let turn = store.get_turn(index)?;
        if let Some(line) = source_line(&turn, &clients.docs_base_url) {
            write_out(stdout, &line).await?;
        }
    }
    Ok(())
}

/// Upload files, printing progress as it arrives
async fn upload(clients: &Clients, stdout: &mut Stdout, paths: &[PathBuf]) -> Result<UploadState> {
    let files = load_files(paths).await?;
    info!(count = files.len(), "Uploading files");

    let printer = UploadPrinter;
    let mut upload = ActiveUpload::start(&clients.upload, files).await;
    while let Some(updates) = upload.next_updates().await {
        for update in &updates {
            if let Some(text) = printer.render(update) {
                write_out(stdout, &text).await?;
            }
        }
    }
    Ok(upload.progress().state())
}

/// A parsed REPL input line
#[derive(Debug, PartialEq, Eq)]
enum ReplInput {
    Question(String),
    History,
    Upload(Vec<PathBuf>),
    Quit,
    Help,
    Empty,
}

fn parse_repl_line(line: &str) -> ReplInput {
    let Some(query) = prepare_query(line) else {
        return ReplInput::Empty;
    };

    let Some(command) = query.strip_prefix('/') else {
        return ReplInput::Question(query);
    };
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("history") => ReplInput::History,
        Some("quit" | "exit") => ReplInput::Quit,
        Some("upload") => {
            let paths: Vec<PathBuf> = parts.map(PathBuf::from).collect();
            if paths.is_empty() {
                ReplInput::Help
            } else {
                ReplInput::Upload(paths)
            }
        }
        _ => ReplInput::Help,
    }
}

const REPL_HELP: &str = "Commands: /history, /upload <paths...>, /quit. Anything else is a question.\n";

async fn repl(clients: &Clients, stdout: &mut Stdout) -> Result<()> {
    let mut store = ConversationStore::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    write_out(stdout, REPL_HELP).await?;
    loop {
        write_out(stdout, "> ").await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_repl_line(&line) {
            ReplInput::Empty => {}
            ReplInput::Quit => break,
            ReplInput::Help => write_out(stdout, REPL_HELP).await?,
            ReplInput::History => {
                write_out(stdout, &format_history(&store, &clients.docs_base_url)).await?;
            }
            ReplInput::Upload(paths) => {
                if let Err(e) = upload(clients, stdout, &paths).await {
                    write_out(stdout, &format!("Upload failed: {e:#}\n")).await?;
                }
            }
            ReplInput::Question(question) => ask(clients, &mut store, stdout, &question).await?,
        }
    }

    debug!(turns = store.turn_count(), "Leaving REPL");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = load_config(&args.overrides()).context("Failed to load configuration")?;
    info!(source = %config.source(), "Configuration loaded");
    let clients = Clients::from_config(&config)?;
    let mut stdout = tokio::io::stdout();

    match args.command.unwrap_or(Command::Repl) {
        Command::Ask { question } => {
            let mut store = ConversationStore::new();
            ask(&clients, &mut store, &mut stdout, &question.join(" ")).await?;
        }
        Command::Upload { files } => {
            let state = upload(&clients, &mut stdout, &files).await?;
            if state != UploadState::Complete {
                anyhow::bail!("Upload did not complete ({})", state.description());
            }
        }
        Command::Repl => repl(&clients, &mut stdout).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repl_line() {
        assert_eq!(parse_repl_line("   "), ReplInput::Empty);
        assert_eq!(
            parse_repl_line("  Xin chào  "),
            ReplInput::Question("Xin chào".to_string())
        );
        assert_eq!(parse_repl_line("/history"), ReplInput::History);
        assert_eq!(parse_repl_line("/quit"), ReplInput::Quit);
        assert_eq!(
            parse_repl_line("/upload a.pdf b.txt"),
            ReplInput::Upload(vec![PathBuf::from("a.pdf"), PathBuf::from("b.txt")])
        );
        assert_eq!(parse_repl_line("/upload"), ReplInput::Help);
        assert_eq!(parse_repl_line("/what"), ReplInput::Help);
    }

    #[test]
    fn test_args_parse_ask() {
        let args = Args::try_parse_from(["ragchat", "ask", "how", "are", "you"]).unwrap();
        assert_eq!(
            args.command,
            Some(Command::Ask {
                question: vec!["how".to_string(), "are".to_string(), "you".to_string()]
            })
        );
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::try_parse_from([
            "ragchat",
            "--chat-url",
            "http://localhost:8000",
            "--docs-url",
            "http://localhost:8002",
            "upload",
            "a.pdf",
        ])
        .unwrap();
        let overrides = args.overrides();
        assert_eq!(overrides.chat_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(overrides.docs_url.as_deref(), Some("http://localhost:8002"));
        assert_eq!(overrides.upload_url, None);
    }

    #[test]
    fn test_upload_requires_files() {
        assert!(Args::try_parse_from(["ragchat", "upload"]).is_err());
    }
}
