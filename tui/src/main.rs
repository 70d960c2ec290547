//! Ragchat TUI Entry Point
//!
//! Usage:
//!   ragchat-tui [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>   Configuration file (default: ~/.config/ragchat/config.toml)
//!   --chat-url <URL>      Chat service base URL
//!   --upload-url <URL>    Ingestion service base URL
//!   --docs-url <URL>      Docs service base URL
//!
//! Logs go to `$XDG_CACHE_HOME/ragchat/tui.log`; the terminal belongs to the UI.

use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ragchat_core::{load_config, ChatStreamClient, ConfigOverrides, UploadStreamClient};
use ragchat_tui::App;

/// Ragchat TUI - chat with your documents in the terminal
#[derive(Parser, Debug)]
#[command(name = "ragchat-tui")]
#[command(author, version, about, long_about = None)]
struct Args {
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
}

/// Log to a file under the cache directory
///
/// Logging is skipped when no cache directory is available.
fn init_logging() -> anyhow::Result<()> {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("ragchat")) else {
        return Ok(());
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file = std::fs::File::create(dir.join("tui.log"))
        .with_context(|| format!("Failed to create log file in {}", dir.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    Ok(())
}

type CrosstermTerminal = Terminal<CrosstermBackend<io::Stdout>>;

fn has_tty() -> bool {
    use std::io::IsTerminal;
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

/// Enter raw mode on the alternate screen, restoring it on panic
fn setup_terminal() -> anyhow::Result<CrosstermTerminal> {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut CrosstermTerminal) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging()?;

    if !has_tty() {
        eprintln!("Error: ragchat-tui requires a terminal (TTY)");
        eprintln!("Use the `ragchat` command for non-interactive use.");
        std::process::exit(1);
    }

    let overrides = ConfigOverrides {
        config_path: args.config,
        chat_url: args.chat_url,
        upload_url: args.upload_url,
        docs_url: args.docs_url,
    };
    let config = load_config(&overrides).context("Failed to load configuration")?;
    tracing::info!(source = %config.source(), "Configuration loaded");

    let chat = Arc::new(ChatStreamClient::from_config(&config)?);
    let upload = Arc::new(UploadStreamClient::from_config(&config)?);
    let mut app = App::new(chat, upload, config.docs_base_url.clone());

    let mut terminal = setup_terminal()?;
    let result = app.run(&mut terminal).await;
    restore_terminal(&mut terminal)?;

    if result.is_ok() {
        println!("{} turns this session.", app.store().turn_count());
    }
    result
}
