//! CLI entry point for autochat

mod chat;
mod tui;

use anyhow::Result;
use autochat_core::config::{Config, ConfigLoader};
use autochat_core::logging::{init_logging, WorkerGuard};
use autochat_core::{ChatTranscript, ChatView, NewSessionPolicy, Sender, SessionStore};
use autochat_providers::{payload_from_data_uri, ChatProvider, GeminiClient};
use chat::{handle_send, PendingImage};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "autochat")]
#[command(about = "Automotive assistant chat with persistent session history")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize autochat configuration
    Onboard,
    /// Launch the interactive chat
    Chat {
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Send a single message and print the reply
    Send {
        /// Message to send
        #[arg(short, long)]
        message: Option<String>,
        /// Image file to attach
        #[arg(short, long)]
        image: Option<PathBuf>,
        /// Model to use
        #[arg(long)]
        model: Option<String>,
    },
    /// Browse stored sessions
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Show status information
    Status,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List sessions that have messages
    List,
    /// Print one session
    Show {
        /// Session number as shown by `history list`
        number: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    match cli.command {
        Commands::Onboard => {
            run_onboard(&config_loader).await?;
        }
        Commands::Chat { model } => {
            // The TUI owns the terminal, so logs go to the file only.
            let (config, _log_guard) = load_config(&config_loader, false)?;
            info!("Starting chat");
            run_chat(&config, model).await?;
        }
        Commands::Send {
            message,
            image,
            model,
        } => {
            let (config, _log_guard) = load_config(&config_loader, true)?;
            if message.is_none() && image.is_none() {
                println!("Use --message and/or --image to send something");
                println!("Example: autochat send --message 'What does this light mean?'");
            } else {
                run_send(&config, message.unwrap_or_default(), image, model).await?;
            }
        }
        Commands::History { command } => {
            let (config, _log_guard) = load_config(&config_loader, true)?;
            match command {
                HistoryCommands::List => run_history_list(&config),
                HistoryCommands::Show { number } => run_history_show(&config, number)?,
            }
        }
        Commands::Status => {
            let (config, _log_guard) = load_config(&config_loader, true)?;
            run_status(&config_loader, &config);
        }
    }

    Ok(())
}

/// Load the configuration and start logging for a command that needs both
fn load_config(loader: &ConfigLoader, console: bool) -> Result<(Config, WorkerGuard)> {
    let config = loader.load()?;
    let guard = init_logging(&config.logging, console);
    Ok((config, guard))
}

fn build_provider(config: &Config, model: Option<String>) -> Result<GeminiClient> {
    let mut provider_config = config.provider.clone();
    if let Some(model) = model {
        provider_config.model = model;
    }
    Ok(GeminiClient::from_config(&provider_config)?)
}

/// Interactive setup wizard
async fn run_onboard(loader: &ConfigLoader) -> Result<()> {
    println!("{}", style("Welcome to autochat!").bold().cyan());
    println!("Let's set up your configuration.\n");

    let config_path = loader.config_path();
    if config_path.exists() {
        let overwrite = Confirm::new()
            .with_prompt("Configuration already exists. Overwrite?")
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Onboard cancelled.");
            return Ok(());
        }
    }

    let mut config = Config::default();

    config.provider.api_key = Password::new()
        .with_prompt("Enter your Gemini API key")
        .interact()?;

    config.provider.model = Input::new()
        .with_prompt("Enter the model to use")
        .default(config.provider.model.clone())
        .interact_text()?;

    config.storage.dir = Input::new()
        .with_prompt("Where should chat history be stored?")
        .default(config.storage.dir.clone())
        .interact_text()?;

    let policies = [
        "Open a new session every time a chat starts",
        "Reuse the last session while it is still empty",
    ];
    let policy_idx = Select::new()
        .with_prompt("Session policy")
        .items(&policies)
        .default(0)
        .interact()?;
    config.storage.new_session = if policy_idx == 0 {
        NewSessionPolicy::Always
    } else {
        NewSessionPolicy::WhenLastNonEmpty
    };

    loader.save(&config)?;
    std::fs::create_dir_all(config.storage.resolved_dir())?;

    println!(
        "\n{}",
        style("Configuration saved successfully!").green().bold()
    );
    println!("Config location: {}", config_path.display());
    println!("\nYou can now run:");
    println!("  {} - Start chatting", style("autochat chat").cyan());
    println!(
        "  {} - Send a single message",
        style("autochat send --message 'Hello!'").cyan()
    );

    Ok(())
}

async fn run_chat(config: &Config, model: Option<String>) -> Result<()> {
    let provider = build_provider(config, model)?;
    let store = config.open_session_store();
    tui::run(store, &provider, &config.provider.fallback_reply).await
}

async fn run_send(
    config: &Config,
    message: String,
    image: Option<PathBuf>,
    model: Option<String>,
) -> Result<()> {
    let provider = build_provider(config, model)?;

    let mut pending = PendingImage::default();
    if let Some(path) = image {
        if let Err(e) = pending.load(&path).await {
            error!("Image load failed: {}", e);
            anyhow::bail!("Failed to load image {}: {}", path.display(), e);
        }
    }

    let store = config.open_session_store();
    store.initialize_session()?;
    let mut view = ChatView::new(store, ChatTranscript::new());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!("Asking {}...", provider.model()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let reply = handle_send(
        &mut view,
        &provider,
        &mut pending,
        &message,
        &config.provider.fallback_reply,
    )
    .await;
    spinner.finish_and_clear();

    if let Some(reply) = reply {
        println!("{}", style("Response:").bold());
        println!("{}", reply);
    }
    Ok(())
}

fn run_history_list(config: &Config) {
    let store = config.open_session_store();
    let summaries = store.list_session_summaries();

    println!("{}", style("Chat History").bold().cyan());
    if summaries.is_empty() {
        println!("  No saved sessions.");
        return;
    }
    for summary in summaries {
        println!("  {}", summary.label());
    }
}

fn run_history_show(config: &Config, number: usize) -> Result<()> {
    let store = config.open_session_store();
    let Some(session) = number.checked_sub(1).and_then(|index| store.get_session(index)) else {
        anyhow::bail!("Session {} not found", number);
    };

    println!("{}", style(format!("Session {}", number)).bold().cyan());
    for message in session.messages() {
        let label = match message.sender {
            Sender::User => style("you").cyan(),
            Sender::Bot => style("bot").green(),
        };
        if message.is_image {
            let bytes = payload_from_data_uri(&message.text).map_or(0, str::len);
            println!("  [{}] [image, {} base64 chars]", label, bytes);
        } else {
            println!("  [{}] {}", label, message.text);
        }
    }
    Ok(())
}

fn run_status(loader: &ConfigLoader, config: &Config) {
    println!("{}", style("autochat Status").bold().cyan());
    println!("Version: {}\n", env!("CARGO_PKG_VERSION"));

    println!("{}", style("Configuration:").bold());
    println!("  Config file: {}", loader.config_path().display());
    println!("  Model: {}", config.provider.model);
    let key_status = if config.provider.api_key.is_empty() {
        style("not configured").red()
    } else {
        style("configured").green()
    };
    println!("  API key: {}", key_status);
    println!();

    println!("{}", style("Storage:").bold());
    let store: SessionStore = config.open_session_store();
    let sessions = store.sessions();
    let non_empty = sessions.iter().filter(|s| !s.is_empty()).count();
    println!(
        "  File: {}",
        config
            .storage
            .resolved_dir()
            .join(autochat_core::session::storage::STORAGE_FILE)
            .display()
    );
    println!("  Key: {}", config.storage.key);
    println!(
        "  Sessions: {} ({} with messages)",
        sessions.len(),
        non_empty
    );
    println!("  Logs: {}", config.logging.resolved_dir().display());
}
