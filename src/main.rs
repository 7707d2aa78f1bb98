use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chatgate::app::App;
use chatgate::constants;
use chatgate::{chat, ui, Config, CredentialGate, FileStore};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Chat-completions endpoint.
    #[arg(long, global = true, env = "CHATGATE_API_URL", default_value = constants::DEFAULT_API_URL)]
    api_url: String,
    /// Model identifier sent with every request.
    #[arg(long, global = true, env = "CHATGATE_MODEL", default_value = constants::DEFAULT_MODEL)]
    model: String,
    /// JSON file holding the stored API key.
    #[arg(long, global = true, env = "CHATGATE_STORE", default_value = constants::DEFAULT_STORE_PATH.as_str())]
    store: PathBuf,
    /// Name shown next to assistant replies.
    #[arg(long, global = true, default_value = constants::DEFAULT_ASSISTANT_NAME)]
    assistant_name: String,
    /// Log file used by the terminal UI.
    #[arg(long, global = true, env = "CHATGATE_LOG_FILE", default_value = constants::DEFAULT_LOG_FILE.as_str())]
    log_file: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Open the full-screen chat (the default).
    Tui,
    /// Chat line by line on stdin/stdout.
    Chat,
    /// Store an API key without opening the chat.
    SetKey {
        #[arg(help = "The API key to store.")]
        key: String,
    },
    /// Forget the stored API key.
    Logout,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            api_url: self.api_url.clone(),
            model: self.model.clone(),
            store_path: self.store.clone(),
            assistant_name: self.assistant_name.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

// Stdout belongs to the terminal UI, so it logs to a file instead.
fn init_file_logging(log_file: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = log_file
        .file_name()
        .context("Log file path has no file name")?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatgate=debug")),
        )
        .init();
    Ok(guard)
}

fn init_stderr_logging() {
    // Reads log level from RUST_LOG (e.g., RUST_LOG=chatgate=debug)
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

fn load_gate(config: &Config) -> Result<CredentialGate> {
    CredentialGate::load(Box::new(FileStore::new(&config.store_path)))
        .with_context(|| format!("Failed to read store {}", config.store_path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (endpoint/model overrides)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.config();

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let _guard = init_file_logging(&config.log_file)?;
            info!(api_url = %config.api_url, model = %config.model, "Starting terminal UI");
            let gate = load_gate(&config)?;
            run_tui(App::new(config, gate)).await?;
        }
        Commands::Chat => {
            init_stderr_logging();
            let mut gate = load_gate(&config)?;
            let stdin = io::stdin();
            if gate.is_open() && stdin.is_terminal() {
                chat::prompt_for_key_masked(&mut gate)?;
            }
            chat::run_line_chat(&config, &mut gate, stdin.lock(), io::stdout())
                .await
                .context("Chat session failed")?;
        }
        Commands::SetKey { key } => {
            init_stderr_logging();
            let mut gate = load_gate(&config)?;
            if !gate.accept(&key).context("Failed to store the API key")? {
                bail!("API key must not be empty");
            }
            println!("API key saved to {}", config.store_path.display());
        }
        Commands::Logout => {
            init_stderr_logging();
            let mut gate = load_gate(&config)?;
            gate.forget().context("Failed to remove the API key")?;
            println!("API key removed from {}", config.store_path.display());
        }
    }

    Ok(())
}

async fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!("Terminal UI failed: {:?}", err);
    }
    info!("Terminal UI closed");
    res
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        // Fold in any reply that arrived since the last frame
        app.tick();

        terminal.draw(|f| ui::draw_ui(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key_event(key)?,
                Event::Paste(data) => app.handle_paste(&data),
                _ => {}
            }
        }
    }
}
