mod app;
mod config;
mod form;
mod item;
mod nav;
mod notify;
mod store;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use config::AppConfig;
use item::{ItemId, ItemType};
use nav::Route;
use store::{ItemService, JsonStore};

#[derive(Parser, Debug)]
#[command(name = "stockbook")]
#[command(version)]
#[command(about = "A terminal-friendly inventory item editor for small shops")]
struct Args {
    /// Item store file (overrides the config)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Config file to use instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print all items as JSON and exit
    #[arg(short, long)]
    list: bool,

    /// Open straight into the new item form
    #[arg(short, long, conflicts_with = "edit")]
    new: bool,

    /// With --new: create a service instead of a product
    #[arg(long, requires = "new")]
    service: bool,

    /// Open straight into the edit form for an item id
    #[arg(short, long)]
    edit: Option<ItemId>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load().unwrap_or_default(),
    };

    let store_path = match args.store.clone().or_else(|| config.store_path.clone()) {
        Some(path) => path,
        None => JsonStore::default_path()?,
    };

    init_logging(&store_path);
    tracing::info!("Using item store {}", store_path.display());

    let store = JsonStore::new(store_path);

    // Handle CLI-only commands
    if args.list {
        return print_items(&store).await;
    }

    let initial = if args.new {
        Some(Route::NewItem(if args.service {
            ItemType::Service
        } else {
            ItemType::Product
        }))
    } else {
        args.edit.map(Route::EditItem)
    };

    run_tui(config, Arc::new(store), initial).await
}

/// Log to `stockbook.log` next to the store; the terminal belongs to the TUI
fn init_logging(store_path: &std::path::Path) {
    let log_path = store_path
        .parent()
        .map(|dir| dir.join("stockbook.log"))
        .unwrap_or_else(|| PathBuf::from("stockbook.log"));

    if let Some(dir) = log_path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    match file {
        Ok(file) => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::sink))
            .init(),
    }
}

async fn print_items(store: &JsonStore) -> Result<()> {
    let items = store
        .list_items()
        .await
        .with_context(|| format!("Could not read {}", store.path().display()))?;
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

async fn run_tui(config: AppConfig, service: Arc<dyn ItemService>, initial: Option<Route>) -> Result<()> {
    ui::init_theme(&config.theme);

    // Create app state before touching the terminal so load errors print normally
    let mut app = App::new(config, service).await?;
    if let Some(route) = initial {
        app.open(route);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // Handle key and catch any errors to prevent crashes
                    if let Err(e) = app.handle_key(key).await {
                        tracing::error!("Key handling failed: {}", e);
                        app.status.show(format!("Error: {}", e), notify::Level::Error);
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }

        // Deliver finished saves, refresh the list, expire status
        app.tick().await?;
    }
}
