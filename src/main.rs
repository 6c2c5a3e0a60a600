mod host;
mod map_draw;
mod state;
mod ui;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{fs::File, io, path::PathBuf, sync::Mutex, time::{Duration, Instant}};
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

use host::TerminalHost;
use property_atlas::{
    data::{scatter_properties, thailand, DataCache},
    MapConfig, PropertyMap,
};
use state::AppState;

/// Terminalowa przeglądarka ofert na mapie
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Katalog z danymi (oferty i granice prowincji)
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Plik konfiguracji mapy (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Plik ofert w katalogu danych; bez niego generowane są dane demonstracyjne
    #[arg(long)]
    properties: Option<String>,
    #[arg(long, default_value = "provinces.geojson")]
    boundaries: String,
    /// Liczba ofert demonstracyjnych
    #[arg(long, default_value_t = 500)]
    count: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value = "property_atlas.log")]
    log_file: PathBuf,
}

fn init_logging(path: &PathBuf) -> io::Result<()> {
    // terminal należy do TUI, więc logi idą do pliku
    let file = File::create(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let config = match &cli.config {
        Some(path) => MapConfig::from_file(path)?,
        None => MapConfig::default(),
    }
    .with_env_overrides()?;

    let cache = DataCache::new(&cli.data_dir)?;
    let properties = match &cli.properties {
        Some(file) => cache.load_properties(file)?,
        None => scatter_properties(cli.count, thailand(), &mut StdRng::seed_from_u64(cli.seed)),
    };
    info!(count = properties.len(), "properties loaded");

    let host = TerminalHost::new(thailand().center(), 5.0);
    let mut map = PropertyMap::new(host, config);
    map.attach_regions(cache.load_regions(&cli.boundaries));
    let mut state = AppState::new(map, properties, Instant::now());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        state.tick(Instant::now());
        terminal.draw(|f| ui::draw(f, &mut state))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) = event::read()? {
                if state.handle_input(code, Instant::now()) {
                    break;
                }
            }
        }
    }

    state.map.teardown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
