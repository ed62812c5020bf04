use clap::Parser;
use color_eyre::Result;
use lotedit::{
    logging, App, AppConfig, AppEvent, Args, CacheManager, ConfigManager, Drain, Inventory,
    StartOptions, Theme, APP_NAME,
};
use ratatui::DefaultTerminal;
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::{info, warn};

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(
    mut terminal: DefaultTerminal,
    inventory: Inventory,
    opts: &StartOptions,
    theme: Theme,
    poll_interval: Duration,
) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new_with_config(tx.clone(), theme, opts);
    render(&mut terminal, &mut app)?;
    tx.send(AppEvent::Load(inventory))?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        match app.drain_events(&rx)? {
            Drain::Exit => break,
            Drain::Updated => render(&mut terminal, &mut app)?,
            Drain::Idle => {}
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        match ConfigManager::new(APP_NAME) {
            Ok(manager) => match manager.write_default_config(args.force) {
                Ok(path) => {
                    println!("Wrote default configuration to {}", path.display());
                    return Ok(Some(()));
                }
                Err(e) => {
                    eprintln!("Error writing configuration: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error initializing config manager: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                if let Err(e) = cache.clear_all() {
                    eprintln!("Error clearing cache: {}", e);
                    std::process::exit(1);
                }
                println!("Cache cleared successfully");
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let config = AppConfig::load(APP_NAME).unwrap_or_else(|e| {
        eprintln!("Warning: using default configuration: {}", e);
        AppConfig::default()
    });
    let theme = Theme::from_config(&config.theme).unwrap_or_else(|e| {
        eprintln!("Warning: using default theme: {}", e);
        Theme::default()
    });

    match CacheManager::new(APP_NAME) {
        Ok(cache) => {
            if let Err(e) = logging::init(&cache, &config.debug.log_level) {
                eprintln!("Warning: logging disabled: {}", e);
            }
        }
        Err(e) => eprintln!("Warning: logging disabled: {}", e),
    }

    let inventory = match &args.path {
        Some(path) => Inventory::from_json_file(path)?,
        None => {
            warn!("no inventory file given, using built-in sample");
            Inventory::sample()
        }
    };
    info!(rows = inventory.data.len(), "inventory loaded");

    let opts = StartOptions::from_args_and_config(&args, &config);
    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);

    color_eyre::install()?;
    let terminal = ratatui::init();
    let result = run(terminal, inventory, &opts, theme, poll_interval);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
