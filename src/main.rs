use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use swipedeck::app::App;
use swipedeck::cli::CliArgs;
use swipedeck::clock::SystemClock;
use swipedeck::config::Config;
use swipedeck::records::{ClientStore, MemoryClientStore, TomlClientStore};
use swipedeck::ui;

fn init_logging(cli_args: &CliArgs) -> Result<()> {
    // The terminal belongs to the UI, so logs only go to a file
    let Some(path) = &cli_args.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn open_store(config: &Config) -> Result<Box<dyn ClientStore>> {
    match &config.data_file {
        Some(path) => {
            let store = TomlClientStore::open(path)
                .with_context(|| format!("Failed to open client file: {}", path.display()))?;
            Ok(Box::new(store))
        }
        None => Ok(Box::new(MemoryClientStore::with_samples())),
    }
}

/// Read terminal events on a background thread
fn spawn_input_thread() -> Receiver<Event> {
    let (sender, receiver) = crossbeam_channel::unbounded();
    std::thread::spawn(move || {
        loop {
            match event::read() {
                Ok(ev) => {
                    if sender.send(ev).is_err() {
                        // Receiver dropped, UI is shutting down
                        return;
                    }
                }
                Err(e) => {
                    error!("Failed to read terminal event: {}", e);
                    return;
                }
            }
        }
    });
    receiver
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: Receiver<Event>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        match events.recv_timeout(app.poll_timeout()) {
            Ok(ev) => {
                app.handle_event(ev)?;
                // Drain whatever else queued up while we were drawing
                while let Ok(ev) = events.try_recv() {
                    app.handle_event(ev)?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("Input thread stopped");
                break;
            }
        }

        app.on_tick();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    init_logging(&cli_args)?;

    info!("Starting swipedeck");

    let config_path = cli_args.config.clone();
    let config = Config::from_cli_and_file(cli_args, config_path)?;
    let store = open_store(&config)?;
    let mut app = App::new(config, store, Arc::new(SystemClock::new()))?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    app.handle_resize(size.width, size.height);

    let events = spawn_input_thread();
    let res = run(&mut terminal, &mut app, events);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {}", err);
        println!("Error: {}", err);
    }

    info!("swipedeck shut down cleanly");
    Ok(())
}
