mod config;
mod connection;
mod events;
mod server;
mod stats;
mod tui;

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use frogpile::{Session, SessionConfig};

use config::ServerConfig;
use events::ServerEvent;
use server::{GameServer, ServerContext};
use tui::TuiState;

#[derive(Parser)]
#[command(name = "frogpile-server")]
#[command(about = "Frogpile game server")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = frogpile::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value_t = frogpile::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(short, long, default_value_t = 32)]
    max_clients: usize,

    #[arg(long)]
    headless: bool,

    #[arg(long, help = "Level file: JSON list of {width, height, x, y}")]
    map: Option<PathBuf>,

    #[arg(long, help = "Session tuning file: JSON SessionConfig, flags override it")]
    config: Option<PathBuf>,

    #[arg(long, help = "Accept platform edit packets from clients")]
    allow_map_edits: bool,

    #[arg(long)]
    gravity: Option<f32>,

    #[arg(long, help = "Fraction of horizontal speed lost per tick, in [0, 1)")]
    friction: Option<f32>,

    #[arg(long)]
    jump_speed: Option<f32>,

    #[arg(long)]
    launch_speed: Option<f32>,

    #[arg(long)]
    landing_offset: Option<f32>,

    #[arg(long)]
    grab_reach: Option<f32>,

    #[arg(long, help = "Allowed vertical distance between centers for a grab")]
    grab_band: Option<f32>,

    #[arg(long)]
    viewport_width: Option<f32>,

    #[arg(long)]
    viewport_height: Option<f32>,

    #[arg(long, help = "Ignore intents from entities that are being carried")]
    lock_held: bool,
}

impl Args {
    fn session_config(&self, mut config: SessionConfig) -> SessionConfig {
        let physics = &mut config.physics;

        if let Some(gravity) = self.gravity {
            physics.gravity = gravity;
        }
        if let Some(friction) = self.friction {
            physics.friction = friction;
        }
        if let Some(jump_speed) = self.jump_speed {
            physics.jump_speed = jump_speed;
        }
        if let Some(launch_speed) = self.launch_speed {
            physics.launch_speed = launch_speed;
        }
        if let Some(landing_offset) = self.landing_offset {
            physics.landing_offset = landing_offset;
        }
        if let Some(reach) = self.grab_reach {
            config.grab.reach = reach;
        }
        if let Some(band) = self.grab_band {
            config.grab.vertical_band = band;
        }
        if self.lock_held {
            config.grab.held_accepts_intents = false;
        }

        if self.viewport_width.is_some() || self.viewport_height.is_some() {
            if let Some(width) = self.viewport_width {
                config.viewport_width = width;
            }
            if let Some(height) = self.viewport_height {
                config.viewport_height = height;
            }
            config.spawn = [config.viewport_width / 2.0, config.viewport_height / 2.0];
        }
        config
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            tick_rate: self.tick_rate,
            max_clients: self.max_clients,
            allow_map_edits: self.allow_map_edits,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let bind_addr = format!("{}:{}", args.bind, args.port);

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let base_config = config::load_session_config(args.config.as_deref())?;
    let session_config = args.session_config(base_config);
    let statics = config::load_map(
        args.map.as_deref(),
        session_config.viewport_width,
        session_config.viewport_height,
    )?;
    let session = Session::new(session_config, statics).context("invalid session config")?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let server = GameServer::bind(&bind_addr, args.server_config(), session, event_tx).await?;
    let local_addr = server.local_addr()?;
    let running = server.running();

    if args.headless {
        log::info!("Server started on {}", local_addr);
        tokio::spawn(log_events(event_rx));

        let stop = Arc::clone(&running);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Interrupt received");
                stop.store(false, Ordering::SeqCst);
            }
        });

        server.run().await?;
        log::info!("Server shut down");
        return Ok(());
    }

    let context = server.context();
    let tui_running = Arc::clone(&running);
    let tui = tokio::task::spawn_blocking(move || {
        run_with_tui(tui_running, context, event_rx, local_addr)
    });

    let result = server.run().await;
    running.store(false, Ordering::SeqCst);
    tui.await.context("joining TUI thread")??;
    result
}

async fn log_events(mut events: mpsc::UnboundedReceiver<ServerEvent>) {
    while let Some(event) = events.recv().await {
        if event.is_error() {
            log::error!("{}", event.describe());
        } else if event.is_warning() {
            log::warn!("{}", event.describe());
        } else {
            log::info!("{}", event.describe());
        }
    }
}

fn run_with_tui(
    running: Arc<AtomicBool>,
    context: Arc<ServerContext>,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
    local_addr: SocketAddr,
) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut tui_state = TuiState::new();

    tui_state.log_info(format!("Server started on {}", local_addr));

    while running.load(Ordering::SeqCst) {
        while let Ok(event) = events.try_recv() {
            tui_state.push_event(&event);
        }

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            running.store(false, Ordering::SeqCst);
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            running.store(false, Ordering::SeqCst);
                        }
                        KeyCode::PageUp => tui_state.scroll_up(),
                        KeyCode::PageDown => tui_state.scroll_down(),
                        KeyCode::End => tui_state.scroll_to_bottom(),
                        _ => {}
                    }
                }
            }
        }

        let status = context.blocking_status();
        terminal.draw(|frame| {
            tui::render(frame, &tui_state, &status);
        })?;
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
