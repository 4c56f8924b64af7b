use anyhow::Context;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute, terminal,
};
use flapper::config::{self, Command, Config};
use flapper::game::{Action, Bounds, GameLoop};
use flapper::logging;
use flapper::render::{PixelBuf, Renderer};
use flapper::sound::Audio;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, Write, stdout};
use std::time::{Duration, Instant};
use tracing::{info, warn};

// ── Terminal ────────────────────────────────────────────────────────────────

fn enter_terminal(out: &mut impl Write) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
        EnableMouseCapture,
    )
}

fn leave_terminal(out: &mut impl Write) -> io::Result<()> {
    execute!(
        out,
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    )?;
    terminal::disable_raw_mode()
}

/// Put the terminal back before the panic message is printed.
fn install_terminal_restore_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = leave_terminal(&mut stdout());
        previous(info);
    }));
}

/// Terminal size in pixels: one column wide, two per row.
fn pixel_size() -> (usize, usize) {
    match terminal::size() {
        Ok((cols, rows)) => (cols as usize, rows as usize * 2),
        Err(err) => {
            warn!(%err, "terminal size unavailable, using a zero-size screen");
            (0, 0)
        }
    }
}

fn bounds_for(pw: usize, ph: usize, scale: f64) -> Bounds {
    Bounds::new(pw as f64 * scale, ph as f64 * scale)
}

// ── Main ────────────────────────────────────────────────────────────────────

fn primary_action(game: &mut GameLoop, audio: &Audio) {
    if game.on_primary_action() == Action::Jumped {
        audio.flap();
    }
}

fn run(config: &Config, out: &mut impl Write) -> anyhow::Result<()> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let audio = Audio::open(config.mute);

    let (pw, ph) = pixel_size();
    let mut buf = PixelBuf::new(pw, ph);
    let mut renderer = Renderer::new(config.scale);
    let mut game = GameLoop::new(config.physics.clone(), bounds_for(pw, ph, config.scale));
    info!(
        width = pw,
        height = ph,
        scale = config.scale,
        tick_ms = config.tick.as_millis() as u64,
        sound = audio.is_enabled(),
        "starting"
    );

    loop {
        let frame_start = Instant::now();

        // Input
        while event::poll(Duration::ZERO).context("polling terminal input")? {
            match event::read().context("reading terminal input")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        info!(score = game.score(), "quit");
                        return Ok(());
                    }
                    KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => {
                        primary_action(&mut game, &audio);
                    }
                    _ => {}
                },
                Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                    primary_action(&mut game, &audio);
                }
                Event::Resize(cols, rows) => {
                    let (npw, nph) = (cols as usize, rows as usize * 2);
                    buf.resize(npw, nph);
                    game.set_bounds(bounds_for(npw, nph, renderer.scale()));
                }
                _ => {}
            }
        }

        // Update
        if !game.is_game_over() {
            let report = game.on_tick(&mut rng);
            if report.ended {
                audio.death();
            } else if report.recycled > 0 {
                audio.point();
            }
        }

        // Render
        renderer.draw(&game, &mut buf);
        buf.render(out).context("drawing frame")?;

        // Frame pacing
        let elapsed = frame_start.elapsed();
        if elapsed < config.tick {
            std::thread::sleep(config.tick - elapsed);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let config = match config::parse_args(std::env::args().skip(1)) {
        Ok(Command::Play(config)) => config,
        Ok(Command::Help) => {
            println!("{}", config::USAGE);
            return Ok(());
        }
        Ok(Command::Version) => {
            println!("flapper {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Err(err) => {
            eprintln!("flapper: {err}\n\n{}", config::USAGE);
            std::process::exit(2);
        }
    };

    if let Some(path) = &config.log_file {
        logging::init_tracing(path)?;
        logging::install_panic_hook();
    }
    install_terminal_restore_hook();

    let mut out = stdout();
    enter_terminal(&mut out).context("setting up terminal")?;
    let result = run(&config, &mut out);
    let restored = leave_terminal(&mut out).context("restoring terminal");
    result.and(restored)
}
