//! Headless host for a product tour.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Seed the welcome tour and drive it either as an autoplay preview or as
//!   a simulated scroll through the editor timeline.

use anyhow::{Context, Result, anyhow, bail};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tourdeck_core::cancellation::CancellationToken;
use tourdeck_core::config::load_config;
use tourdeck_core::demo;
use tourdeck_core::session::{SessionCommand, TourSession, TourSnapshot};
use tourdeck_core::ticker::PlaybackClock;
use tourdeck_core::viewport::AnchorSpan;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str = "Usage: tourdeck [preview|scroll] [--config PATH] [--json]";
const SCROLL_STEP_PX: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Preview,
    Scroll,
}

#[derive(Debug)]
struct Args {
    surface: Surface,
    config_path: PathBuf,
    json: bool,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args()?;
    let config = load_config(&args.config_path);
    set_log_level(reload_handle, config.logging.log_level.as_filter_str());
    info!(
        surface = ?args.surface,
        level = %config.logging.log_level,
        tick_interval_ms = config.playback.tick_interval_ms,
        dwell_ms = config.playback.dwell_ms,
        "Starting tour host"
    );

    let stop = CancellationToken::new();
    let handler_token = stop.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("failed to install interrupt handler")?;

    let mut session = TourSession::new(demo::seed_collection(), &config);
    let snapshot = match args.surface {
        Surface::Preview => run_preview(&mut session, &stop)?,
        Surface::Scroll => run_scroll(&mut session, &stop)?,
    };

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&snapshot).context("failed to render snapshot")?;
        println!("{rendered}");
    }
    Ok(())
}

fn parse_args() -> Result<Args> {
    let mut parsed = Args {
        surface: Surface::Preview,
        config_path: PathBuf::from("conf/config.toml"),
        json: false,
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "preview" => parsed.surface = Surface::Preview,
            "scroll" => parsed.surface = Surface::Scroll,
            "--json" => parsed.json = true,
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config needs a path\n{USAGE}"))?;
                parsed.config_path = PathBuf::from(path);
            }
            other => bail!("Unknown argument: {other}\n{USAGE}"),
        }
    }
    Ok(parsed)
}

/// Play the tour once, holding a ticker only while the engine is playing.
fn run_preview(session: &mut TourSession, stop: &CancellationToken) -> Result<TourSnapshot> {
    session.apply_command(SessionCommand::EnterPreview)?;
    let mut event = session.apply_command(SessionCommand::Play)?;
    let timing = session.timing();
    let mut clock = PlaybackClock::new(timing.tick_interval);
    let mut shown = None;

    loop {
        if event.snapshot.current_index != shown {
            shown = event.snapshot.current_index;
            log_current_step(&event.snapshot);
        }
        if stop.is_cancelled() {
            warn!("Interrupted; pausing playback");
            event = session.apply_command(SessionCommand::Pause)?;
        }
        clock.sync(session.playback_mode().unwrap_or_default())?;
        if !clock.is_running() {
            break;
        }
        if clock.wait_tick(timing.tick_interval * 4) {
            event = session.apply_command(SessionCommand::AdvanceTick)?;
        }
    }

    if let Some(view) = &event.snapshot.playback {
        info!(
            mode = %view.state.mode,
            overall_pct = view.overall_pct,
            label = %view.step_label,
            "Preview finished"
        );
    }
    Ok(event.snapshot)
}

/// Lay the steps out as timeline cards, scroll to the bottom and back.
fn run_scroll(session: &mut TourSession, stop: &CancellationToken) -> Result<TourSnapshot> {
    let Some(geometry) = session.tracker().map(|tracker| tracker.geometry()) else {
        bail!("scroll view is not active");
    };
    let count = session.collection().len();
    let card = geometry.height * 0.45;
    let pitch = card * 2.0;
    let spans: Vec<AnchorSpan> = (0..count)
        .map(|idx| {
            let top = geometry.height * (2.0 / 3.0) + idx as f32 * pitch;
            AnchorSpan::new(top, top + card)
        })
        .collect();
    let end = spans.last().map_or(0.0, |span| span.bottom);
    let mut event = session.apply_command(SessionCommand::SetAnchorLayout { spans })?;
    log_current_step(&event.snapshot);

    let steps = (end / SCROLL_STEP_PX).ceil() as usize;
    let offsets = (1..=steps).chain((0..steps).rev());
    for step in offsets {
        if stop.is_cancelled() {
            warn!("Interrupted; stopping scroll");
            break;
        }
        let previous = event.snapshot.current_index;
        event = session.apply_command(SessionCommand::ScrollTo {
            offset: step as f32 * SCROLL_STEP_PX,
        })?;
        if event.snapshot.current_index != previous {
            log_current_step(&event.snapshot);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    Ok(event.snapshot)
}

fn log_current_step(snapshot: &TourSnapshot) {
    let Some(index) = snapshot.current_index else {
        info!("No steps to show");
        return;
    };
    let title = snapshot
        .steps
        .get(index)
        .map(|step| step.title.as_str())
        .unwrap_or_default();
    info!(
        index,
        total = snapshot.steps.len(),
        title,
        variant = snapshot.highlight.map(|highlight| highlight.variant),
        "Current step"
    );
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with logging.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
