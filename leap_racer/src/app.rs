//! Application wiring: window, hand source, engine sound and the game loop.

use std::sync::mpsc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context};
use racer_core::{GameConfig, GameLoop, GameMode, GameSummary};
use racer_tone::{EngineMidi, EngineProgram};

use crate::engine::EngineAudio;
use crate::landmark::{make_source, InputKind, SimInput};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub input:          InputKind,
    pub mode:           GameMode,
    /// Obstacle layout seed.  `None` picks one from the clock.
    pub seed:           Option<u64>,
    /// GM program for the engine voice.
    pub program:        u8,
    /// Master engine volume, `0.0–1.0`.
    pub volume:         f32,
    pub muted:          bool,
    pub frame_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            input:          InputKind::default(),
            mode:           GameMode::default(),
            seed:           None,
            program:        EngineProgram::SawLead.program(),
            volume:         0.8,
            muted:          false,
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl AppConfig {
    pub fn game_config(&self) -> GameConfig {
        let seed = self.seed.unwrap_or_else(clock_seed);
        GameConfig::for_mode(self.mode).with_seed(seed)
    }

    pub fn engine_midi(&self) -> EngineMidi {
        EngineMidi { program: self.program.min(127), ..EngineMidi::default() }
    }

    /// One-line description for the status bar.
    pub fn status_line(&self, seed: u64) -> String {
        format!("MODE {}  INPUT {}  SEED {}", self.mode.name(), self.input.name(), seed)
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5EED)
}

// ════════════════════════════════════════════════════════════════════════════
// run
// ════════════════════════════════════════════════════════════════════════════

/// Open the window and play one session until the player quits, the time
/// limit runs out, or the window closes.
pub fn run(cfg: AppConfig) -> anyhow::Result<GameSummary> {
    let game_config = cfg.game_config();
    let seed = game_config.seed;
    log::info!("starting {} session (seed {}, input: {})", cfg.mode.name(), seed, cfg.input.name());

    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();

    let title = format!("Leap Racer - {}", cfg.mode.name());
    let mut visualizer = Visualizer::new(sim_tx, game_config.car.road, &title)
        .map_err(|e| anyhow!(e))
        .context("failed to open game window")?;
    visualizer.set_status(&cfg.status_line(seed));

    let source = make_source(cfg.input, sim_rx);
    let audio  = EngineAudio::spawn(cfg.engine_midi(), cfg.volume, cfg.muted);

    let mut game = GameLoop::new(game_config, source, visualizer, audio)
        .context("invalid game configuration")?;
    game.state_mut().muted = cfg.muted;

    let summary = game.run(cfg.frame_interval)
        .with_context(|| format!("could not start with {}", cfg.input.name()))?;
    log::info!("session over: {}", summary);
    Ok(summary)
}
