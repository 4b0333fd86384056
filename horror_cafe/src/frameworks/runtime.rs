// Framework bootstrap for the headless cafe host.

use crate::domain::ports::Stage;
use crate::frameworks::autopilot::Autopilot;
use crate::frameworks::config::CafeConfig;
use crate::interface_adapters::headless::{
    EYE_POSITION, HeadlessWorld, ScriptedCamera, TracingAudio, furnish_standard_cafe,
};
use crate::interface_adapters::protocol::snapshot_json;
use crate::interface_adapters::utils::rng::{SeededRandom, clock_seed};
use crate::use_cases::{Cafe, CafeSnapshot};

use std::{io::Result, rc::Rc, time::Duration};
use tokio::time::{Instant, MissedTickBehavior};

// Longest frame fed to the simulation after a stall.
const MAX_FRAME: Duration = Duration::from_millis(250);

pub fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// The standard cafe wired to the headless adapters.
pub struct HeadlessCafe {
    pub world: Rc<HeadlessWorld>,
    pub camera: Rc<ScriptedCamera>,
    pub cafe: Cafe,
    pub autopilot: Autopilot,
}

impl HeadlessCafe {
    pub fn new(config: &CafeConfig, seed: u64) -> Self {
        let world = Rc::new(HeadlessWorld::new());
        let layout = furnish_standard_cafe(&world);
        let camera = Rc::new(ScriptedCamera::new(EYE_POSITION));
        let stage = Stage {
            scene: world.clone(),
            physics: world.clone(),
            camera: camera.clone(),
            random: Rc::new(SeededRandom::new(seed)),
            audio: Some(Rc::new(TracingAudio)),
        };
        let autopilot = Autopilot::coffee_shift(&layout, &config.coffee);
        let cafe = Cafe::new(stage, layout, config.tuning());
        Self {
            world,
            camera,
            cafe,
            autopilot,
        }
    }

    /// One frame: the autopilot acts, then the cafe ticks.
    pub fn step(&mut self, dt: f32) {
        let inputs = self.autopilot.next_inputs(dt, &self.world, &self.camera);
        self.cafe.tick(dt, &inputs);
    }
}

/// Runs the cafe at the configured tick rate until the run limit elapses or
/// Ctrl-C arrives, and returns the last snapshot.
///
/// The cafe is single-threaded, so the loop runs on the calling task rather
/// than a spawned one.
pub async fn run(config: CafeConfig) -> Result<CafeSnapshot> {
    let simulation = config.simulation;
    let seed = simulation.seed.unwrap_or_else(clock_seed);
    let mut host = HeadlessCafe::new(&config, seed);

    let tick_interval = simulation.tick_interval();
    let deadline = simulation.run_limit().map(|limit| Instant::now() + limit);
    tracing::info!(
        seed,
        tick_hz = simulation.tick_hz,
        run_seconds = simulation.run_seconds,
        "cafe running"
    );

    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last = Instant::now();
    let mut next_snapshot = simulation.snapshot_every;

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "failed to listen for ctrl-c");
                }
                tracing::info!("shutdown requested");
                break;
            }
            _ = interval.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last).min(MAX_FRAME).as_secs_f32();
                last = now;
                host.step(dt);

                let elapsed = host.cafe.scheduler().now();
                if simulation.snapshot_every > 0.0 && elapsed >= next_snapshot {
                    next_snapshot = elapsed + simulation.snapshot_every;
                    log_snapshot(&host.cafe.snapshot());
                }
                if deadline.is_some_and(|deadline| now >= deadline) {
                    break;
                }
            }
        }
    }

    let snapshot = host.cafe.snapshot();
    log_snapshot(&snapshot);
    tracing::info!(
        ticks = snapshot.tick,
        activations = snapshot.scenarios.activations,
        reverts = snapshot.scenarios.reverts,
        earnings = snapshot.earnings,
        "cafe closed"
    );
    Ok(snapshot)
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let config = CafeConfig::load().inspect_err(|e| {
        tracing::error!(error = %e, "failed to load config");
    });
    let config = config.map_err(std::io::Error::other)?;

    run(config).await.map(|_| ())
}

fn log_snapshot(snapshot: &CafeSnapshot) {
    match snapshot_json(snapshot) {
        Ok(json) => tracing::info!(snapshot = %json, "cafe snapshot"),
        Err(e) => tracing::warn!(error = %e, "failed to serialize snapshot"),
    }
}
