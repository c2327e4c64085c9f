//! Real-time match against simulated controllers.
//!
//! A single radio thread plays both slave nodes: it sweeps each paddle angle
//! and presses serve now and then, pushing updates onto the control channel
//! while the tick scheduler drives the game.

use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{sleep, spawn};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use paddle_core::constants::CONTROL_CHANNEL_CAPACITY;
use paddle_core::{
    control_channel, ControlSender, ControlUpdate, Game, GameConfig, PeerId, Score, Side,
    TickScheduler,
};
use parking_lot::Mutex;

use crate::canvas::{FrameBuffer, TracingRenderer};

/// Simulated slave nodes, left then right.
pub const LIVE_PEERS: [PeerId; 2] = [PeerId(0x0a01), PeerId(0x0b02)];

/// How often each simulated controller reports
const REPORT_INTERVAL: Duration = Duration::from_millis(20);

/// Serve presses are sent every this many reports
const SERVE_EVERY: u32 = 25;

#[derive(Debug, Clone, Copy)]
pub struct LiveOptions {
    pub duration: Duration,
    pub period: Duration,
}

#[derive(Debug, Clone)]
pub struct LiveSummary {
    pub score: Score,
    pub winner: Option<Side>,
    pub ticks: u64,
    pub paddle_hits: u32,
    pub dropped_updates: u64,
    pub snapshot: String,
}

/// Runs a match in real time until it is won or `duration` elapses.
pub fn run_live(config: &GameConfig, options: LiveOptions) -> anyhow::Result<LiveSummary> {
    let mut game = Game::new(*config, TracingRenderer::new(FrameBuffer::new(config)))
        .context("Invalid game configuration")?;
    for peer in LIVE_PEERS {
        game.pair_peer(peer);
    }
    game.start_match();
    let game = Arc::new(Mutex::new(game));

    let (sender, receiver) = control_channel(CONTROL_CHANNEL_CAPACITY);
    let radio_on = Arc::new(AtomicBool::new(true));
    let radio = {
        let radio_on = Arc::clone(&radio_on);
        spawn(move || simulate_controllers(sender, &radio_on))
    };

    let mut scheduler = TickScheduler::start(Arc::clone(&game), receiver, options.period);
    let deadline = Instant::now() + options.duration;
    while scheduler.is_running() && Instant::now() < deadline {
        sleep(options.period.max(Duration::from_millis(1)));
    }
    scheduler.stop();
    radio_on.store(false, Ordering::Release);
    let dropped_updates = radio
        .join()
        .map_err(|_| anyhow!("Controller thread panicked"))?;

    let game = game.lock();
    let stats = game.stats();
    Ok(LiveSummary {
        score: game.score(),
        winner: game.match_state().winner(),
        ticks: stats.ticks,
        paddle_hits: stats.paddle_hits,
        dropped_updates,
        snapshot: game.renderer().inner().to_ascii(),
    })
}

/// Sweeps both paddles out of phase and presses serve periodically. Only
/// the server's press counts, so both sides press. Returns the number of
/// updates the full channel turned away.
fn simulate_controllers(mut sender: ControlSender, radio_on: &AtomicBool) -> u64 {
    let started = Instant::now();
    let mut reports = 0u32;
    while radio_on.load(Ordering::Acquire) {
        let t = started.elapsed().as_secs_f32();
        for (i, peer) in LIVE_PEERS.into_iter().enumerate() {
            let phase = i as f32 * PI;
            let angle = FRAC_PI_2 + FRAC_PI_2 * (t * 1.7 + phase).sin();
            sender.send(peer, ControlUpdate::angle(angle));
            if reports % SERVE_EVERY == 0 {
                sender.send(peer, ControlUpdate::serve());
            }
        }
        reports = reports.wrapping_add(1);
        sleep(REPORT_INTERVAL);
    }
    sender.dropped()
}
