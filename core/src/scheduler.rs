use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{sleep, spawn, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{error, info};

use crate::control::ControlReceiver;
use crate::game::Game;
use crate::render::Renderer;

/// Deadline of the tick after the one due at `deadline`. A worker that has
/// fallen a whole period behind restarts the grid at `now` instead of
/// running the missed ticks back to back.
fn next_deadline(deadline: Instant, period: Duration, now: Instant) -> Instant {
    let next = deadline + period;
    if next < now {
        now
    } else {
        next
    }
}

/// Periodic tick driver running on its own thread.
///
/// Each period the worker locks the game, applies pending controller
/// updates and runs one tick. Ticks start on a fixed grid of deadlines, so
/// time spent inside a tick does not stretch the period. Ticks never
/// overlap. The worker stops after
/// the tick that finishes the match, on a game error, or on [`stop`].
///
/// [`stop`]: TickScheduler::stop
pub struct TickScheduler {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TickScheduler {
    pub fn start<R>(
        game: Arc<Mutex<Game<R>>>,
        mut controls: ControlReceiver,
        period: Duration,
    ) -> Self
    where
        R: Renderer + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = spawn(move || {
            info!(period_ms = period.as_millis() as u64, "tick scheduler started");
            let mut deadline = Instant::now();
            while flag.load(Ordering::Acquire) {
                let finished = {
                    let mut game = game.lock();
                    game.drain_controls(&mut controls);
                    match game.tick() {
                        Ok(_) => game.match_state().is_finished(),
                        Err(err) => {
                            error!(%err, "tick failed, stopping scheduler");
                            true
                        }
                    }
                };
                if finished {
                    break;
                }
                deadline = next_deadline(deadline, period, Instant::now());
                sleep(deadline.saturating_duration_since(Instant::now()));
            }
            flag.store(false, Ordering::Release);
            info!("tick scheduler stopped");
        });
        Self {
            running,
            handle: Some(handle),
        }
    }

    /// False once the worker has exited or been asked to.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Asks the worker to exit and waits for it.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        self.join();
    }

    /// Waits for the worker to exit on its own.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("tick worker panicked");
            }
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
