//! Authoritative simulation core of a two-player networked paddle game.
//!
//! The master node owns ball, paddles and score. Controllers feed angle and
//! serve updates through [`control_channel`], a [`TickScheduler`] advances
//! the [`Game`] at a fixed period, and every frame is emitted through a
//! [`Renderer`].

use sha2::{Digest, Sha256};

pub mod config;
pub mod constants;
pub mod control;
pub mod error;
pub mod game;
pub mod geometry;
pub mod goal;
pub mod paddle;
pub mod physics;
pub mod raster;
pub mod render;
pub mod scheduler;
pub mod trajectory;

pub use config::GameConfig;
pub use control::{
    control_channel, ControlReceiver, ControlSender, ControlUpdate, PeerId, PeerTable,
};
pub use error::{ConfigError, GameError};
pub use game::{BallState, Frame, Game, MatchState, MatchStats, Score, TickEvent};
pub use geometry::{Point, Side};
pub use render::{DrawCall, RecordingRenderer, Renderer};
pub use scheduler::TickScheduler;

/// SHA-256 over the version prefix followed by the canonical encoding of
/// each draw call. Two runs of the same script produce the same digest.
pub fn frame_digest(calls: &[DrawCall]) -> [u8; 32] {
    let mut h = Sha256::new();

    // Version prefix, then up to 10 bytes per call
    let mut buf = Vec::with_capacity(constants::DIGEST_VERSION.len() + calls.len() * 10);
    buf.extend_from_slice(constants::DIGEST_VERSION);
    for call in calls {
        call.encode(&mut buf);
    }
    h.update(&buf);

    let out = h.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}
