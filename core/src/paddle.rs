use core::f32::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::GameConfig;
use crate::constants::INITIAL_ANGLE;

/// Linear map from a controller angle to a paddle's top row.
///
/// An angle of 0 puts the paddle on the floor, π puts it against the ceiling.
#[derive(Debug, Clone, Copy)]
pub struct PaddleModel {
    max_travel: f32,
    angle_divisor: f32,
}

impl PaddleModel {
    pub fn new(config: &GameConfig) -> Self {
        let max_travel = config.max_travel();
        Self {
            max_travel,
            angle_divisor: PI / max_travel,
        }
    }

    /// Top row for `angle`, clamped to `[0, max_travel]`.
    pub fn top_for(&self, angle: f32) -> f32 {
        (self.max_travel - angle.abs() / self.angle_divisor).clamp(0.0, self.max_travel)
    }
}

/// One side's paddle as seen by the game loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddleState {
    /// Latest controller angle in radians.
    pub angle: f32,
    pub top_previous: f32,
    pub top_current: f32,
    /// Serve edge received since the last tick.
    pub serve_pending: bool,
}

impl PaddleState {
    pub fn new(model: &PaddleModel) -> Self {
        let top = model.top_for(INITIAL_ANGLE);
        Self {
            angle: INITIAL_ANGLE,
            top_previous: top,
            top_current: top,
            serve_pending: false,
        }
    }

    /// Stores a controller angle. Non-finite readings are dropped and the
    /// paddle keeps its last commanded position.
    pub fn set_angle(&mut self, angle: f32) -> bool {
        if !angle.is_finite() {
            warn!(angle, "discarding non-finite paddle angle");
            return false;
        }
        self.angle = angle;
        true
    }

    pub fn recompute(&mut self, model: &PaddleModel) {
        self.top_previous = self.top_current;
        self.top_current = model.top_for(self.angle);
    }

    /// Reads and clears the serve edge.
    pub fn take_serve(&mut self) -> bool {
        core::mem::take(&mut self.serve_pending)
    }

    /// Top row as drawn on the pixel grid.
    pub fn row(&self) -> i32 {
        self.top_current.round() as i32
    }

    pub fn previous_row(&self) -> i32 {
        self.top_previous.round() as i32
    }

    /// Row of the paddle's centre, where a parked ball rests.
    pub fn centre_row(&self, length: u32) -> i32 {
        (self.top_current + (length / 2) as f32).round() as i32
    }
}
