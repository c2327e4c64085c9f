use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;
use crate::geometry::Side;

/// Construction-time geometry and match rules.
///
/// Keys are camelCase on the wire (`screenWidth`, `queueCapacity`, ...);
/// missing keys fall back to the hardware defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct GameConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    pub paddle_length: u32,
    pub win_score: u32,
    pub queue_capacity: usize,
    pub boundary_inset: u32,
    pub first_server: Side,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            paddle_length: PADDLE_LENGTH,
            win_score: WIN_SCORE,
            queue_capacity: QUEUE_CAPACITY,
            boundary_inset: BOUNDARY_INSET,
            first_server: Side::Left,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_width < 8 || self.screen_height < 4 {
            return Err(ConfigError::ScreenTooSmall {
                width: self.screen_width,
                height: self.screen_height,
            });
        }
        if self.paddle_length < 2 || self.paddle_length >= self.screen_height {
            return Err(ConfigError::PaddleLength {
                length: self.paddle_length,
                height: self.screen_height,
            });
        }
        if self.win_score == 0 {
            return Err(ConfigError::WinScore);
        }
        if self.boundary_inset == 0 || self.boundary_inset >= self.screen_width / 2 {
            return Err(ConfigError::BoundaryInset {
                inset: self.boundary_inset,
                width: self.screen_width,
            });
        }
        let required = self.longest_segment() + 1;
        if self.queue_capacity < required {
            return Err(ConfigError::QueueCapacity {
                capacity: self.queue_capacity,
                required,
            });
        }
        Ok(())
    }

    /// x coordinate of a side's paddle plane.
    pub fn boundary_column(&self, side: Side) -> i32 {
        match side {
            Side::Left => self.boundary_inset as i32,
            Side::Right => (self.screen_width - self.boundary_inset) as i32,
        }
    }

    pub fn centre_column(&self) -> i32 {
        (self.screen_width / 2) as i32
    }

    /// Floor contact row. The ceiling is row 0.
    pub fn floor_row(&self) -> i32 {
        self.screen_height as i32
    }

    /// Largest legal paddle top row.
    pub fn max_travel(&self) -> f32 {
        (self.screen_height - self.paddle_length) as f32
    }

    /// Point count of the longest segment the rasterizer can produce.
    pub fn longest_segment(&self) -> usize {
        self.screen_width.max(self.screen_height) as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_hardware() {
        let cfg = GameConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.boundary_column(Side::Left), 10);
        assert_eq!(cfg.boundary_column(Side::Right), 150);
        assert_eq!(cfg.centre_column(), 80);
        assert_eq!(cfg.floor_row(), 128);
        assert_eq!(cfg.max_travel(), 108.0);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: GameConfig =
            serde_json::from_str(r#"{"winScore": 3, "firstServer": "right"}"#).unwrap();
        assert_eq!(cfg.win_score, 3);
        assert_eq!(cfg.first_server, Side::Right);
        assert_eq!(cfg.screen_width, SCREEN_WIDTH);
        assert_eq!(cfg.queue_capacity, QUEUE_CAPACITY);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed: Result<GameConfig, _> = serde_json::from_str(r#"{"ballSpeed": 4}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_paddle_as_tall_as_the_screen() {
        let cfg = GameConfig {
            paddle_length: 128,
            ..GameConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::PaddleLength {
                length: 128,
                height: 128
            })
        );
    }

    #[test]
    fn rejects_zero_win_score() {
        let cfg = GameConfig {
            win_score: 0,
            ..GameConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::WinScore));
    }

    #[test]
    fn rejects_boundary_on_the_screen_edge() {
        let cfg = GameConfig {
            boundary_inset: 0,
            ..GameConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::BoundaryInset {
                inset: 0,
                width: 160
            })
        );

        let cfg = GameConfig {
            boundary_inset: 1,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.boundary_column(Side::Right), 159);
    }

    #[test]
    fn rejects_overlapping_boundaries() {
        let cfg = GameConfig {
            boundary_inset: 80,
            ..GameConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::BoundaryInset { .. })));
    }

    #[test]
    fn rejects_queue_smaller_than_a_full_traverse() {
        let cfg = GameConfig {
            queue_capacity: 100,
            ..GameConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::QueueCapacity {
                capacity: 100,
                required: 162
            })
        );
    }
}
