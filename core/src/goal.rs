use crate::config::GameConfig;
use crate::game::BallState;
use crate::geometry::Side;

/// Outcome of a boundary check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Ball is not on an armed boundary column.
    Clear,
    /// Ball met `Side`'s paddle and plays on.
    PaddleHit(Side),
    /// Ball crossed `conceded`'s boundary outside the paddle.
    Goal { conceded: Side },
}

/// Classifies the ball's arrival at a boundary column.
#[derive(Debug, Clone)]
pub struct GoalJudge {
    columns: [i32; 2],
    paddle_length: f32,
}

impl GoalJudge {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            columns: [
                config.boundary_column(Side::Left),
                config.boundary_column(Side::Right),
            ],
            paddle_length: config.paddle_length as f32,
        }
    }

    /// Judges the ball against both boundaries given each paddle's top row.
    ///
    /// Disarmed while `paddle_recently_hit` is set, so the several queued
    /// points that share a boundary column only count once per approach.
    pub fn judge(&self, ball: &BallState, paddle_tops: [f32; 2]) -> Verdict {
        debug_assert!(ball.moving, "goal judge consulted while the ball is parked");
        if !ball.moving || ball.paddle_recently_hit {
            return Verdict::Clear;
        }
        let y = ball.current.y as f32;
        for side in Side::BOTH {
            if ball.current.x != self.columns[side.index()] {
                continue;
            }
            let top = paddle_tops[side.index()];
            return if y >= top && y <= top + self.paddle_length {
                Verdict::PaddleHit(side)
            } else {
                Verdict::Goal { conceded: side }
            };
        }
        Verdict::Clear
    }
}
