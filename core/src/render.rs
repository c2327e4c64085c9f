use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Side};

/// Output sink for the display collaborator.
///
/// The game loop emits erase hints for what it drew on the previous tick,
/// then the new frame. How pixels are cleared or painted is up to the sink.
pub trait Renderer {
    fn erase_at(&mut self, point: Point);
    fn erase_paddle(&mut self, side: Side, top: i32, length: u32);
    fn draw_paddle(&mut self, side: Side, top: i32, length: u32);
    fn draw_ball(&mut self, point: Point);
    fn draw_score(&mut self, side: Side, value: u32);
    fn on_game_over(&mut self, winner: Side);
}

/// A single renderer call, as captured by [`RecordingRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCall {
    EraseAt { point: Point },
    ErasePaddle { side: Side, top: i32, length: u32 },
    DrawPaddle { side: Side, top: i32, length: u32 },
    DrawBall { point: Point },
    DrawScore { side: Side, value: u32 },
    GameOver { winner: Side },
}

impl DrawCall {
    /// Canonical byte encoding: opcode followed by little-endian fields.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match *self {
            DrawCall::EraseAt { point } => {
                out.push(0);
                encode_point(out, point);
            }
            DrawCall::ErasePaddle { side, top, length } => {
                out.push(1);
                out.push(side.index() as u8);
                out.extend_from_slice(&top.to_le_bytes());
                out.extend_from_slice(&length.to_le_bytes());
            }
            DrawCall::DrawPaddle { side, top, length } => {
                out.push(2);
                out.push(side.index() as u8);
                out.extend_from_slice(&top.to_le_bytes());
                out.extend_from_slice(&length.to_le_bytes());
            }
            DrawCall::DrawBall { point } => {
                out.push(3);
                encode_point(out, point);
            }
            DrawCall::DrawScore { side, value } => {
                out.push(4);
                out.push(side.index() as u8);
                out.extend_from_slice(&value.to_le_bytes());
            }
            DrawCall::GameOver { winner } => {
                out.push(5);
                out.push(winner.index() as u8);
            }
        }
    }
}

fn encode_point(out: &mut Vec<u8>, point: Point) {
    out.extend_from_slice(&point.x.to_le_bytes());
    out.extend_from_slice(&point.y.to_le_bytes());
}

/// Renderer that keeps every call, for tests and replay digests.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<DrawCall>,
}

impl RecordingRenderer {
    pub fn scores(&self) -> impl Iterator<Item = (Side, u32)> + '_ {
        self.calls.iter().filter_map(|call| match *call {
            DrawCall::DrawScore { side, value } => Some((side, value)),
            _ => None,
        })
    }

    pub fn last_ball(&self) -> Option<Point> {
        self.calls.iter().rev().find_map(|call| match *call {
            DrawCall::DrawBall { point } => Some(point),
            _ => None,
        })
    }
}

impl Renderer for RecordingRenderer {
    fn erase_at(&mut self, point: Point) {
        self.calls.push(DrawCall::EraseAt { point });
    }

    fn erase_paddle(&mut self, side: Side, top: i32, length: u32) {
        self.calls.push(DrawCall::ErasePaddle { side, top, length });
    }

    fn draw_paddle(&mut self, side: Side, top: i32, length: u32) {
        self.calls.push(DrawCall::DrawPaddle { side, top, length });
    }

    fn draw_ball(&mut self, point: Point) {
        self.calls.push(DrawCall::DrawBall { point });
    }

    fn draw_score(&mut self, side: Side, value: u32) {
        self.calls.push(DrawCall::DrawScore { side, value });
    }

    fn on_game_over(&mut self, winner: Side) {
        self.calls.push(DrawCall::GameOver { winner });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodings_are_distinct_per_call() {
        let calls = [
            DrawCall::EraseAt {
                point: Point::new(1, 2),
            },
            DrawCall::DrawBall {
                point: Point::new(1, 2),
            },
            DrawCall::ErasePaddle {
                side: Side::Left,
                top: 3,
                length: 20,
            },
            DrawCall::DrawPaddle {
                side: Side::Left,
                top: 3,
                length: 20,
            },
        ];
        let encoded: Vec<Vec<u8>> = calls
            .iter()
            .map(|call| {
                let mut out = Vec::new();
                call.encode(&mut out);
                out
            })
            .collect();
        assert_eq!(encoded[0].len(), 9);
        assert_eq!(encoded[2].len(), 10);
        assert_ne!(encoded[0], encoded[1]);
        assert_ne!(encoded[2], encoded[3]);
    }

    #[test]
    fn draw_calls_serialize_with_an_op_tag() {
        let json = serde_json::to_string(&DrawCall::DrawScore {
            side: Side::Right,
            value: 3,
        })
        .unwrap();
        assert_eq!(json, r#"{"op":"drawScore","side":"right","value":3}"#);
    }

    #[test]
    fn recorder_tracks_scores_and_ball() {
        let mut r = RecordingRenderer::default();
        r.draw_ball(Point::new(4, 5));
        r.draw_score(Side::Left, 1);
        r.draw_ball(Point::new(6, 7));
        assert_eq!(r.last_ball(), Some(Point::new(6, 7)));
        assert_eq!(r.scores().collect::<Vec<_>>(), vec![(Side::Left, 1)]);
    }
}
