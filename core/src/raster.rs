//! Integer Bresenham rasterization of ball path segments.
//!
//! The trace is always computed in canonical form: the major axis is mapped
//! onto x and the endpoints are ordered so x increases. Segments that run
//! the other way are emitted in reverse so the ball still travels from
//! `from` to `to`.

use crate::error::GameError;
use crate::geometry::Point;
use crate::trajectory::TrajectoryQueue;

/// Canonical Bresenham trace, stepping x0 -> x1 along the major axis.
#[derive(Debug, Clone)]
pub struct Line {
    x: i32,
    x_end: i32,
    y: i32,
    dx: i32,
    dy: i32,
    err: i32,
    ystep: i32,
    steep: bool,
    done: bool,
}

impl Line {
    /// Returns the canonical trace between two endpoints and whether it runs
    /// opposite to `from -> to`.
    pub fn new(from: Point, to: Point) -> (Self, bool) {
        let (mut x0, mut y0, mut x1, mut y1) = (from.x, from.y, to.x, to.y);
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            core::mem::swap(&mut x0, &mut y0);
            core::mem::swap(&mut x1, &mut y1);
        }
        let reversed = x0 > x1;
        if reversed {
            core::mem::swap(&mut x0, &mut x1);
            core::mem::swap(&mut y0, &mut y1);
        }
        let dx = x1 - x0;
        let dy = (y1 - y0).abs();
        let line = Line {
            x: x0,
            x_end: x1,
            y: y0,
            dx,
            dy,
            err: dx / 2,
            ystep: if y0 < y1 { 1 } else { -1 },
            steep,
            done: false,
        };
        (line, reversed)
    }
}

impl Iterator for Line {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.done {
            return None;
        }
        let point = if self.steep {
            Point::new(self.y, self.x)
        } else {
            Point::new(self.x, self.y)
        };
        if self.x == self.x_end {
            self.done = true;
        } else {
            self.x += 1;
            self.err -= self.dy;
            if self.err < 0 {
                self.y += self.ystep;
                self.err += self.dx;
            }
        }
        Some(point)
    }
}

/// Ordered pixel path from `from` to `to`, both endpoints included.
pub fn trace(from: Point, to: Point) -> Vec<Point> {
    let (line, reversed) = Line::new(from, to);
    let mut points: Vec<Point> = line.collect();
    if reversed {
        points.reverse();
    }
    points
}

/// Appends the path from `from` to `to` to the queue and returns the number
/// of points written.
///
/// A full queue is a capacity misconfiguration: a partially written segment
/// would corrupt the ball's path, so the caller must treat the error as fatal.
pub fn rasterize(
    queue: &mut TrajectoryQueue,
    from: Point,
    to: Point,
) -> Result<usize, GameError> {
    let points = trace(from, to);
    for &point in &points {
        if !queue.put(point) {
            return Err(GameError::TrajectoryOverflow {
                capacity: queue.capacity(),
            });
        }
    }
    Ok(points.len())
}
