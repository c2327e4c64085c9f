//! Reflection geometry: wall bounces, paddle bounces and segment extension.
//!
//! Every destination is clipped to the target boundary column when the
//! projected line would cross it before reaching the wall row, so each
//! segment ends exactly on a wall row or on a boundary column.

use core::f32::consts::{FRAC_PI_2, PI};

use crate::config::GameConfig;
use crate::geometry::{Point, Side};

/// Computes the destination of the next path segment at each contact.
#[derive(Debug, Clone)]
pub struct ReflectionSolver {
    columns: [i32; 2],
    floor: i32,
    paddle_length: i32,
    /// Radians per paddle offset row; the centre row maps to a horizontal return.
    bounce_step: f32,
}

impl ReflectionSolver {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            columns: [
                config.boundary_column(Side::Left),
                config.boundary_column(Side::Right),
            ],
            floor: config.floor_row(),
            paddle_length: config.paddle_length as i32,
            bounce_step: PI / config.paddle_length as f32,
        }
    }

    pub fn is_wall_row(&self, y: i32) -> bool {
        y <= 0 || y >= self.floor
    }

    /// Offset of the contact within the paddle, 1-indexed from the top and
    /// kept off the two extreme rows so the angle is never 0 or π.
    pub fn bounce_index(&self, contact_y: i32, paddle_top: f32) -> i32 {
        let offset = (contact_y as f32 - paddle_top).round() as i32;
        offset.clamp(1, self.paddle_length - 1)
    }

    /// Exit angle from the paddle plane for a bounce index.
    pub fn bounce_angle(&self, index: i32) -> f32 {
        self.bounce_step * index as f32
    }

    /// Destination after the ball leaves `hit`'s paddle at `contact`.
    ///
    /// Contacts above the paddle centre exit toward the floor, contacts below
    /// it toward the ceiling, and the centre row returns straight across.
    pub fn paddle_bounce(&self, contact: Point, paddle_top: f32, hit: Side) -> Point {
        let toward = hit.opponent();
        let index = self.bounce_index(contact.y, paddle_top);
        if index * 2 == self.paddle_length {
            return Point::new(self.column(toward), contact.y);
        }

        let angle = self.bounce_angle(index);
        let (mut row, slope) = if angle < FRAC_PI_2 {
            (self.floor, angle.tan())
        } else {
            (0, (PI - angle).tan())
        };
        if row == contact.y {
            // Contact on the wall row itself: the bounce folds straight back.
            row = self.floor - row;
        }
        let run = (row - contact.y).abs() as f32;
        self.project(contact, toward, run * slope, row)
    }

    /// Destination after the ball meets a wall row at `contact`, the active
    /// segment having started at `path_start`.
    pub fn wall_bounce(&self, contact: Point, path_start: Point, heading: Side) -> Point {
        let next_row = if contact.y <= 0 { self.floor } else { 0 };
        let run_x = (contact.x - path_start.x).abs();
        let run_y = (contact.y - path_start.y).abs();
        if run_x == 0 {
            // Same-column contact: reflect straight back across the field.
            return Point::new(contact.x, next_row);
        }
        let theta = (run_y as f32 / run_x as f32).atan();
        let dx = self.floor as f32 / theta.tan();
        self.project(contact, heading, dx, next_row)
    }

    /// Continues the current direction of travel to its next contact.
    pub fn extend(&self, current: Point, path_start: Point, heading: Side) -> Point {
        let run_x = (current.x - path_start.x).abs();
        let run_y = current.y - path_start.y;
        if run_y == 0 {
            return Point::new(self.column(heading), current.y);
        }
        let row = if run_y > 0 { self.floor } else { 0 };
        if run_x == 0 {
            return Point::new(current.x, row);
        }
        let remaining = (row - current.y).abs() as f32;
        let dx = remaining * run_x as f32 / run_y.abs() as f32;
        self.project(current, heading, dx, row)
    }

    pub fn column(&self, side: Side) -> i32 {
        self.columns[side.index()]
    }

    /// Endpoint of a line leaving `from` toward `toward`'s boundary column
    /// that covers `dx` pixels horizontally on its way to `row`.
    fn project(&self, from: Point, toward: Side, dx: f32, row: i32) -> Point {
        let column = self.column(toward);
        let reach = (column - from.x).abs();
        // Always make horizontal progress so no segment degenerates to vertical.
        let step = (dx.round() as i32).max(1);
        if step < reach {
            return Point::new(from.x + toward.direction() * step, row);
        }
        // The boundary column comes first: stop there, part way to the row.
        let fraction = (reach as f32 / dx).min(1.0);
        let y = from.y + ((row - from.y) as f32 * fraction).round() as i32;
        Point::new(column, y)
    }
}
