use paddle_core::{GameConfig, Point, Renderer, Side};
use tracing::trace;

/// Monochrome pixel grid standing in for the master's display.
///
/// Rows run `0..=screenHeight` so the floor contact row is addressable.
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
    columns: [i32; 2],
    scores: [u32; 2],
    winner: Option<Side>,
}

impl FrameBuffer {
    pub fn new(config: &GameConfig) -> Self {
        let width = config.screen_width as usize;
        let height = config.screen_height as usize + 1;
        Self {
            width,
            height,
            pixels: vec![false; width * height],
            columns: [
                config.boundary_column(Side::Left),
                config.boundary_column(Side::Right),
            ],
            scores: [0; 2],
            winner: None,
        }
    }

    pub fn is_lit(&self, point: Point) -> bool {
        self.index(point).map(|i| self.pixels[i]).unwrap_or(false)
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|lit| **lit).count()
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// Score line followed by the grid, two columns by four rows per character.
    pub fn to_ascii(&self) -> String {
        let mut out = format!("{:>3} : {:<3}", self.scores[0], self.scores[1]);
        if let Some(winner) = self.winner {
            out.push_str(&format!("  game over, {winner} wins"));
        }
        out.push('\n');
        for block_y in (0..self.height).step_by(4) {
            for block_x in (0..self.width).step_by(2) {
                let lit = (block_y..(block_y + 4).min(self.height)).any(|y| {
                    (block_x..(block_x + 2).min(self.width))
                        .any(|x| self.pixels[y * self.width + x])
                });
                out.push(if lit { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }

    fn index(&self, point: Point) -> Option<usize> {
        let x = usize::try_from(point.x).ok().filter(|x| *x < self.width)?;
        let y = usize::try_from(point.y).ok().filter(|y| *y < self.height)?;
        Some(y * self.width + x)
    }

    fn set(&mut self, point: Point, lit: bool) {
        if let Some(i) = self.index(point) {
            self.pixels[i] = lit;
        }
    }

    fn paddle(&mut self, side: Side, top: i32, length: u32, lit: bool) {
        let x = self.columns[side.index()];
        for y in top..=top + length as i32 {
            self.set(Point::new(x, y), lit);
        }
    }
}

impl Renderer for FrameBuffer {
    fn erase_at(&mut self, point: Point) {
        self.set(point, false);
    }

    fn erase_paddle(&mut self, side: Side, top: i32, length: u32) {
        self.paddle(side, top, length, false);
    }

    fn draw_paddle(&mut self, side: Side, top: i32, length: u32) {
        self.paddle(side, top, length, true);
    }

    fn draw_ball(&mut self, point: Point) {
        self.set(point, true);
    }

    fn draw_score(&mut self, side: Side, value: u32) {
        self.scores[side.index()] = value;
    }

    fn on_game_over(&mut self, winner: Side) {
        self.winner = Some(winner);
    }
}

/// Logs every draw call at trace level before forwarding it.
pub struct TracingRenderer<R> {
    inner: R,
}

impl<R: Renderer> TracingRenderer<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Renderer> Renderer for TracingRenderer<R> {
    fn erase_at(&mut self, point: Point) {
        trace!(%point, "erase");
        self.inner.erase_at(point);
    }

    fn erase_paddle(&mut self, side: Side, top: i32, length: u32) {
        trace!(%side, top, length, "erase paddle");
        self.inner.erase_paddle(side, top, length);
    }

    fn draw_paddle(&mut self, side: Side, top: i32, length: u32) {
        trace!(%side, top, length, "draw paddle");
        self.inner.draw_paddle(side, top, length);
    }

    fn draw_ball(&mut self, point: Point) {
        trace!(%point, "draw ball");
        self.inner.draw_ball(point);
    }

    fn draw_score(&mut self, side: Side, value: u32) {
        tracing::debug!(%side, value, "score");
        self.inner.draw_score(side, value);
    }

    fn on_game_over(&mut self, winner: Side) {
        tracing::debug!(%winner, "game over");
        self.inner.on_game_over(winner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> FrameBuffer {
        FrameBuffer::new(&GameConfig::default())
    }

    #[test]
    fn paddles_are_drawn_on_their_boundary_column() {
        let mut fb = buffer();
        fb.draw_paddle(Side::Right, 54, 20);
        assert!(fb.is_lit(Point::new(150, 54)));
        assert!(fb.is_lit(Point::new(150, 74)));
        assert!(!fb.is_lit(Point::new(150, 75)));
        assert_eq!(fb.lit_count(), 21);

        fb.erase_paddle(Side::Right, 54, 20);
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn floor_row_is_addressable_and_off_screen_is_ignored() {
        let mut fb = buffer();
        fb.draw_ball(Point::new(0, 128));
        fb.draw_ball(Point::new(-1, 5));
        fb.draw_ball(Point::new(160, 5));
        assert_eq!(fb.lit_count(), 1);
        fb.erase_at(Point::new(0, 128));
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn ascii_snapshot_downsamples_the_grid() {
        let mut fb = buffer();
        fb.draw_score(Side::Left, 2);
        fb.draw_ball(Point::new(3, 5));
        let ascii = fb.to_ascii();
        let lines: Vec<&str> = ascii.lines().collect();
        // Score line, then 129 rows in blocks of four.
        assert_eq!(lines.len(), 1 + 33);
        assert!(lines[0].contains("2 : 0"));
        assert!(lines[1..].iter().all(|line| line.len() == 80));
        assert_eq!(lines[2].chars().nth(1), Some('#'));
        assert_eq!(ascii.matches('#').count(), 1);
    }

    #[test]
    fn tracing_renderer_forwards_every_call() {
        let mut renderer = TracingRenderer::new(buffer());
        renderer.draw_ball(Point::new(10, 10));
        renderer.on_game_over(Side::Left);
        assert!(renderer.inner().is_lit(Point::new(10, 10)));
        assert_eq!(renderer.into_inner().winner(), Some(Side::Left));
    }
}
