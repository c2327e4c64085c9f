//! The authoritative match: ball, paddles, score and the per-tick loop.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::control::{ControlReceiver, ControlUpdate, PeerId, PeerTable};
use crate::error::{ConfigError, GameError};
use crate::geometry::{Point, Side};
use crate::goal::{GoalJudge, Verdict};
use crate::paddle::{PaddleModel, PaddleState};
use crate::physics::ReflectionSolver;
use crate::raster::rasterize;
use crate::render::Renderer;
use crate::trajectory::TrajectoryQueue;

/// Position and motion of the ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallState {
    pub current: Point,
    /// Position drawn on the previous tick, erased on the next one.
    pub previous: Point,
    /// Start of the active segment; anchors the angle of incidence.
    pub path_start: Point,
    pub path_end: Point,
    pub moving: bool,
    /// Disarms the goal judge until the ball crosses the centre column.
    pub paddle_recently_hit: bool,
    /// Side the ball is travelling toward.
    pub heading: Side,
    /// Side whose paddle holds the ball while it is parked.
    pub server: Side,
}

impl BallState {
    pub fn parked(at: Point, server: Side) -> Self {
        Self {
            current: at,
            previous: at,
            path_start: at,
            path_end: at,
            moving: false,
            paddle_recently_hit: false,
            heading: server.opponent(),
            server,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

impl Score {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// Adds a point for `side` and returns its new total.
    pub fn award(&mut self, side: Side) -> u32 {
        let slot = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        *slot += 1;
        *slot
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    AwaitingStart,
    InPlay,
    Finished(Side),
}

impl MatchState {
    pub fn is_finished(&self) -> bool {
        matches!(self, MatchState::Finished(_))
    }

    pub fn winner(&self) -> Option<Side> {
        match self {
            MatchState::Finished(side) => Some(*side),
            _ => None,
        }
    }
}

/// Milestone reached during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    Served(Side),
    PaddleHit(Side),
    WallBounce,
    Goal { scorer: Side, points: u32 },
    MatchWon { winner: Side, points: u32 },
}

/// Renderable state produced by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub ball: Point,
    pub paddle_rows: [i32; 2],
    pub moving: bool,
    pub event: Option<TickEvent>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStats {
    pub ticks: u64,
    pub serves: u32,
    pub paddle_hits: u32,
    pub wall_bounces: u32,
    pub goals: u32,
}

/// Master-side game state, advanced one tick at a time.
pub struct Game<R: Renderer> {
    config: GameConfig,
    paddle_model: PaddleModel,
    solver: ReflectionSolver,
    judge: GoalJudge,
    queue: TrajectoryQueue,
    ball: BallState,
    paddles: [PaddleState; 2],
    score: Score,
    state: MatchState,
    peers: PeerTable,
    stats: MatchStats,
    /// Paddle rows drawn on the previous tick.
    drawn_rows: Option<[i32; 2]>,
    renderer: R,
}

impl<R: Renderer> Game<R> {
    pub fn new(config: GameConfig, renderer: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let paddle_model = PaddleModel::new(&config);
        let paddles = [PaddleState::new(&paddle_model); 2];
        let first = config.first_server;
        let mut game = Self {
            paddle_model,
            solver: ReflectionSolver::new(&config),
            judge: GoalJudge::new(&config),
            queue: TrajectoryQueue::new(config.queue_capacity),
            ball: BallState::parked(Point::default(), first),
            paddles,
            score: Score::default(),
            state: MatchState::AwaitingStart,
            peers: PeerTable::default(),
            stats: MatchStats::default(),
            drawn_rows: None,
            renderer,
            config,
        };
        game.ball = BallState::parked(game.park_point(first), first);
        Ok(game)
    }

    /// Binds a controller to the next free side.
    pub fn pair_peer(&mut self, peer: PeerId) -> Option<Side> {
        let side = self.peers.pair(peer);
        match side {
            Some(side) => info!(%peer, %side, "peer paired"),
            None => warn!(%peer, "both sides already paired"),
        }
        side
    }

    /// Records a controller update for the paddle bound to `peer`.
    ///
    /// Unknown peers are paired while the match awaits its start and ignored
    /// afterwards. A serve edge from a paired peer before the start is the
    /// start edge once both sides are bound.
    pub fn apply_control_update(&mut self, peer: PeerId, update: ControlUpdate) -> bool {
        let side = match self.peers.side_of(peer) {
            Some(side) => side,
            None if self.state == MatchState::AwaitingStart => match self.pair_peer(peer) {
                Some(side) => side,
                None => return false,
            },
            None => {
                warn!(%peer, "ignoring update from unpaired peer");
                return false;
            }
        };

        if let Some(angle) = update.angle {
            self.paddles[side.index()].set_angle(angle);
        }
        if update.serve_edge {
            match self.state {
                MatchState::AwaitingStart if self.peers.is_complete() => {
                    self.start_match();
                }
                MatchState::AwaitingStart => debug!(%peer, "serve edge before both sides paired"),
                MatchState::InPlay => self.paddles[side.index()].serve_pending = true,
                MatchState::Finished(_) => {}
            }
        }
        true
    }

    /// Applies every pending update on the control channel.
    pub fn drain_controls(&mut self, controls: &mut ControlReceiver) -> usize {
        let mut applied = 0;
        while let Some(envelope) = controls.try_recv() {
            self.apply_control_update(envelope.peer, envelope.update);
            applied += 1;
        }
        applied
    }

    pub fn start_match(&mut self) -> bool {
        if self.state != MatchState::AwaitingStart {
            return false;
        }
        let server = self.config.first_server;
        self.ball = BallState::parked(self.park_point(server), server);
        self.state = MatchState::InPlay;
        for side in Side::BOTH {
            self.renderer.draw_score(side, 0);
        }
        info!(%server, "match started");
        true
    }

    /// Advances the match by one tick. A no-op unless the match is in play.
    pub fn tick(&mut self) -> Result<Option<Frame>, GameError> {
        if self.state != MatchState::InPlay {
            return Ok(None);
        }
        self.stats.ticks += 1;

        let length = self.config.paddle_length;
        if let Some(rows) = self.drawn_rows {
            for side in Side::BOTH {
                self.renderer.erase_paddle(side, rows[side.index()], length);
            }
            self.renderer.erase_at(self.ball.previous);
        }

        for paddle in &mut self.paddles {
            paddle.recompute(&self.paddle_model);
        }
        let serves = [self.paddles[0].take_serve(), self.paddles[1].take_serve()];

        let event = if self.ball.moving {
            if serves.contains(&true) {
                debug!("dropping serve edge while the ball is in play");
            }
            self.advance_ball()?
        } else {
            self.hold_or_serve(serves)?
        };

        let rows = [self.paddles[0].row(), self.paddles[1].row()];
        for side in Side::BOTH {
            self.renderer.draw_paddle(side, rows[side.index()], length);
        }
        self.renderer.draw_ball(self.ball.current);
        self.ball.previous = self.ball.current;
        self.drawn_rows = Some(rows);

        Ok(Some(Frame {
            ball: self.ball.current,
            paddle_rows: rows,
            moving: self.ball.moving,
            event,
        }))
    }

    /// Launches the parked ball from the server's paddle. Returns `false`
    /// when the ball is already moving.
    pub fn serve(&mut self) -> Result<bool, GameError> {
        if self.state != MatchState::InPlay {
            return Err(GameError::NotInPlay);
        }
        if self.ball.moving {
            return Ok(false);
        }
        let server = self.ball.server;
        let contact = self.park_point(server);
        // The parked ball sits on the paddle centre: a straight shot.
        let destination = Point::new(self.solver.column(server.opponent()), contact.y);
        self.set_in_motion(contact, server.opponent(), true);
        self.begin_segment(contact, destination)?;
        self.stats.serves += 1;
        info!(%server, from = %contact, "serve");
        Ok(true)
    }

    /// Puts the ball in motion along `from -> to`, bypassing the serve rules.
    pub fn launch(&mut self, from: Point, to: Point) -> Result<(), GameError> {
        if self.state != MatchState::InPlay {
            return Err(GameError::NotInPlay);
        }
        let heading = if to.x < from.x { Side::Left } else { Side::Right };
        let on_boundary = Side::BOTH.iter().any(|side| self.solver.column(*side) == from.x);
        self.set_in_motion(from, heading, on_boundary);
        self.begin_segment(from, to)
    }

    pub fn ball(&self) -> &BallState {
        &self.ball
    }

    pub fn paddle(&self, side: Side) -> &PaddleState {
        &self.paddles[side.index()]
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn match_state(&self) -> MatchState {
        self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn peers(&self) -> &PeerTable {
        &self.peers
    }

    pub fn stats(&self) -> MatchStats {
        self.stats
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    fn advance_ball(&mut self) -> Result<Option<TickEvent>, GameError> {
        let Some(next) = self.queue.get() else {
            return self.continue_path();
        };
        self.ball.current = next;
        if next.x == self.config.centre_column() {
            self.ball.paddle_recently_hit = false;
        }

        let tops = [self.paddles[0].top_current, self.paddles[1].top_current];
        match self.judge.judge(&self.ball, tops) {
            Verdict::PaddleHit(side) => {
                self.return_from_paddle(side)?;
                Ok(Some(TickEvent::PaddleHit(side)))
            }
            Verdict::Goal { conceded } => Ok(Some(self.concede(conceded))),
            Verdict::Clear if self.queue.is_empty() => self.continue_path(),
            Verdict::Clear => Ok(None),
        }
    }

    /// Plans the next segment once the active one is used up.
    fn continue_path(&mut self) -> Result<Option<TickEvent>, GameError> {
        let ball = self.ball;
        if self.solver.is_wall_row(ball.current.y) && ball.current != ball.path_start {
            let destination = self.solver.wall_bounce(ball.current, ball.path_start, ball.heading);
            debug!(contact = %ball.current, %destination, "wall bounce");
            self.ball.path_start = ball.current;
            self.begin_segment(ball.current, destination)?;
            self.stats.wall_bounces += 1;
            return Ok(Some(TickEvent::WallBounce));
        }
        let destination = self.solver.extend(ball.current, ball.path_start, ball.heading);
        debug!(from = %ball.current, %destination, "extending segment");
        self.begin_segment(ball.current, destination)?;
        Ok(None)
    }

    fn return_from_paddle(&mut self, side: Side) -> Result<(), GameError> {
        let contact = self.ball.current;
        let top = self.paddles[side.index()].top_current;
        let destination = self.solver.paddle_bounce(contact, top, side);
        debug!(%side, %contact, %destination, "paddle hit");
        self.set_in_motion(contact, side.opponent(), true);
        self.begin_segment(contact, destination)?;
        self.stats.paddle_hits += 1;
        Ok(())
    }

    fn concede(&mut self, conceded: Side) -> TickEvent {
        let scorer = conceded.opponent();
        self.queue.reset();
        self.ball = BallState::parked(self.park_point(conceded), conceded);
        let points = self.score.award(scorer);
        self.stats.goals += 1;
        self.renderer.draw_score(scorer, points);

        if points >= self.config.win_score {
            self.state = MatchState::Finished(scorer);
            self.renderer.on_game_over(scorer);
            info!(winner = %scorer, left = self.score.left, right = self.score.right, "match won");
            TickEvent::MatchWon {
                winner: scorer,
                points,
            }
        } else {
            info!(%scorer, left = self.score.left, right = self.score.right, "goal");
            TickEvent::Goal { scorer, points }
        }
    }

    /// Keeps the parked ball on the server's paddle and serves on its edge.
    fn hold_or_serve(&mut self, serves: [bool; 2]) -> Result<Option<TickEvent>, GameError> {
        let server = self.ball.server;
        self.ball.current = self.park_point(server);
        if serves[server.opponent().index()] {
            debug!(side = %server.opponent(), "ignoring serve edge from the receiving side");
        }
        if serves[server.index()] && self.serve()? {
            return Ok(Some(TickEvent::Served(server)));
        }
        Ok(None)
    }

    fn set_in_motion(&mut self, from: Point, heading: Side, armed_guard: bool) {
        self.ball.current = from;
        self.ball.path_start = from;
        self.ball.moving = true;
        self.ball.heading = heading;
        self.ball.paddle_recently_hit = armed_guard;
    }

    /// Queues `from -> to`. The ball already sits on `from`, so that point
    /// is dropped from the front of the queue.
    fn begin_segment(&mut self, from: Point, to: Point) -> Result<(), GameError> {
        self.queue.reset();
        rasterize(&mut self.queue, from, to)?;
        self.queue.get();
        self.ball.path_end = to;
        Ok(())
    }

    fn park_point(&self, side: Side) -> Point {
        let row = self.paddles[side.index()].centre_row(self.config.paddle_length);
        Point::new(self.solver.column(side), row)
    }
}

#[cfg(test)]
mod tests {
    use core::f32::consts::PI;

    use super::*;
    use crate::render::{DrawCall, RecordingRenderer};

    const LEFT: PeerId = PeerId(1);
    const RIGHT: PeerId = PeerId(2);

    fn paired(config: GameConfig) -> Game<RecordingRenderer> {
        let mut game = Game::new(config, RecordingRenderer::default()).unwrap();
        assert_eq!(game.pair_peer(LEFT), Some(Side::Left));
        assert_eq!(game.pair_peer(RIGHT), Some(Side::Right));
        game
    }

    fn tick_until(
        game: &mut Game<RecordingRenderer>,
        limit: usize,
        wanted: impl Fn(&TickEvent) -> bool,
    ) -> (usize, TickEvent) {
        for n in 1..=limit {
            let frame = game.tick().unwrap().expect("match in play");
            if let Some(event) = frame.event {
                if wanted(&event) {
                    return (n, event);
                }
            }
        }
        panic!("no matching event within {limit} ticks");
    }

    #[test]
    fn ticks_before_the_start_do_nothing() {
        let mut game = paired(GameConfig::default());
        assert_eq!(game.tick().unwrap(), None);
        assert!(game.renderer().calls.is_empty());
        assert_eq!(game.stats().ticks, 0);
    }

    #[test]
    fn ball_starts_parked_on_the_first_server() {
        let mut game = paired(GameConfig::default());
        assert!(game.start_match());
        assert!(!game.start_match());
        let frame = game.tick().unwrap().unwrap();
        assert_eq!(frame.ball, Point::new(10, 64));
        assert!(!frame.moving);
        assert_eq!(frame.paddle_rows, [54, 54]);
    }

    #[test]
    fn start_draws_both_scores_at_zero() {
        let mut game = paired(GameConfig::default());
        game.start_match();
        assert_eq!(
            game.renderer().calls,
            vec![
                DrawCall::DrawScore {
                    side: Side::Left,
                    value: 0
                },
                DrawCall::DrawScore {
                    side: Side::Right,
                    value: 0
                },
            ]
        );
    }

    #[test]
    fn unknown_peers_pair_before_the_start_only() {
        let mut game = Game::new(GameConfig::default(), RecordingRenderer::default()).unwrap();
        assert!(game.apply_control_update(PeerId(5), ControlUpdate::angle(1.0)));
        assert!(game.apply_control_update(PeerId(6), ControlUpdate::angle(2.0)));
        assert_eq!(game.peers().peer(Side::Left), Some(PeerId(5)));
        assert_eq!(game.peers().peer(Side::Right), Some(PeerId(6)));
        assert!(!game.apply_control_update(PeerId(7), ControlUpdate::angle(1.0)));

        game.start_match();
        assert!(!game.apply_control_update(PeerId(7), ControlUpdate::serve()));
    }

    #[test]
    fn serve_edge_starts_a_fully_paired_match() {
        let mut game = Game::new(GameConfig::default(), RecordingRenderer::default()).unwrap();
        game.apply_control_update(LEFT, ControlUpdate::serve());
        assert_eq!(game.match_state(), MatchState::AwaitingStart);
        game.apply_control_update(RIGHT, ControlUpdate::serve());
        assert_eq!(game.match_state(), MatchState::InPlay);
        // The start edge is not also a serve.
        game.tick().unwrap();
        assert!(!game.ball().moving);
    }

    #[test]
    fn only_the_server_can_serve() {
        let mut game = paired(GameConfig::default());
        game.start_match();
        game.apply_control_update(RIGHT, ControlUpdate::serve());
        assert_eq!(game.tick().unwrap().unwrap().event, None);
        assert!(!game.ball().moving);

        game.apply_control_update(LEFT, ControlUpdate::serve());
        let frame = game.tick().unwrap().unwrap();
        assert_eq!(frame.event, Some(TickEvent::Served(Side::Left)));
        assert!(game.ball().moving);
        assert_eq!(game.ball().path_end, Point::new(150, 64));
        assert_eq!(game.stats().serves, 1);
    }

    #[test]
    fn missed_ball_scores_for_the_opponent() {
        let mut game = paired(GameConfig::default());
        game.apply_control_update(RIGHT, ControlUpdate::angle(PI));
        game.start_match();
        game.apply_control_update(LEFT, ControlUpdate::serve());

        let (ticks, event) = tick_until(&mut game, 200, |e| matches!(e, TickEvent::Goal { .. }));
        // One tick to serve, then one pixel per tick from column 10 to 150.
        assert_eq!(ticks, 141);
        assert_eq!(
            event,
            TickEvent::Goal {
                scorer: Side::Left,
                points: 1
            }
        );
        assert_eq!(game.score(), Score { left: 1, right: 0 });
        assert_eq!(game.score().get(Side::Right), 0);
        assert_eq!(game.stats().goals, 1);
        assert!(!game.ball().moving);
        assert_eq!(game.ball().server, Side::Right);
        assert_eq!(game.ball().current, Point::new(150, 10));
        assert_eq!(
            game.renderer().scores().collect::<Vec<_>>(),
            vec![(Side::Left, 0), (Side::Right, 0), (Side::Left, 1)]
        );
    }

    #[test]
    fn paddle_hit_reflects_to_a_wall_row() {
        let config = GameConfig {
            boundary_inset: 13,
            ..GameConfig::default()
        };
        let mut game = paddle_at_row_50(config);
        game.launch(Point::new(13, 64), Point::new(147, 64)).unwrap();

        let (_, event) = tick_until(&mut game, 200, |e| matches!(e, TickEvent::PaddleHit(_)));
        assert_eq!(event, TickEvent::PaddleHit(Side::Right));
        let ball = game.ball();
        assert!(ball.moving);
        assert_eq!(ball.current, Point::new(147, 64));
        assert_eq!(ball.heading, Side::Left);
        assert_eq!(ball.path_end, Point::new(59, 0));
    }

    #[test]
    fn return_bounces_off_the_ceiling() {
        let config = GameConfig {
            boundary_inset: 13,
            ..GameConfig::default()
        };
        let mut game = paddle_at_row_50(config);
        game.launch(Point::new(13, 64), Point::new(147, 64)).unwrap();
        tick_until(&mut game, 200, |e| matches!(e, TickEvent::PaddleHit(_)));

        let (ticks, _) = tick_until(&mut game, 200, |e| *e == TickEvent::WallBounce);
        assert_eq!(ticks, 88);
        assert_eq!(game.ball().current, Point::new(59, 0));
        assert_eq!(game.ball().path_start, Point::new(59, 0));
        assert_eq!(game.ball().path_end, Point::new(13, 33));
        assert_eq!(game.stats().wall_bounces, 1);
    }

    fn paddle_at_row_50(config: GameConfig) -> Game<RecordingRenderer> {
        let mut game = paired(config);
        let angle = (108.0 - 50.0) * PI / 108.0;
        game.apply_control_update(RIGHT, ControlUpdate::angle(angle));
        game.start_match();
        game.tick().unwrap();
        assert_eq!(game.paddle(Side::Right).row(), 50);
        game
    }

    #[test]
    fn winning_goal_ends_the_match_for_good() {
        let config = GameConfig {
            win_score: 1,
            ..GameConfig::default()
        };
        let mut game = paired(config);
        game.apply_control_update(RIGHT, ControlUpdate::angle(PI));
        game.start_match();
        game.apply_control_update(LEFT, ControlUpdate::serve());

        let (_, event) = tick_until(&mut game, 200, |e| matches!(e, TickEvent::MatchWon { .. }));
        assert_eq!(
            event,
            TickEvent::MatchWon {
                winner: Side::Left,
                points: 1
            }
        );
        assert_eq!(game.match_state(), MatchState::Finished(Side::Left));
        let game_overs: Vec<_> = game
            .renderer()
            .calls
            .iter()
            .filter(|call| matches!(call, DrawCall::GameOver { .. }))
            .collect();
        assert_eq!(game_overs, [&DrawCall::GameOver { winner: Side::Left }]);

        let calls = game.renderer().calls.len();
        let ticks = game.stats().ticks;
        for _ in 0..10 {
            assert_eq!(game.tick().unwrap(), None);
        }
        assert_eq!(game.renderer().calls.len(), calls);
        assert_eq!(game.stats().ticks, ticks);
        assert_eq!(game.serve(), Err(GameError::NotInPlay));
    }

    #[test]
    fn each_tick_erases_what_the_previous_one_drew() {
        let mut game = paired(GameConfig::default());
        game.start_match();
        game.tick().unwrap();
        game.renderer_mut().calls.clear();
        game.tick().unwrap();
        assert_eq!(
            game.renderer().calls[..3],
            [
                DrawCall::ErasePaddle {
                    side: Side::Left,
                    top: 54,
                    length: 20
                },
                DrawCall::ErasePaddle {
                    side: Side::Right,
                    top: 54,
                    length: 20
                },
                DrawCall::EraseAt {
                    point: Point::new(10, 64)
                },
            ]
        );
    }

    #[test]
    fn non_finite_angles_leave_the_paddle_in_place() {
        let mut game = paired(GameConfig::default());
        game.start_match();
        game.apply_control_update(LEFT, ControlUpdate::angle(f32::NAN));
        game.apply_control_update(RIGHT, ControlUpdate::angle(f32::INFINITY));
        let frame = game.tick().unwrap().unwrap();
        assert_eq!(frame.paddle_rows, [54, 54]);
    }

    #[test]
    fn launch_requires_a_match_in_play() {
        let mut game = paired(GameConfig::default());
        assert_eq!(
            game.launch(Point::new(10, 64), Point::new(150, 64)),
            Err(GameError::NotInPlay)
        );
    }

    #[test]
    fn undersized_queue_is_rejected_up_front() {
        let config = GameConfig {
            queue_capacity: 50,
            ..GameConfig::default()
        };
        assert!(Game::new(config, RecordingRenderer::default()).is_err());
    }
}
