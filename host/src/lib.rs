use std::fs;
use std::path::Path;

use anyhow::{bail, ensure, Context};
use paddle_core::{frame_digest, ControlUpdate, Game, GameConfig, PeerId, RecordingRenderer, Side};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub mod canvas;
pub mod live;

pub use canvas::{FrameBuffer, TracingRenderer};
pub use live::{run_live, LiveOptions, LiveSummary};

/// Largest JSON input accepted from disk (DoS protection)
pub const MAX_INPUT_SIZE: u64 = 10 * 1024 * 1024; // 10 MB

/// Longest match a script may request
pub const MAX_SCRIPT_TICKS: u64 = 10_000_000;

/// Script and report format version
pub const FORMAT_VERSION: u32 = 1;

/// Controller input recorded against tick numbers, replayed headless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlScript {
    pub v: u32,
    /// Left and right controller, paired in this order.
    pub peers: [PeerId; 2],
    /// Tick on which the match starts. Without it the match waits for a
    /// serve edge once both peers are paired.
    #[serde(default)]
    pub start_tick: Option<u64>,
    pub max_ticks: u64,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStep {
    pub tick: u64,
    pub peer: PeerId,
    #[serde(default)]
    pub angle: Option<f32>,
    #[serde(default)]
    pub serve: bool,
}

impl ScriptStep {
    pub fn update(&self) -> ControlUpdate {
        ControlUpdate {
            angle: self.angle,
            serve_edge: self.serve,
        }
    }
}

impl ControlScript {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.v == FORMAT_VERSION, "Unsupported script version: {}", self.v);
        ensure!(
            self.peers[0] != self.peers[1],
            "Both sides are bound to {}",
            self.peers[0]
        );
        ensure!(
            self.max_ticks > 0 && self.max_ticks <= MAX_SCRIPT_TICKS,
            "maxTicks must be between 1 and {}, got {}",
            MAX_SCRIPT_TICKS,
            self.max_ticks
        );
        if let Some(pair) = self.steps.windows(2).find(|pair| pair[1].tick < pair[0].tick) {
            bail!(
                "Steps out of order: tick {} follows tick {}",
                pair[1].tick,
                pair[0].tick
            );
        }
        Ok(())
    }
}

/// Outcome of a headless match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub v: u32,
    pub left_score: u32,
    pub right_score: u32,
    pub winner: Option<Side>,
    /// Ticks run while the match was in play
    pub ticks: u64,
    pub serves: u32,
    pub paddle_hits: u32,
    pub wall_bounces: u32,
    pub goals: u32,
    pub draw_calls: u64,
    /// Hex SHA-256 of every draw call, see [`frame_digest`]
    pub frame_digest: String,
    /// Not compared on verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl MatchReport {
    fn from_game(game: &Game<RecordingRenderer>) -> Self {
        let score = game.score();
        let stats = game.stats();
        let calls = &game.renderer().calls;
        Self {
            v: FORMAT_VERSION,
            left_score: score.left,
            right_score: score.right,
            winner: game.match_state().winner(),
            ticks: stats.ticks,
            serves: stats.serves,
            paddle_hits: stats.paddle_hits,
            wall_bounces: stats.wall_bounces,
            goals: stats.goals,
            draw_calls: calls.len() as u64,
            frame_digest: hex::encode(frame_digest(calls)),
            created_at: None,
        }
    }
}

/// Plays `script` against a fresh game and reports the outcome.
///
/// Steps for a tick are applied before that tick runs. The run ends when the
/// match is won or after `maxTicks` ticks.
pub fn run_script(config: &GameConfig, script: &ControlScript) -> anyhow::Result<MatchReport> {
    script.validate()?;
    let mut game = Game::new(*config, RecordingRenderer::default())
        .context("Invalid game configuration")?;
    for peer in script.peers {
        game.pair_peer(peer);
    }

    tracing::info!(
        "Replaying {} steps over at most {} ticks",
        script.steps.len(),
        script.max_ticks
    );

    let mut steps = script.steps.iter().peekable();
    for tick in 0..script.max_ticks {
        while let Some(step) = steps.next_if(|step| step.tick == tick) {
            game.apply_control_update(step.peer, step.update());
        }
        if script.start_tick == Some(tick) {
            game.start_match();
        }
        game.tick().with_context(|| format!("Tick {tick} failed"))?;
        if game.match_state().is_finished() {
            break;
        }
    }

    let report = MatchReport::from_game(&game);
    tracing::info!(
        "Replay finished after {} ticks: {}-{}",
        report.ticks,
        report.left_score,
        report.right_score
    );
    Ok(report)
}

/// Replays `script` and checks that `report` matches it field by field.
pub fn verify_report(
    config: &GameConfig,
    script: &ControlScript,
    report: &MatchReport,
) -> anyhow::Result<MatchReport> {
    ensure!(report.v == FORMAT_VERSION, "Unsupported report version: {}", report.v);
    let replay = run_script(config, script)?;

    macro_rules! compare {
        ($($field:ident => $name:literal),* $(,)?) => {
            $(
                if report.$field != replay.$field {
                    bail!(
                        "{} mismatch: report has {:?}, replay produced {:?}",
                        $name,
                        report.$field,
                        replay.$field
                    );
                }
            )*
        };
    }
    compare! {
        left_score => "leftScore",
        right_score => "rightScore",
        winner => "winner",
        ticks => "ticks",
        serves => "serves",
        paddle_hits => "paddleHits",
        wall_bounces => "wallBounces",
        goals => "goals",
        draw_calls => "drawCalls",
        frame_digest => "frameDigest",
    }

    tracing::info!("Report verified against replay");
    Ok(replay)
}

/// Reads and parses a JSON file, refusing anything over [`MAX_INPUT_SIZE`].
pub fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let metadata =
        fs::metadata(path).with_context(|| format!("Error accessing file '{}'", path.display()))?;
    ensure!(
        metadata.len() <= MAX_INPUT_SIZE,
        "File too large: {} bytes (max {} bytes)",
        metadata.len(),
        MAX_INPUT_SIZE
    );
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Error reading file '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Error parsing JSON in '{}'", path.display()))
}

pub fn save_json<T: Serialize>(value: &T, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Error writing '{}'", path.display()))?;
    Ok(())
}

/// Loads a configuration file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<GameConfig> {
    let config = match path {
        Some(path) => load_json(path)?,
        None => GameConfig::default(),
    };
    config.validate().context("Invalid game configuration")?;
    Ok(config)
}
