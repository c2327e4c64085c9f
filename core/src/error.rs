use thiserror::Error;

/// Faults raised while running a match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// A rasterized segment did not fit in the trajectory queue. Paths are
    /// bounded by the screen, so this means the capacity is misconfigured.
    #[error("trajectory queue overflow: segment does not fit in capacity {capacity}")]
    TrajectoryOverflow { capacity: usize },

    #[error("match is not in play")]
    NotInPlay,
}

/// Rejected construction-time configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("screen {width}x{height} is too small")]
    ScreenTooSmall { width: u32, height: u32 },

    #[error("paddle length {length} must be at least 2 and shorter than the screen height {height}")]
    PaddleLength { length: u32, height: u32 },

    #[error("win score must be at least 1")]
    WinScore,

    #[error("boundary inset {inset} must be at least 1 and under half the {width} pixel width")]
    BoundaryInset { inset: u32, width: u32 },

    #[error("queue capacity {capacity} is below the longest segment requirement of {required}")]
    QueueCapacity { capacity: usize, required: usize },
}
