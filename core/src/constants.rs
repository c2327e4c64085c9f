// Default configuration constants.
// These match the original master node hardware: an ST7735 panel in
// landscape rotation with both paddles inset from the short edges.

/// Screen width (pixels, long side)
pub const SCREEN_WIDTH: u32 = 160;

/// Screen height (pixels, short side). Row `SCREEN_HEIGHT` is the floor contact row.
pub const SCREEN_HEIGHT: u32 = 128;

/// Paddle length (pixels)
pub const PADDLE_LENGTH: u32 = 20;

/// Distance of each boundary column from its screen edge (pixels)
pub const BOUNDARY_INSET: u32 = 10;

/// Points needed to win the match
pub const WIN_SCORE: u32 = 5;

/// Trajectory queue capacity (one slot is always reserved)
pub const QUEUE_CAPACITY: usize = 256;

/// Tick period of the reference scheduler (milliseconds)
pub const TICK_PERIOD_MS: u64 = 10;

/// Paddle angle assumed before a controller reports in (radians, paddle centred)
pub const INITIAL_ANGLE: f32 = core::f32::consts::FRAC_PI_2;

/// Pending control updates buffered between two ticks
pub const CONTROL_CHANNEL_CAPACITY: usize = 64;

/// Version prefix of the frame digest
pub const DIGEST_VERSION: &[u8] = b"PADDLEv1";
