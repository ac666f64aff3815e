/// Session configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How many items one claim call requests (default: `5`).
    pub batch_size: u32,
    /// Queue depth at or below which a background refill is triggered
    /// (default: `3`).
    pub low_water_mark: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            low_water_mark: 3,
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default |
    /// |--------------------|---------|
    /// | `CLAIM_BATCH_SIZE` | `5`     |
    /// | `QUEUE_LOW_WATER`  | `3`     |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let batch_size = std::env::var("CLAIM_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.batch_size);

        let low_water_mark = std::env::var("QUEUE_LOW_WATER")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.low_water_mark);

        Self {
            batch_size,
            low_water_mark,
        }
    }
}
