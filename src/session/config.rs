//! Session-level configuration, constructor-injected into `SessionManager`.

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum number of concurrently open game instances.
    pub max_games: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_games: 1024 }
    }
}

impl SessionConfig {
    pub fn with_max_games(max_games: usize) -> Self {
        Self { max_games }
    }
}
