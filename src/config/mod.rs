//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::battle::geometry::{PlayArea, Vec2};
use crate::battle::mode::PlayMode;
use crate::battle::position::{PlayerPos, Team};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS (comma-separated)
    pub client_origin: String,
    /// Seconds a created room may wait for its first member
    pub room_idle_ttl_secs: u64,
    /// Battle tuning shared by every room
    pub battle: BattleConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            room_idle_ttl_secs: parse_or("ROOM_IDLE_TTL_SECS", 60)?,
            battle: BattleConfig::from_env()?,
        })
    }
}

/// Battle tuning
#[derive(Clone, Debug, PartialEq)]
pub struct BattleConfig {
    /// Lower bound of the sling shot distance window
    pub min_sling_distance: f32,
    /// Upper bound of the sling shot distance window
    pub max_sling_distance: f32,
    /// Ball launch speed per unit of sling shot length
    pub ball_speed_multiplier: f32,
    /// First countdown value
    pub countdown_start: i32,
    /// Seconds between countdown values
    pub countdown_interval: f32,
    /// Mode given to participants when they are created
    pub initial_mode: PlayMode,
    /// Simulation frames per second
    pub frame_rate: u32,
    /// Arena spans [-half_width, half_width] x [-half_height, half_height]
    pub arena_half_width: f32,
    pub arena_half_height: f32,
    /// Start positions for slots 1..4
    pub start_positions: [Vec2; 4],
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            min_sling_distance: 1.0,
            max_sling_distance: 4.0,
            ball_speed_multiplier: 1.0,
            countdown_start: 3,
            countdown_interval: 1.0,
            initial_mode: PlayMode::Normal,
            frame_rate: 60,
            arena_half_width: 5.0,
            arena_half_height: 10.0,
            start_positions: [
                Vec2::new(-2.5, -6.0),
                Vec2::new(2.5, -6.0),
                Vec2::new(-2.5, 6.0),
                Vec2::new(2.5, 6.0),
            ],
        }
    }
}

impl BattleConfig {
    /// Load battle tuning from `BATTLE_*` variables, defaulting anything unset
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            min_sling_distance: parse_or(
                "BATTLE_MIN_SLING_DISTANCE",
                defaults.min_sling_distance,
            )?,
            max_sling_distance: parse_or(
                "BATTLE_MAX_SLING_DISTANCE",
                defaults.max_sling_distance,
            )?,
            ball_speed_multiplier: parse_or(
                "BATTLE_BALL_SPEED_MULTIPLIER",
                defaults.ball_speed_multiplier,
            )?,
            countdown_start: parse_or("BATTLE_COUNTDOWN_START", defaults.countdown_start)?,
            countdown_interval: parse_or(
                "BATTLE_COUNTDOWN_INTERVAL_SECS",
                defaults.countdown_interval,
            )?,
            initial_mode: parse_or("BATTLE_INITIAL_MODE", defaults.initial_mode)?,
            frame_rate: parse_or("BATTLE_FRAME_RATE", defaults.frame_rate)?,
            arena_half_width: parse_or("BATTLE_ARENA_HALF_WIDTH", defaults.arena_half_width)?,
            arena_half_height: parse_or("BATTLE_ARENA_HALF_HEIGHT", defaults.arena_half_height)?,
            start_positions: defaults.start_positions,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_sling_distance >= 0.0 && self.min_sling_distance <= self.max_sling_distance) {
            return Err(ConfigError::Invalid("BATTLE_MIN_SLING_DISTANCE"));
        }
        if !self.ball_speed_multiplier.is_finite() {
            return Err(ConfigError::Invalid("BATTLE_BALL_SPEED_MULTIPLIER"));
        }
        if !(self.arena_half_width.is_finite() && self.arena_half_width > 0.0) {
            return Err(ConfigError::Invalid("BATTLE_ARENA_HALF_WIDTH"));
        }
        if !(self.arena_half_height.is_finite() && self.arena_half_height > 0.0) {
            return Err(ConfigError::Invalid("BATTLE_ARENA_HALF_HEIGHT"));
        }
        if self.countdown_start < 0 {
            return Err(ConfigError::Invalid("BATTLE_COUNTDOWN_START"));
        }
        if !(self.countdown_interval > 0.0) {
            return Err(ConfigError::Invalid("BATTLE_COUNTDOWN_INTERVAL_SECS"));
        }
        if self.frame_rate == 0 {
            return Err(ConfigError::Invalid("BATTLE_FRAME_RATE"));
        }
        Ok(())
    }

    pub fn sling_distance(&self) -> (f32, f32) {
        (self.min_sling_distance, self.max_sling_distance)
    }

    pub fn start_position(&self, position: PlayerPos) -> Vec2 {
        self.start_positions[position.index()]
    }

    /// Seconds per simulation frame
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.frame_rate as f32
    }

    /// Blue plays the lower half of the arena, red the upper half
    pub fn play_area(&self, team: Team) -> PlayArea {
        let (min_y, max_y) = match team {
            Team::Blue => (-self.arena_half_height, 0.0),
            Team::Red => (0.0, self.arena_half_height),
        };
        PlayArea {
            min: Vec2::new(-self.arena_half_width, min_y),
            max: Vec2::new(self.arena_half_width, max_y),
        }
    }
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
