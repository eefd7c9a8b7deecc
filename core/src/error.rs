use crate::types::{PlayerId, StickerId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Action rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig { field, reason: reason.into() }
    }
}

/// A single player action that was refused. Never fatal to a tick:
/// callers drop it and move on. No state is mutated when one is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("unknown sticker {0}")]
    UnknownSticker(StickerId),

    #[error("player {0} has churned")]
    InactivePlayer(PlayerId),

    #[error("sticker {0} is no longer active")]
    InactiveSticker(StickerId),

    #[error("player {player_id} scanned sticker {sticker_id} {days_since} days ago (cooldown {cooldown_days:.3})")]
    Cooldown {
        player_id:     PlayerId,
        sticker_id:    StickerId,
        days_since:    u64,
        cooldown_days: f64,
    },

    #[error("player {0} has no stickers to place")]
    EmptyInventory(PlayerId),

    #[error("player {player_id} holds {held:.1} points, needs {needed:.1}")]
    InsufficientPoints { player_id: PlayerId, held: f64, needed: f64 },
}
