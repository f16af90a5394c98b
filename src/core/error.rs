//! Error taxonomy
//!
//! Three classes: user-actionable command rejections ([`CommandError`]),
//! recoverable scheduling failures ([`ScheduleError`]), and content/IO
//! failures surfaced at load time ([`EngineError`]). `BadInvariant` marks
//! programmer errors in the surrounding orchestration, not user input.

use thiserror::Error;

use crate::core::arena::CardId;
use crate::core::types::TurnPhase;

/// Timeline placement failures; always recoverable by picking another
/// time or channel
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("timeline is full or the play spills past the tick boundary")]
    Overflow,

    #[error("channel conflict with an overlapping play")]
    Conflict,

    #[error("no start time fits before the tick boundary")]
    NoSpace,
}

/// Rejection of a player/AI command; never partially applies state
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("invalid game state: {0}")]
    InvalidGameState(String),

    #[error("operation requires phase {expected:?}, current phase is {actual:?}")]
    WrongPhase {
        expected: TurnPhase,
        actual: TurnPhase,
    },

    #[error("no declared transition from {from:?} to {to:?}")]
    InvalidTurnPhaseTransition { from: TurnPhase, to: TurnPhase },

    #[error("card {0:?} is not in hand or an available pool")]
    CardNotInHand(CardId),

    #[error("card {0:?} is not in play")]
    CardNotInPlay(CardId),

    #[error("card {0:?} is on cooldown")]
    CardOnCooldown(CardId),

    #[error("insufficient stamina: need {need}, have {available}")]
    InsufficientStamina { need: f32, available: f32 },

    #[error("insufficient time: need {need}, have {available}")]
    InsufficientTime { need: f32, available: f32 },

    #[error("insufficient focus: need {need}, have {available}")]
    InsufficientFocus { need: f32, available: f32 },

    #[error("card template does not match the play and is not a modifier")]
    TemplatesMismatch,

    #[error("selection predicate failed: {0}")]
    PredicateFailed(String),

    #[error("modifier conflicts with one already attached")]
    ModifierConflict,

    #[error("modifier stack is full")]
    ModifierOverflow,

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Internal consistency violated; a bug, not user input
    #[error("invariant violated: {0}")]
    BadInvariant(String),
}

/// Content validation failures, reported once at registry load
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    #[error("duplicate template name '{0}'")]
    DuplicateName(String),

    #[error("template '{0}' has a negative cost")]
    NegativeCost(String),

    #[error("offensive template '{0}' has no technique")]
    MissingTechnique(String),

    #[error("modifier template '{0}' has no modify_play effect")]
    MissingModifyEffect(String),

    #[error("technique on '{0}' occupies no channel")]
    NoChannels(String),

    #[error("defense multiplier out of range on '{0}'")]
    BadDefenseMult(String),

    #[error("duplicate weapon name '{0}'")]
    DuplicateWeapon(String),

    #[error("weapon '{0}' can neither swing nor thrust")]
    UselessWeapon(String),

    #[error("malformed content: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("content error: {0}")]
    Content(#[from] ContentError),

    #[error("command error: {0}")]
    Command(#[from] CommandError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
