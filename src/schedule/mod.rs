//! Time-slot scheduling of plays within a tick

pub mod play;
pub mod timeline;
pub mod turn;

pub use play::{ModifierSlot, Play, MAX_MODIFIERS};
pub use timeline::{snap, TimeSlot, Timeline, GRANULARITY, TIMELINE_CAPACITY};
pub use turn::{AgentTurn, TurnHistory, TurnState, TurnSummary, TURN_HISTORY};
