//! Per-agent turn state and bounded turn history

use arrayvec::ArrayVec;

use crate::content::template::{Channels, TemplateId};
use crate::core::error::ScheduleError;
use crate::schedule::play::Play;
use crate::schedule::timeline::Timeline;

/// How many prior turns sequencing predicates can look back on
pub const TURN_HISTORY: usize = 4;

/// The live scheduling state of the current turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnState {
    pub timeline: Timeline,
    /// Focus spent on commit-phase operations this turn
    pub focus_spent: f32,
    /// The flat stack fee is paid once per turn
    pub stack_focus_paid: bool,
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Auto-place a play at the first start that fits; the caller never
    /// reasons about overlaps
    pub fn add_play(&mut self, play: Play) -> Result<f32, ScheduleError> {
        let duration = play.duration();
        let channels = play.channels();
        let start = self
            .timeline
            .next_available_start(channels, duration)
            .ok_or(ScheduleError::NoSpace)?;
        self.timeline.insert(play, start)?;
        Ok(start)
    }

    /// Channels occupied anywhere on the current timeline
    pub fn occupied_channels(&self) -> Channels {
        self.timeline
            .slots()
            .iter()
            .fold(Channels::empty(), |acc, slot| acc | slot.play.channels())
    }
}

/// What sequencing predicates need to know about a finished turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnSummary {
    pub templates: Vec<TemplateId>,
    pub landed_hit: bool,
}

/// Ring buffer of the last few turns, newest last
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnHistory {
    entries: ArrayVec<TurnSummary, TURN_HISTORY>,
}

impl TurnHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a summary, evicting the oldest when full
    pub fn push(&mut self, summary: TurnSummary) {
        if self.entries.is_full() {
            self.entries.remove(0);
        }
        self.entries.push(summary);
    }

    /// The most recent finished turn
    pub fn last(&self) -> Option<&TurnSummary> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TurnSummary> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One agent's view of the encounter across turns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentTurn {
    pub current: TurnState,
    pub history: TurnHistory,
}

impl AgentTurn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarize the finished turn into history and reset the live state;
    /// returns the old state so the caller can dispose of its cards
    pub fn end_turn(&mut self, landed_hit: bool) -> TurnState {
        let finished = std::mem::take(&mut self.current);
        let templates = finished
            .timeline
            .slots()
            .iter()
            .map(|slot| slot.play.template)
            .collect();
        self.history.push(TurnSummary {
            templates,
            landed_hit,
        });
        finished
    }
}
