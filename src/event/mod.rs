//! Double-buffered event queue
//!
//! Producers push into the *next* buffer; the tick driver calls
//! [`EventQueue::swap_buffers`] once per tick, after which consumers read
//! the freshly swapped-in `current` slice. Readers therefore never observe
//! a buffer that is still being written. The queue is owned by its
//! encounter and passed by reference, never a global.

use serde::{Deserialize, Serialize};

use crate::content::template::TemplateId;
use crate::core::arena::{AgentId, CardId};
use crate::core::types::{AdvantageAxis, Outcome, RangeBand, Stakes, Tick, TurnPhase};

/// One entry in the encounter log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Turn the event was emitted in
    pub turn: Tick,
    /// Monotonic sequence number across the whole encounter
    pub seq: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // Turn structure
    TurnStarted,
    TurnEnded,
    TurnPhaseChanged {
        from: TurnPhase,
        to: TurnPhase,
    },

    // Card selection
    PlayedActionCard {
        agent: AgentId,
        card: CardId,
        template: TemplateId,
        time_start: f32,
    },
    CancelledActionCard {
        agent: AgentId,
        card: CardId,
    },
    PlayWithdrawn {
        agent: AgentId,
        card: CardId,
    },
    PlayAddedInCommit {
        agent: AgentId,
        card: CardId,
        template: TemplateId,
        time_start: f32,
    },
    CardStacked {
        agent: AgentId,
        play_card: CardId,
        stacked_card: CardId,
        template: TemplateId,
    },

    // Resolution
    TechniqueResolved {
        attacker: AgentId,
        defender: Option<AgentId>,
        template: TemplateId,
        outcome: Outcome,
        hit_chance: f32,
        roll: f32,
        stakes: Stakes,
        modifiers: Vec<TemplateId>,
    },
    AdvantageChanged {
        first: AgentId,
        second: AgentId,
        axis: AdvantageAxis,
        from: f32,
        to: f32,
    },
    RangeChanged {
        first: AgentId,
        second: AgentId,
        from: RangeBand,
        to: RangeBand,
    },
    BalanceChanged {
        agent: AgentId,
        from: f32,
        to: f32,
    },
    DamageApplied {
        target: AgentId,
        amount: f32,
    },

    // Re-emitted body-model sub-events
    ArmorLayerDestroyed {
        target: AgentId,
    },
    ArmorGapFound {
        target: AgentId,
    },
    PartSevered {
        target: AgentId,
    },
}

/// Two-buffer queue: writes land in `next`, reads come from `current`
#[derive(Debug, Default)]
pub struct EventQueue {
    current: Vec<Event>,
    next: Vec<Event>,
    seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an event for the next swap
    pub fn push(&mut self, turn: Tick, kind: EventKind) {
        let seq = self.seq;
        self.seq += 1;
        self.next.push(Event { turn, seq, kind });
    }

    /// Exchange buffers; called once per tick by the driver
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
        self.next.clear();
    }

    /// Events published by the most recent swap
    pub fn current(&self) -> &[Event] {
        &self.current
    }

    /// Events buffered but not yet published
    pub fn pending(&self) -> usize {
        self.next.len()
    }
}
