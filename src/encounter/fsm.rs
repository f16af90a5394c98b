//! Turn-phase state machine
//!
//! Only forward-declared (event, from, to) triples are legal; asking for
//! any other transition is a typed error, never a silent no-op. The FSM is
//! per-encounter: concurrent encounters never share phase state.

use crate::core::error::CommandError;
use crate::core::types::TurnPhase;

/// Named transition causes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    HandDrawn,
    SelectionLocked,
    CommitLocked,
    ResolutionFinished,
    AnimationFinished,
}

/// The full transition table. `PlayerReaction` is declared as a phase but
/// has no inbound triple yet.
const TRANSITIONS: &[(TurnEvent, TurnPhase, TurnPhase)] = &[
    (
        TurnEvent::HandDrawn,
        TurnPhase::DrawHand,
        TurnPhase::PlayerCardSelection,
    ),
    (
        TurnEvent::SelectionLocked,
        TurnPhase::PlayerCardSelection,
        TurnPhase::CommitPhase,
    ),
    (
        TurnEvent::CommitLocked,
        TurnPhase::CommitPhase,
        TurnPhase::TickResolution,
    ),
    (
        TurnEvent::ResolutionFinished,
        TurnPhase::TickResolution,
        TurnPhase::Animating,
    ),
    (
        TurnEvent::AnimationFinished,
        TurnPhase::Animating,
        TurnPhase::DrawHand,
    ),
];

#[derive(Debug, Clone)]
pub struct TurnFsm {
    phase: TurnPhase,
}

impl TurnFsm {
    pub fn new() -> Self {
        Self {
            phase: TurnPhase::DrawHand,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Move to `target` if a declared triple allows it; returns the event
    /// that carried the transition
    pub fn transition_to(&mut self, target: TurnPhase) -> Result<TurnEvent, CommandError> {
        let triple = TRANSITIONS
            .iter()
            .find(|(_, from, to)| *from == self.phase && *to == target);

        match triple {
            Some((event, _, to)) => {
                self.phase = *to;
                Ok(*event)
            }
            None => Err(CommandError::InvalidTurnPhaseTransition {
                from: self.phase,
                to: target,
            }),
        }
    }
}

impl Default for TurnFsm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CYCLE: [TurnPhase; 5] = [
        TurnPhase::PlayerCardSelection,
        TurnPhase::CommitPhase,
        TurnPhase::TickResolution,
        TurnPhase::Animating,
        TurnPhase::DrawHand,
    ];

    #[test]
    fn test_full_cycle_succeeds() {
        let mut fsm = TurnFsm::new();
        for target in CYCLE {
            fsm.transition_to(target).unwrap();
            assert_eq!(fsm.phase(), target);
        }
    }

    #[test]
    fn test_undeclared_transition_fails() {
        let mut fsm = TurnFsm::new();
        let err = fsm.transition_to(TurnPhase::TickResolution).unwrap_err();
        assert_eq!(
            err,
            CommandError::InvalidTurnPhaseTransition {
                from: TurnPhase::DrawHand,
                to: TurnPhase::TickResolution,
            }
        );
        // State is untouched on failure
        assert_eq!(fsm.phase(), TurnPhase::DrawHand);
    }

    #[test]
    fn test_self_transition_is_illegal() {
        let mut fsm = TurnFsm::new();
        assert!(fsm.transition_to(TurnPhase::DrawHand).is_err());
    }

    #[test]
    fn test_player_reaction_is_unreachable() {
        // No triple leads into the reserved phase from anywhere
        for from in [
            TurnPhase::DrawHand,
            TurnPhase::PlayerCardSelection,
            TurnPhase::CommitPhase,
            TurnPhase::TickResolution,
            TurnPhase::Animating,
        ] {
            let mut fsm = TurnFsm::new();
            // Walk to `from` along the cycle first
            let mut idx = 0;
            while fsm.phase() != from {
                fsm.transition_to(CYCLE[idx]).unwrap();
                idx += 1;
            }
            assert!(fsm.transition_to(TurnPhase::PlayerReaction).is_err());
        }
    }

    #[test]
    fn test_every_declared_triple_fires_from_its_source() {
        for (_, from, to) in super::TRANSITIONS {
            let mut fsm = TurnFsm { phase: *from };
            assert_eq!(
                fsm.transition_to(*to).is_ok(),
                true,
                "declared triple {:?} -> {:?} must fire",
                from,
                to
            );
        }
    }
}
