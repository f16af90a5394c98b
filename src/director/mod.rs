//! Play-selection strategies
//!
//! A director proposes plays for one agent during the selection phase,
//! issuing only commands a human could issue and tolerating rejections
//! (a refused card is skipped, never retried). The variant set is small
//! and closed, so this is a sum type rather than an open trait.

use std::collections::VecDeque;

use crate::core::arena::{AgentId, CardId};
use crate::encounter::Encounter;

pub enum Director {
    /// Proposes nothing; useful for dummies and tests
    Null,
    /// Plays hand cards front to back until the scheduler or resources
    /// refuse
    SimpleDeck,
    /// Leans on pool techniques, falling back to the hand
    PoolCaster,
    /// Replays a fixed script of template names, one list per turn
    Scripted(ScriptedDirector),
}

pub struct ScriptedDirector {
    turns: VecDeque<Vec<String>>,
}

impl ScriptedDirector {
    pub fn new(turns: Vec<Vec<String>>) -> Self {
        Self {
            turns: turns.into(),
        }
    }
}

impl Director {
    pub fn scripted(turns: Vec<Vec<String>>) -> Self {
        Director::Scripted(ScriptedDirector::new(turns))
    }

    /// Called once per agent per selection phase
    pub fn play_cards(&mut self, agent: AgentId, encounter: &mut Encounter) {
        match self {
            Director::Null => {}
            Director::SimpleDeck => {
                let hand = hand_snapshot(encounter, agent);
                try_play_all(encounter, agent, &hand);
            }
            Director::PoolCaster => {
                let pool = pool_snapshot(encounter, agent);
                try_play_all(encounter, agent, &pool);
                let hand = hand_snapshot(encounter, agent);
                try_play_all(encounter, agent, &hand);
            }
            Director::Scripted(script) => {
                let Some(wanted) = script.turns.pop_front() else {
                    return;
                };
                for name in wanted {
                    let Some(card) = find_by_name(encounter, agent, &name) else {
                        tracing::debug!(name = %name, "scripted card not available");
                        continue;
                    };
                    try_play(encounter, agent, card);
                }
            }
        }
    }
}

fn opponent_of(encounter: &Encounter, agent: AgentId) -> Option<AgentId> {
    encounter
        .agent_ids()
        .iter()
        .copied()
        .find(|&id| id != agent)
}

fn hand_snapshot(encounter: &Encounter, agent: AgentId) -> Vec<CardId> {
    encounter
        .agent(agent)
        .map(|a| a.zones.hand.clone())
        .unwrap_or_default()
}

fn pool_snapshot(encounter: &Encounter, agent: AgentId) -> Vec<CardId> {
    encounter
        .agent(agent)
        .map(|a| a.zones.pool.clone())
        .unwrap_or_default()
}

fn try_play_all(encounter: &mut Encounter, agent: AgentId, cards: &[CardId]) {
    for &card in cards {
        try_play(encounter, agent, card);
    }
}

fn try_play(encounter: &mut Encounter, agent: AgentId, card: CardId) {
    let offensive = encounter
        .card(card)
        .and_then(|instance| encounter.registry().get(instance.template))
        .map(|t| t.is_offensive())
        .unwrap_or(false);
    let target = if offensive {
        opponent_of(encounter, agent)
    } else {
        None
    };

    if let Err(err) = encounter.play_action_card(agent, card, target) {
        tracing::debug!(agent = ?agent, card = ?card, error = %err, "director play rejected");
    }
}

/// Find a playable card by template name, hand first, then pool
fn find_by_name(encounter: &Encounter, agent: AgentId, name: &str) -> Option<CardId> {
    let state = encounter.agent(agent)?;
    let wanted = encounter.registry().id_of(name)?;

    state
        .zones
        .hand
        .iter()
        .chain(state.zones.pool.iter())
        .copied()
        .find(|&card| {
            encounter
                .card(card)
                .map(|instance| instance.template == wanted)
                .unwrap_or(false)
        })
}
