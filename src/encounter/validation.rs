//! Card-selection predicates
//!
//! Evaluated by the command handler before any mutation. Every failure is
//! a user-actionable rejection, never a partial apply.

use crate::content::template::{Predicate, Template};
use crate::core::arena::AgentId;
use crate::core::error::CommandError;
use crate::core::types::RangeBand;
use crate::encounter::Encounter;
use crate::engagement::PairKey;

/// Check every predicate on `template` for `agent` against the chosen
/// target (if any)
pub(crate) fn check_predicates(
    encounter: &Encounter,
    agent_id: AgentId,
    template: &Template,
    target: Option<AgentId>,
) -> Result<(), CommandError> {
    let agent = encounter
        .agents
        .get(agent_id.handle())
        .ok_or_else(|| CommandError::InvalidGameState("unknown agent".into()))?;

    for predicate in &template.predicates {
        match predicate {
            Predicate::RequiresSwing => {
                if !agent.weapon.swing {
                    return Err(CommandError::PredicateFailed(format!(
                        "{} cannot swing",
                        agent.weapon.name
                    )));
                }
            }
            Predicate::RequiresThrust => {
                if !agent.weapon.thrust {
                    return Err(CommandError::PredicateFailed(format!(
                        "{} cannot thrust",
                        agent.weapon.name
                    )));
                }
            }
            Predicate::MinAdvantage { axis, value } => {
                let target = target.ok_or_else(|| {
                    CommandError::PredicateFailed("advantage check requires a target".into())
                })?;
                let signed = signed_axis(encounter, agent_id, target, *axis);
                if signed < *value {
                    return Err(CommandError::PredicateFailed(format!(
                        "requires {:?} advantage of at least {}",
                        axis, value
                    )));
                }
            }
            Predicate::RangeAtMost(band) => {
                let target = target.ok_or_else(|| {
                    CommandError::PredicateFailed("range check requires a target".into())
                })?;
                let range = encounter
                    .engagements
                    .get(agent_id, target)
                    .map(|e| e.range)
                    .unwrap_or(RangeBand::Medium);
                if range > *band {
                    return Err(CommandError::PredicateFailed(format!(
                        "requires range {:?} or closer",
                        band
                    )));
                }
            }
            Predicate::PlayedLastTurn(name) => {
                let wanted = encounter.registry.id_of(name).ok_or_else(|| {
                    CommandError::BadInvariant(format!(
                        "predicate references unknown template '{}'",
                        name
                    ))
                })?;
                let played = agent
                    .turn
                    .history
                    .last()
                    .map(|summary| summary.templates.contains(&wanted))
                    .unwrap_or(false);
                if !played {
                    return Err(CommandError::PredicateFailed(format!(
                        "must follow {} from last turn",
                        name
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Signed advantage on one axis from `agent`'s side of the pair
fn signed_axis(
    encounter: &Encounter,
    agent: AgentId,
    other: AgentId,
    axis: crate::core::types::AdvantageAxis,
) -> f32 {
    match encounter.engagements.get(agent, other) {
        Some(engagement) => {
            let raw = engagement.axis(axis) - 0.5;
            if PairKey::new(agent, other).oriented_toward(agent) {
                raw
            } else {
                -raw
            }
        }
        None => 0.0,
    }
}
