//! Outcome resolution for one tick
//!
//! Walks the merged, time-sorted offensive plays, pits each against the
//! target's best-overlapping defense, rolls once per play from the combat
//! stream, and applies advantage, balance, and damage consequences.
//! Mutations from an earlier play are visible to every later play in the
//! same pass.

pub mod damage;

use rand::Rng;

use crate::content::template::{Technique, TemplateId};
use crate::core::arena::AgentId;
use crate::core::config::EngineConfig;
use crate::core::error::CommandError;
use crate::core::types::{Height, Outcome, Stakes};
use crate::encounter::Encounter;
use crate::engagement::{AdvantageEffect, PairKey};
use crate::event::EventKind;
use crate::schedule::play::Play;

use damage::DamagePacket;

/// How the attack line meets the defender's guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    Direct,
    Adjacent,
    Open,
}

/// The defensive side of one exchange, if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefenseContext {
    /// The attack's own multiplier against this defense class
    pub mult: f32,
    pub coverage: Coverage,
}

/// Everything the hit-chance pipeline consumes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChanceInputs {
    pub difficulty: f32,
    pub accuracy: f32,
    pub stakes: Stakes,
    pub modifier_hit_bonus: f32,
    pub signed_advantage: f32,
    pub attacker_balance: f32,
    pub defense: Option<DefenseContext>,
    pub defender_parry: f32,
    pub defender_balance: f32,
}

/// The hit-chance pipeline, in its fixed order: additive terms, defense
/// multiplier, coverage adjustment, passive parry, balance penalty, clamp
pub fn hit_chance(config: &EngineConfig, inputs: &ChanceInputs) -> f32 {
    let mut chance = config.base_hit_chance
        - inputs.difficulty * config.difficulty_factor
        + inputs.accuracy * config.accuracy_factor
        + inputs.stakes.hit_bonus()
        + inputs.modifier_hit_bonus
        + inputs.signed_advantage * config.advantage_factor
        + (inputs.attacker_balance - 0.5) * config.balance_factor;

    if let Some(defense) = &inputs.defense {
        chance *= defense.mult;
        chance += match defense.coverage {
            Coverage::Direct => config.coverage_direct,
            Coverage::Adjacent => config.coverage_adjacent,
            Coverage::Open => config.coverage_open,
        };
    }

    chance -= inputs.defender_parry * config.parry_factor;
    if inputs.defender_balance < config.low_balance_threshold {
        chance += config.low_balance_penalty;
    }

    chance.clamp(config.hit_chance_min, config.hit_chance_max)
}

/// Global advantage defaults per outcome; technique overrides take
/// precedence when present
pub fn default_advantage(outcome: Outcome) -> AdvantageEffect {
    match outcome {
        Outcome::Hit => AdvantageEffect {
            pressure: 0.10,
            control: 0.05,
            defender_balance: -0.10,
            ..Default::default()
        },
        Outcome::Parried => AdvantageEffect {
            pressure: -0.05,
            control: -0.10,
            attacker_balance: -0.05,
            ..Default::default()
        },
        Outcome::Blocked => AdvantageEffect {
            pressure: -0.05,
            attacker_balance: -0.02,
            ..Default::default()
        },
        Outcome::Deflected => AdvantageEffect {
            position: -0.08,
            attacker_balance: -0.05,
            ..Default::default()
        },
        Outcome::Miss => AdvantageEffect {
            pressure: -0.05,
            position: -0.05,
            attacker_balance: -0.08,
            ..Default::default()
        },
    }
}

/// Guard coverage of the attack line
fn coverage(attack_height: Option<Height>, technique: &Technique) -> Coverage {
    let (Some(attack), Some(guard)) = (attack_height, technique.guard_height) else {
        return Coverage::Open;
    };
    if attack == guard {
        Coverage::Direct
    } else if technique.covers_adjacent && attack.is_adjacent(guard) {
        Coverage::Adjacent
    } else {
        Coverage::Open
    }
}

/// One entry of the merged tick schedule
struct ScheduledPlay {
    agent: AgentId,
    time_start: f32,
    order: usize,
    play: Play,
}

/// Resolve every offensive play of the tick in ascending start order
pub(crate) fn resolve_tick(encounter: &mut Encounter) -> Result<(), CommandError> {
    let schedule = merged_schedule(encounter);
    tracing::debug!(plays = schedule.len(), "resolving tick");

    for entry in schedule {
        resolve_play(encounter, &entry)?;
    }
    Ok(())
}

/// Snapshot all timelines into one stable, time-sorted list
fn merged_schedule(encounter: &Encounter) -> Vec<ScheduledPlay> {
    let mut schedule = Vec::new();
    let mut order = 0usize;
    for &agent in &encounter.agent_order {
        let Some(state) = encounter.agents.get(agent.handle()) else {
            continue;
        };
        for slot in state.turn.current.timeline.slots() {
            schedule.push(ScheduledPlay {
                agent,
                time_start: slot.time_start,
                order,
                play: slot.play.clone(),
            });
            order += 1;
        }
    }
    // Stable across runs: start time first, insertion order breaks ties
    schedule.sort_by(|a, b| {
        a.time_start
            .partial_cmp(&b.time_start)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.order.cmp(&b.order))
    });
    schedule
}

fn resolve_play(encounter: &mut Encounter, entry: &ScheduledPlay) -> Result<(), CommandError> {
    let play = &entry.play;
    let attacker_id = entry.agent;

    let Some(template) = encounter.registry.get(play.template).cloned() else {
        return Err(CommandError::BadInvariant(
            "scheduled play references missing template".into(),
        ));
    };
    if !template.is_offensive() {
        return Ok(());
    }
    let Some(technique) = template.technique.clone() else {
        return Err(CommandError::BadInvariant(
            "offensive template without technique".into(),
        ));
    };

    // Targets land on plays at selection lock; commit-added plays carry
    // them directly
    let Some(defender_id) = play
        .target
        .or_else(|| encounter.pending_targets.get(&play.card).copied())
    else {
        tracing::debug!(agent = ?attacker_id, "offensive play without target skipped");
        return Ok(());
    };

    let (attacker_weapon, attacker_balance, attacker_stats) = {
        let attacker = encounter
            .agents
            .get(attacker_id.handle())
            .ok_or_else(|| CommandError::BadInvariant("attacker missing".into()))?;
        (
            attacker.weapon.clone(),
            attacker.balance,
            attacker.stats,
        )
    };
    let (defender_weapon_parry, defender_balance) = {
        let defender = encounter
            .agents
            .get(defender_id.handle())
            .ok_or_else(|| CommandError::BadInvariant("defender missing".into()))?;
        (defender.weapon.parry, defender.balance)
    };

    let attack_height = play.effective_height();
    let start = entry.time_start;
    let end = start + play.duration();
    let defense = best_overlapping_defense(encounter, defender_id, start, end);

    let defense_context = defense.as_ref().map(|d| DefenseContext {
        mult: technique.defense_mult(d.kind),
        coverage: coverage(attack_height, &d.technique),
    });

    let stakes = play.stakes();
    let inputs = ChanceInputs {
        difficulty: technique.difficulty,
        accuracy: attacker_weapon.accuracy,
        stakes,
        modifier_hit_bonus: play.effective_hit_bonus(),
        signed_advantage: encounter.engagements.signed_advantage(attacker_id, defender_id),
        attacker_balance,
        defense: defense_context,
        defender_parry: defender_weapon_parry,
        defender_balance,
    };
    let chance = hit_chance(&encounter.config, &inputs);

    // Exactly one combat draw per resolved play
    let roll: f32 = encounter.rng.combat().gen_range(0.0..1.0);
    let outcome = if roll > chance {
        match &defense {
            Some(d) => d.kind.outcome(),
            None => Outcome::Miss,
        }
    } else {
        Outcome::Hit
    };

    apply_advantage(encounter, attacker_id, defender_id, play, &technique, outcome, stakes);

    if outcome == Outcome::Hit {
        apply_damage(
            encounter,
            attacker_id,
            defender_id,
            play,
            &technique,
            &attacker_stats,
            attacker_weapon.damage_mult,
            attacker_weapon.penetration,
            attack_height,
            stakes,
        );
    }

    let modifiers: Vec<TemplateId> = play.modifiers().iter().map(|m| m.template).collect();
    encounter.events.push(
        encounter.turn,
        EventKind::TechniqueResolved {
            attacker: attacker_id,
            defender: Some(defender_id),
            template: play.template,
            outcome,
            hit_chance: chance,
            roll,
            stakes,
            modifiers,
        },
    );
    Ok(())
}

/// The defender's active technique for this exchange
struct ActiveDefense {
    kind: crate::content::template::DefenseKind,
    technique: Technique,
}

/// Find the defender's defensive play with the greatest half-open overlap
/// against [start, end); earliest start breaks ties
fn best_overlapping_defense(
    encounter: &Encounter,
    defender: AgentId,
    start: f32,
    end: f32,
) -> Option<ActiveDefense> {
    let state = encounter.agents.get(defender.handle())?;
    let mut best: Option<(f32, f32, ActiveDefense)> = None;

    for slot in state.turn.current.timeline.slots() {
        if !slot.overlaps(start, end) {
            continue;
        }
        let Some(template) = encounter.registry.get(slot.play.template) else {
            continue;
        };
        if !template.is_defensive() {
            continue;
        }
        let Some(technique) = template.technique.as_ref() else {
            continue;
        };
        let Some(kind) = technique.defense else {
            continue;
        };

        let overlap = slot.time_end().min(end) - slot.time_start.max(start);
        let replace = match &best {
            None => true,
            Some((best_overlap, best_start, _)) => {
                overlap > *best_overlap
                    || (overlap == *best_overlap && slot.time_start < *best_start)
            }
        };
        if replace {
            best = Some((
                overlap,
                slot.time_start,
                ActiveDefense {
                    kind,
                    technique: technique.clone(),
                },
            ));
        }
    }

    best.map(|(_, _, defense)| defense)
}

/// Pick the effect (play override, then technique override, then global
/// default), scale it by stakes, and apply it to engagement and balance
fn apply_advantage(
    encounter: &mut Encounter,
    attacker_id: AgentId,
    defender_id: AgentId,
    play: &Play,
    technique: &Technique,
    outcome: Outcome,
    stakes: Stakes,
) {
    let effect = play
        .effective_advantage_override()
        .or_else(|| technique.advantage.for_outcome(outcome).copied())
        .unwrap_or_else(|| default_advantage(outcome))
        .scaled(stakes.advantage_mult());

    let key = PairKey::new(attacker_id, defender_id);
    let attacker_is_first = key.oriented_toward(attacker_id);
    let engagement = encounter.engagements.get_or_neutral(attacker_id, defender_id);
    let (changes, range_change) = effect.apply(engagement, attacker_is_first);

    for change in changes {
        encounter.events.push(
            encounter.turn,
            EventKind::AdvantageChanged {
                first: key.first(),
                second: key.second(),
                axis: change.axis,
                from: change.from,
                to: change.to,
            },
        );
    }
    if let Some((from, to)) = range_change {
        encounter.events.push(
            encounter.turn,
            EventKind::RangeChanged {
                first: key.first(),
                second: key.second(),
                from,
                to,
            },
        );
    }

    shift_balance(encounter, attacker_id, effect.attacker_balance);
    shift_balance(encounter, defender_id, effect.defender_balance);
}

fn shift_balance(encounter: &mut Encounter, agent_id: AgentId, delta: f32) {
    if delta == 0.0 {
        return;
    }
    let Some(agent) = encounter.agents.get_mut(agent_id.handle()) else {
        return;
    };
    let from = agent.balance;
    let to = (from + delta).clamp(0.0, 1.0);
    if to != from {
        agent.balance = to;
        encounter.events.push(
            encounter.turn,
            EventKind::BalanceChanged {
                agent: agent_id,
                from,
                to,
            },
        );
    }
}

/// Build the damage packet and dispatch it to the body collaborator,
/// re-emitting its sub-results unmodified
#[allow(clippy::too_many_arguments)]
fn apply_damage(
    encounter: &mut Encounter,
    attacker_id: AgentId,
    defender_id: AgentId,
    play: &Play,
    technique: &Technique,
    attacker_stats: &crate::core::types::AgentStats,
    weapon_damage_mult: f32,
    weapon_penetration: f32,
    attack_height: Option<Height>,
    stakes: Stakes,
) {
    let base: f32 = technique.damage.iter().map(|i| i.amount).sum();
    let amount = base
        * technique.scaling.apply(attacker_stats)
        * weapon_damage_mult
        * stakes.damage_mult()
        * play.effective_damage_mult();
    let kind = technique
        .damage
        .first()
        .map(|i| i.kind)
        .unwrap_or(crate::content::template::DamageKind::Blunt);

    let packet = DamagePacket {
        amount,
        kind,
        penetration: weapon_penetration,
    };
    let report = encounter.body.apply_damage(defender_id, attack_height, &packet);

    if let Some(attacker) = encounter.agents.get_mut(attacker_id.handle()) {
        attacker.landed_hit_this_turn = true;
    }

    encounter.events.push(
        encounter.turn,
        EventKind::DamageApplied {
            target: defender_id,
            amount: report.applied,
        },
    );
    if report.gap_found {
        encounter
            .events
            .push(encounter.turn, EventKind::ArmorGapFound { target: defender_id });
    }
    if report.layer_destroyed {
        encounter.events.push(
            encounter.turn,
            EventKind::ArmorLayerDestroyed {
                target: defender_id,
            },
        );
    }
    if report.severed {
        encounter
            .events
            .push(encounter.turn, EventKind::PartSevered { target: defender_id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;

    fn baseline_inputs() -> ChanceInputs {
        ChanceInputs {
            difficulty: 0.0,
            accuracy: 0.0,
            stakes: Stakes::Guarded,
            modifier_hit_bonus: 0.0,
            signed_advantage: 0.0,
            attacker_balance: 0.5,
            defense: None,
            defender_parry: 0.0,
            defender_balance: 0.5,
        }
    }

    #[test]
    fn test_baseline_chance_is_base() {
        let config = EngineConfig::default();
        let chance = hit_chance(&config, &baseline_inputs());
        assert!((chance - config.base_hit_chance).abs() < 1e-6);
    }

    #[test]
    fn test_chance_clamped_to_bounds() {
        let config = EngineConfig::default();

        let mut hopeless = baseline_inputs();
        hopeless.difficulty = 20.0;
        assert_eq!(hit_chance(&config, &hopeless), config.hit_chance_min);

        let mut certain = baseline_inputs();
        certain.accuracy = 20.0;
        assert_eq!(hit_chance(&config, &certain), config.hit_chance_max);
    }

    #[test]
    fn test_stakes_raise_chance() {
        let config = EngineConfig::default();
        let guarded = hit_chance(&config, &baseline_inputs());

        let mut reckless = baseline_inputs();
        reckless.stakes = Stakes::Reckless;
        assert!(hit_chance(&config, &reckless) > guarded);
    }

    #[test]
    fn test_direct_coverage_beats_open() {
        let config = EngineConfig::default();

        let mut direct = baseline_inputs();
        direct.defense = Some(DefenseContext {
            mult: 1.0,
            coverage: Coverage::Direct,
        });
        let mut open = baseline_inputs();
        open.defense = Some(DefenseContext {
            mult: 1.0,
            coverage: Coverage::Open,
        });

        assert!(hit_chance(&config, &direct) < hit_chance(&config, &open));
    }

    #[test]
    fn test_low_defender_balance_helps_attacker() {
        let config = EngineConfig::default();
        let steady = hit_chance(&config, &baseline_inputs());

        let mut stumbling = baseline_inputs();
        stumbling.defender_balance = 0.2;
        assert!(hit_chance(&config, &stumbling) > steady);
    }

    #[test]
    fn test_advantage_term_is_signed() {
        let config = EngineConfig::default();

        let mut ahead = baseline_inputs();
        ahead.signed_advantage = 0.2;
        let mut behind = baseline_inputs();
        behind.signed_advantage = -0.2;

        let neutral = hit_chance(&config, &baseline_inputs());
        assert!(hit_chance(&config, &ahead) > neutral);
        assert!(hit_chance(&config, &behind) < neutral);
    }

    #[test]
    fn test_coverage_classification() {
        use crate::content::template::Template;

        let guard = Template::parry().technique.unwrap(); // mid guard, covers adjacent
        assert_eq!(coverage(Some(Height::Mid), &guard), Coverage::Direct);
        assert_eq!(coverage(Some(Height::High), &guard), Coverage::Adjacent);

        let strict = Template::high_block().technique.unwrap(); // high guard, no adjacent
        assert_eq!(coverage(Some(Height::High), &strict), Coverage::Direct);
        assert_eq!(coverage(Some(Height::Mid), &strict), Coverage::Open);
        assert_eq!(coverage(Some(Height::Low), &strict), Coverage::Open);

        assert_eq!(coverage(None, &guard), Coverage::Open);
    }

    #[test]
    fn test_default_advantage_hit_favors_attacker() {
        let hit = default_advantage(Outcome::Hit);
        assert!(hit.pressure > 0.0);
        assert!(hit.defender_balance < 0.0);

        let parried = default_advantage(Outcome::Parried);
        assert!(parried.control < 0.0);
        assert!(parried.attacker_balance < 0.0);
    }
}
