//! Command handler: the sole mutator of zones and resources in response
//! to external intent
//!
//! Every operation is phase-gated and resource-checked before any
//! mutation; paths that must spend before they can fail refund the spend
//! atomically on the way out.

use crate::cards::{CardInstance, Zone};
use crate::content::template::{ModifyPlay, Template, TemplateId};
use crate::core::arena::{AgentId, Arena, CardId};
use crate::core::error::CommandError;
use crate::core::types::TurnPhase;
use crate::encounter::{validation, Agent, Encounter};
use crate::event::EventKind;
use crate::resource::Shortfall;
use crate::schedule::play::{ModifierSlot, Play, MAX_MODIFIERS};

/// Where a played card is coming from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardSource {
    Hand,
    Pool,
}

fn insufficient_stamina(s: Shortfall) -> CommandError {
    CommandError::InsufficientStamina {
        need: s.need,
        available: s.available,
    }
}

fn insufficient_time(s: Shortfall) -> CommandError {
    CommandError::InsufficientTime {
        need: s.need,
        available: s.available,
    }
}

fn insufficient_focus(s: Shortfall) -> CommandError {
    CommandError::InsufficientFocus {
        need: s.need,
        available: s.available,
    }
}

fn unknown_agent() -> CommandError {
    CommandError::InvalidGameState("unknown agent".into())
}

/// Undo the zone half of a failed play/stack: hand cards go home, clones
/// are destroyed before their cooldown ever lands
fn rollback_card(
    agent: &mut Agent,
    cards: &mut Arena<CardInstance>,
    source: CardSource,
    original: CardId,
    lead: CardId,
) {
    match source {
        CardSource::Hand => {
            agent.zones.move_to(original, Zone::Hand);
        }
        CardSource::Pool => {
            agent.zones.destroy_clone(cards, lead);
        }
    }
}

impl Encounter {
    /// Locate the card for `agent_id`: hand or available pool master
    fn card_source(
        &self,
        agent_id: AgentId,
        card: CardId,
    ) -> Result<CardSource, CommandError> {
        let instance = self
            .cards
            .get(card.handle())
            .copied()
            .ok_or(CommandError::CardNotInHand(card))?;
        if instance.owner != agent_id {
            return Err(CommandError::CardNotInHand(card));
        }
        let agent = self.agents.get(agent_id.handle()).ok_or_else(unknown_agent)?;
        if agent.zones.zone_of(card) == Some(Zone::Hand) {
            Ok(CardSource::Hand)
        } else if agent.zones.in_pool(card) {
            if agent.zones.on_cooldown(card) {
                Err(CommandError::CardOnCooldown(card))
            } else {
                Ok(CardSource::Pool)
            }
        } else {
            Err(CommandError::CardNotInHand(card))
        }
    }

    fn template_of_card(
        &self,
        card: CardId,
    ) -> Result<(TemplateId, Template), CommandError> {
        let instance = self
            .cards
            .get(card.handle())
            .ok_or(CommandError::CardNotInHand(card))?;
        let template = self
            .registry
            .get(instance.template)
            .cloned()
            .ok_or_else(|| CommandError::BadInvariant("card references missing template".into()))?;
        Ok((instance.template, template))
    }

    /// Play a card from hand or pool into the current selection
    ///
    /// Costs are held, not spent: `cancel_action_card` gives them back.
    pub fn play_action_card(
        &mut self,
        agent_id: AgentId,
        card: CardId,
        target: Option<AgentId>,
    ) -> Result<(), CommandError> {
        self.require_phase(TurnPhase::PlayerCardSelection)?;
        let source = self.card_source(agent_id, card)?;
        let (template_id, template) = self.template_of_card(card)?;
        if template.is_offensive() && target.is_none() {
            return Err(CommandError::PredicateFailed(
                "offensive play requires a target".into(),
            ));
        }
        validation::check_predicates(self, agent_id, &template, target)?;

        let duration = template.time_cost;
        let agent = self
            .agents
            .get_mut(agent_id.handle())
            .ok_or_else(unknown_agent)?;

        agent
            .resources
            .stamina
            .commit(template.stamina_cost)
            .map_err(insufficient_stamina)?;
        if let Err(shortfall) = agent.resources.time.commit(duration) {
            agent.resources.stamina.uncommit(template.stamina_cost);
            return Err(insufficient_time(shortfall));
        }

        let lead = match source {
            CardSource::Hand => {
                agent.zones.move_to(card, Zone::InPlay);
                card
            }
            CardSource::Pool => match agent.zones.clone_pool_card(&mut self.cards, card) {
                Some(clone) => clone,
                None => {
                    agent.resources.stamina.uncommit(template.stamina_cost);
                    agent.resources.time.uncommit(duration);
                    return Err(CommandError::BadInvariant("pool master missing".into()));
                }
            },
        };

        let play = Play::new(lead, template_id, &template);
        let start = match agent.turn.current.add_play(play) {
            Ok(start) => start,
            Err(err) => {
                rollback_card(agent, &mut self.cards, source, card, lead);
                agent.resources.stamina.uncommit(template.stamina_cost);
                agent.resources.time.uncommit(duration);
                tracing::debug!(card = ?card, error = %err, "play rejected by scheduler");
                return Err(err.into());
            }
        };

        if source == CardSource::Pool {
            agent.zones.apply_cooldown(card, template.cooldown);
        }
        if let Some(target) = target {
            self.pending_targets.insert(lead, target);
        }
        self.events.push(
            self.turn,
            EventKind::PlayedActionCard {
                agent: agent_id,
                card: lead,
                template: template_id,
                time_start: start,
            },
        );
        Ok(())
    }

    /// Reverse a selection: refund holds, destroy clones, clear the
    /// master's cooldown (a cancelled play never spent it)
    pub fn cancel_action_card(
        &mut self,
        agent_id: AgentId,
        card: CardId,
    ) -> Result<(), CommandError> {
        self.require_phase(TurnPhase::PlayerCardSelection)?;
        let (_, template) = self.template_of_card(card)?;

        let is_clone = self
            .cards
            .get(card.handle())
            .map(|c| c.is_clone())
            .unwrap_or(false);

        let agent = self
            .agents
            .get_mut(agent_id.handle())
            .ok_or_else(unknown_agent)?;
        agent
            .turn
            .current
            .timeline
            .remove_play(card)
            .ok_or(CommandError::CardNotInPlay(card))?;

        agent.resources.stamina.uncommit(template.stamina_cost);
        agent.resources.time.uncommit(template.time_cost);

        if is_clone {
            if let Some(master) = agent.zones.destroy_clone(&mut self.cards, card) {
                agent.zones.clear_cooldown(master);
            }
        } else {
            agent.zones.move_to(card, Zone::Hand);
        }

        self.pending_targets.remove(&card);
        self.events.push(
            self.turn,
            EventKind::CancelledActionCard {
                agent: agent_id,
                card,
            },
        );
        Ok(())
    }

    /// Remove an unmodified play in commit phase, refunding its reserved
    /// stamina and time; costs the flat focus fee
    pub fn commit_withdraw(
        &mut self,
        agent_id: AgentId,
        card: CardId,
    ) -> Result<(), CommandError> {
        self.require_phase(TurnPhase::CommitPhase)?;
        let (_, template) = self.template_of_card(card)?;
        let fee = self.config.commit_focus_fee;

        let is_clone = self
            .cards
            .get(card.handle())
            .map(|c| c.is_clone())
            .unwrap_or(false);

        let agent = self
            .agents
            .get_mut(agent_id.handle())
            .ok_or_else(unknown_agent)?;
        {
            let play = agent
                .turn
                .current
                .timeline
                .find_play(card)
                .ok_or(CommandError::CardNotInPlay(card))?;
            if !play.can_withdraw() {
                return Err(CommandError::PredicateFailed(
                    "play has modifiers attached".into(),
                ));
            }
        }

        agent.resources.focus.spend(fee).map_err(insufficient_focus)?;
        agent.turn.current.focus_spent += fee;

        let play = agent
            .turn
            .current
            .timeline
            .remove_play(card)
            .ok_or_else(|| CommandError::BadInvariant("play vanished mid-withdraw".into()))?;
        agent.resources.stamina.refund(template.stamina_cost);
        agent.resources.time.refund(play.duration());

        if is_clone {
            if let Some(master) = agent.zones.destroy_clone(&mut self.cards, card) {
                agent.zones.clear_cooldown(master);
            }
        } else {
            agent.zones.move_to(card, Zone::Hand);
        }

        self.pending_targets.remove(&card);
        self.events.push(
            self.turn,
            EventKind::PlayWithdrawn {
                agent: agent_id,
                card,
            },
        );
        Ok(())
    }

    /// Play a new card directly in commit phase; the play is flagged so
    /// it can never be stacked this turn
    pub fn commit_add(
        &mut self,
        agent_id: AgentId,
        card: CardId,
        target: Option<AgentId>,
    ) -> Result<(), CommandError> {
        self.require_phase(TurnPhase::CommitPhase)?;
        let source = self.card_source(agent_id, card)?;
        let (template_id, template) = self.template_of_card(card)?;
        if template.is_offensive() && target.is_none() {
            return Err(CommandError::PredicateFailed(
                "offensive play requires a target".into(),
            ));
        }
        validation::check_predicates(self, agent_id, &template, target)?;

        let fee = self.config.commit_focus_fee;
        let duration = template.time_cost;
        let agent = self
            .agents
            .get_mut(agent_id.handle())
            .ok_or_else(unknown_agent)?;

        // Commit phase spends are final; refund on any later failure
        agent.resources.focus.spend(fee).map_err(insufficient_focus)?;
        if let Err(shortfall) = agent.resources.stamina.spend(template.stamina_cost) {
            agent.resources.focus.refund(fee);
            return Err(insufficient_stamina(shortfall));
        }
        if let Err(shortfall) = agent.resources.time.spend(duration) {
            agent.resources.stamina.refund(template.stamina_cost);
            agent.resources.focus.refund(fee);
            return Err(insufficient_time(shortfall));
        }

        let lead = match source {
            CardSource::Hand => {
                agent.zones.move_to(card, Zone::InPlay);
                card
            }
            CardSource::Pool => match agent.zones.clone_pool_card(&mut self.cards, card) {
                Some(clone) => clone,
                None => {
                    agent.resources.time.refund(duration);
                    agent.resources.stamina.refund(template.stamina_cost);
                    agent.resources.focus.refund(fee);
                    return Err(CommandError::BadInvariant("pool master missing".into()));
                }
            },
        };

        let mut play = Play::new(lead, template_id, &template);
        play.added_in_commit = true;
        play.target = target;
        let start = match agent.turn.current.add_play(play) {
            Ok(start) => start,
            Err(err) => {
                rollback_card(agent, &mut self.cards, source, card, lead);
                agent.resources.time.refund(duration);
                agent.resources.stamina.refund(template.stamina_cost);
                agent.resources.focus.refund(fee);
                return Err(err.into());
            }
        };

        agent.turn.current.focus_spent += fee;
        if source == CardSource::Pool {
            agent.zones.apply_cooldown(card, template.cooldown);
        }
        if let Some(target) = target {
            self.pending_targets.insert(lead, target);
        }
        self.events.push(
            self.turn,
            EventKind::PlayAddedInCommit {
                agent: agent_id,
                card: lead,
                template: template_id,
                time_start: start,
            },
        );
        Ok(())
    }

    /// Attach a card onto an existing play: same-template reinforcement,
    /// or a predicate-gated modifier
    ///
    /// The first stack of the turn additionally pays the flat focus fee;
    /// later stacks pay only the stacked card's own focus cost.
    pub fn commit_stack(
        &mut self,
        agent_id: AgentId,
        card: CardId,
        onto: CardId,
    ) -> Result<(), CommandError> {
        self.require_phase(TurnPhase::CommitPhase)?;
        let source = self.card_source(agent_id, card)?;
        let (template_id, template) = self.template_of_card(card)?;

        let (play_template, play_target) = {
            let agent = self.agents.get(agent_id.handle()).ok_or_else(unknown_agent)?;
            let play = agent
                .turn
                .current
                .timeline
                .find_play(onto)
                .ok_or(CommandError::CardNotInPlay(onto))?;
            if !play.can_stack() {
                return Err(CommandError::PredicateFailed(
                    "play was added in commit phase".into(),
                ));
            }
            if play.modifier_count() >= MAX_MODIFIERS {
                return Err(CommandError::ModifierOverflow);
            }
            (play.template, play.target)
        };

        let effect: ModifyPlay = if template_id == play_template {
            // Same-template reinforcement rides the technique's overlay
            let technique = template.technique.as_ref().ok_or_else(|| {
                CommandError::BadInvariant("reinforcement lead has no technique".into())
            })?;
            ModifyPlay {
                damage_mult: technique.overlay_damage_mult,
                hit_bonus: technique.overlay_hit_bonus,
                ..Default::default()
            }
        } else if template.is_modifier() {
            validation::check_predicates(self, agent_id, &template, play_target)?;
            template.modify_play.ok_or_else(|| {
                CommandError::BadInvariant("modifier template lost its effect".into())
            })?
        } else {
            return Err(CommandError::TemplatesMismatch);
        };

        {
            let agent = self.agents.get(agent_id.handle()).ok_or_else(unknown_agent)?;
            let play = agent
                .turn
                .current
                .timeline
                .find_play(onto)
                .ok_or(CommandError::CardNotInPlay(onto))?;
            if play.would_conflict(&effect) {
                return Err(CommandError::ModifierConflict);
            }
        }

        let agent = self
            .agents
            .get_mut(agent_id.handle())
            .ok_or_else(unknown_agent)?;
        let fee = if agent.turn.current.stack_focus_paid {
            0.0
        } else {
            self.config.commit_focus_fee
        };
        let total = fee + template.focus_cost;
        agent
            .resources
            .focus
            .spend(total)
            .map_err(insufficient_focus)?;

        // Everything past the spend refunds on failure; no partial leaks
        let stacked = match source {
            CardSource::Hand => {
                agent.zones.move_to(card, Zone::InPlay);
                card
            }
            CardSource::Pool => match agent.zones.clone_pool_card(&mut self.cards, card) {
                Some(clone) => clone,
                None => {
                    agent.resources.focus.refund(total);
                    return Err(CommandError::BadInvariant("pool master missing".into()));
                }
            },
        };

        let slot = ModifierSlot {
            card: stacked,
            template: template_id,
            effect,
        };
        let attach = agent
            .turn
            .current
            .timeline
            .find_play_mut(onto)
            .ok_or(CommandError::CardNotInPlay(onto))
            .and_then(|play| play.add_modifier(slot));
        if let Err(err) = attach {
            rollback_card(agent, &mut self.cards, source, card, stacked);
            agent.resources.focus.refund(total);
            return Err(err);
        }

        // The play may have grown; its slot must still fit its neighbors
        if let Err(err) = agent.turn.current.timeline.still_fits(onto) {
            if let Some(play) = agent.turn.current.timeline.find_play_mut(onto) {
                play.pop_modifier();
            }
            rollback_card(agent, &mut self.cards, source, card, stacked);
            agent.resources.focus.refund(total);
            tracing::debug!(card = ?card, error = %err, "stack rejected: play no longer fits");
            return Err(err.into());
        }

        if source == CardSource::Pool {
            agent.zones.apply_cooldown(card, template.cooldown);
        }
        if fee > 0.0 {
            agent.turn.current.stack_focus_paid = true;
        }
        agent.turn.current.focus_spent += total;

        self.events.push(
            self.turn,
            EventKind::CardStacked {
                agent: agent_id,
                play_card: onto,
                stacked_card: stacked,
                template: template_id,
            },
        );
        Ok(())
    }
}
