//! A play: one scheduled card plus its modifier stack
//!
//! Modifier effects fold left-to-right in attachment order; the play's own
//! stored overrides apply last, so a late override always wins for height
//! while multipliers from every source compound.

use arrayvec::ArrayVec;

use crate::content::template::{Channels, ModifyPlay, Template, TemplateId};
use crate::core::arena::{AgentId, CardId};
use crate::core::error::CommandError;
use crate::core::types::{Height, Stakes};
use crate::engagement::AdvantageEffect;

/// Hard cap on the modifier stack; overflow is a reported error, not
/// truncation
pub const MAX_MODIFIERS: usize = 4;

/// One attached modifier: the card that paid for it and the effect copied
/// from its template
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifierSlot {
    pub card: CardId,
    pub template: TemplateId,
    pub effect: ModifyPlay,
}

/// The unit the scheduler manages
#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    pub card: CardId,
    pub template: TemplateId,
    pub target: Option<AgentId>,
    /// Focus-added plays cannot receive further stacking this turn
    pub added_in_commit: bool,
    base_time_cost: f32,
    channels: Channels,
    base_height: Option<Height>,
    modifiers: ArrayVec<ModifierSlot, MAX_MODIFIERS>,
    /// Stored overrides, applied after the modifier fold
    pub cost_mult: f32,
    pub damage_mult: f32,
    pub height_override: Option<Height>,
    pub advantage_override: Option<AdvantageEffect>,
}

impl Play {
    pub fn new(card: CardId, template_id: TemplateId, template: &Template) -> Self {
        Self {
            card,
            template: template_id,
            target: None,
            added_in_commit: false,
            base_time_cost: template.time_cost,
            channels: template.channels(),
            base_height: template
                .technique
                .as_ref()
                .and_then(|t| t.target_height),
            modifiers: ArrayVec::new(),
            cost_mult: 1.0,
            damage_mult: 1.0,
            height_override: None,
            advantage_override: None,
        }
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn modifiers(&self) -> &[ModifierSlot] {
        &self.modifiers
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    /// Commitment level derived from stack depth
    pub fn stakes(&self) -> Stakes {
        Stakes::from_depth(self.modifiers.len())
    }

    /// Focus-added plays are frozen for the rest of the turn
    pub fn can_stack(&self) -> bool {
        !self.added_in_commit
    }

    /// Only unmodified plays may be withdrawn in commit phase
    pub fn can_withdraw(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// The only defined modifier conflict: two explicit height overrides
    /// that disagree
    pub fn would_conflict(&self, incoming: &ModifyPlay) -> bool {
        let Some(new_height) = incoming.height_override else {
            return false;
        };
        self.modifiers.iter().any(|m| {
            m.effect
                .height_override
                .map(|h| h != new_height)
                .unwrap_or(false)
        })
    }

    /// Bounded push; the caller has already checked conflicts
    pub fn add_modifier(&mut self, slot: ModifierSlot) -> Result<(), CommandError> {
        self.modifiers
            .try_push(slot)
            .map_err(|_| CommandError::ModifierOverflow)
    }

    /// Undo the most recent attachment (stacking rollback)
    pub(crate) fn pop_modifier(&mut self) -> Option<ModifierSlot> {
        self.modifiers.pop()
    }

    /// Fold of cost multipliers, stored override last
    pub fn effective_cost_mult(&self) -> f32 {
        let folded = self
            .modifiers
            .iter()
            .fold(1.0, |acc, m| acc * m.effect.cost_mult);
        folded * self.cost_mult
    }

    /// Fold of damage multipliers, stored override last
    pub fn effective_damage_mult(&self) -> f32 {
        let folded = self
            .modifiers
            .iter()
            .fold(1.0, |acc, m| acc * m.effect.damage_mult);
        folded * self.damage_mult
    }

    /// Sum of modifier hit bonuses
    pub fn effective_hit_bonus(&self) -> f32 {
        self.modifiers.iter().map(|m| m.effect.hit_bonus).sum()
    }

    /// Technique height, overridden first-attached-first, stored override
    /// winning over all of them
    pub fn effective_height(&self) -> Option<Height> {
        let mut height = self.base_height;
        for m in &self.modifiers {
            if let Some(h) = m.effect.height_override {
                height = Some(h);
            }
        }
        if let Some(h) = self.height_override {
            height = Some(h);
        }
        height
    }

    /// Advantage profile override, same precedence as height
    pub fn effective_advantage_override(&self) -> Option<AdvantageEffect> {
        let mut profile = None;
        for m in &self.modifiers {
            if let Some(p) = m.effect.advantage_override {
                profile = Some(p);
            }
        }
        if let Some(p) = self.advantage_override {
            profile = Some(p);
        }
        profile
    }

    /// Time the play occupies, always recomputed from the current stack
    pub fn duration(&self) -> f32 {
        self.base_time_cost * self.effective_cost_mult()
    }
}
