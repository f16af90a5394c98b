//! Per-pair engagement state and its mutation rules
//!
//! An engagement is the relational memory between two fighters: who is
//! pressing, who holds the line, whose footing dominates, and at what
//! reach. Axes live in [0, 1] with 0.5 neutral and are oriented toward the
//! pair's *first* agent (lower slot index); readers on the other side flip
//! the sign. All mutation goes through [`AdvantageEffect::apply`], which
//! clamps every axis.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::arena::AgentId;
use crate::core::types::{AdvantageAxis, RangeBand};

/// Canonical unordered pair key: lower slot index always first, so
/// insertion order of the pair never matters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
    first: AgentId,
    second: AgentId,
}

impl PairKey {
    pub fn new(a: AgentId, b: AgentId) -> Self {
        if a.index() <= b.index() {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }

    pub fn first(&self) -> AgentId {
        self.first
    }

    pub fn second(&self) -> AgentId {
        self.second
    }

    /// True if `agent` is the orientation anchor of this pair
    pub fn oriented_toward(&self, agent: AgentId) -> bool {
        self.first == agent
    }
}

/// Relational state for one pair of agents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub pressure: f32,
    pub control: f32,
    pub position: f32,
    pub range: RangeBand,
}

impl Default for Engagement {
    fn default() -> Self {
        Self {
            pressure: 0.5,
            control: 0.5,
            position: 0.5,
            range: RangeBand::Medium,
        }
    }
}

impl Engagement {
    pub fn axis(&self, axis: AdvantageAxis) -> f32 {
        match axis {
            AdvantageAxis::Pressure => self.pressure,
            AdvantageAxis::Control => self.control,
            AdvantageAxis::Position => self.position,
        }
    }

    fn axis_mut(&mut self, axis: AdvantageAxis) -> &mut f32 {
        match axis {
            AdvantageAxis::Pressure => &mut self.pressure,
            AdvantageAxis::Control => &mut self.control,
            AdvantageAxis::Position => &mut self.position,
        }
    }

    /// Mean advantage as a signed term centered on zero, from the
    /// perspective of the pair's first agent (`toward_first = true`) or
    /// the second (`toward_first = false`)
    pub fn signed_advantage(&self, toward_first: bool) -> f32 {
        let mean = (self.pressure + self.control + self.position) / 3.0 - 0.5;
        if toward_first {
            mean
        } else {
            -mean
        }
    }
}

/// One axis mutation that actually changed a value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisChange {
    pub axis: AdvantageAxis,
    pub from: f32,
    pub to: f32,
}

/// Deltas applied to an engagement and the two fighters' balance
///
/// Deltas are expressed from the attacker's perspective; `apply` flips the
/// engagement-axis signs when the attacker is not the pair's first agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvantageEffect {
    pub pressure: f32,
    pub control: f32,
    pub position: f32,
    /// Whole reach bands, positive = opening distance
    pub range_shift: i8,
    pub attacker_balance: f32,
    pub defender_balance: f32,
}

impl Default for AdvantageEffect {
    fn default() -> Self {
        Self {
            pressure: 0.0,
            control: 0.0,
            position: 0.0,
            range_shift: 0,
            attacker_balance: 0.0,
            defender_balance: 0.0,
        }
    }
}

impl AdvantageEffect {
    pub fn scaled(&self, mult: f32) -> Self {
        Self {
            pressure: self.pressure * mult,
            control: self.control * mult,
            position: self.position * mult,
            // Range shifts are discrete and do not scale with stakes
            range_shift: self.range_shift,
            attacker_balance: self.attacker_balance * mult,
            defender_balance: self.defender_balance * mult,
        }
    }

    /// Mutate `engagement`, clamping every axis to [0, 1]; returns only
    /// the axes whose value actually changed
    pub fn apply(
        &self,
        engagement: &mut Engagement,
        attacker_is_first: bool,
    ) -> (Vec<AxisChange>, Option<(RangeBand, RangeBand)>) {
        let sign = if attacker_is_first { 1.0 } else { -1.0 };
        let mut changes = Vec::new();

        for (axis, delta) in [
            (AdvantageAxis::Pressure, self.pressure),
            (AdvantageAxis::Control, self.control),
            (AdvantageAxis::Position, self.position),
        ] {
            let slot = engagement.axis_mut(axis);
            let from = *slot;
            let to = (from + delta * sign).clamp(0.0, 1.0);
            if to != from {
                *slot = to;
                changes.push(AxisChange { axis, from, to });
            }
        }

        let range_change = if self.range_shift != 0 {
            let from = engagement.range;
            let to = from.shifted(self.range_shift);
            if to != from {
                engagement.range = to;
                Some((from, to))
            } else {
                None
            }
        } else {
            None
        };

        (changes, range_change)
    }
}

/// All engagements of one encounter, keyed canonically
#[derive(Debug, Default)]
pub struct EngagementMap {
    map: AHashMap<PairKey, Engagement>,
}

impl EngagementMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, a: AgentId, b: AgentId) -> Option<&Engagement> {
        self.map.get(&PairKey::new(a, b))
    }

    /// Fetch the pair's engagement, creating a neutral one on first contact
    pub fn get_or_neutral(&mut self, a: AgentId, b: AgentId) -> &mut Engagement {
        self.map.entry(PairKey::new(a, b)).or_default()
    }

    /// The signed advantage term for `agent` against `other`; neutral
    /// pairs contribute zero
    pub fn signed_advantage(&self, agent: AgentId, other: AgentId) -> f32 {
        let key = PairKey::new(agent, other);
        match self.map.get(&key) {
            Some(e) => e.signed_advantage(key.oriented_toward(agent)),
            None => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &Engagement)> {
        self.map.iter()
    }
}
