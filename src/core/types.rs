//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Encounter turn counter (one turn = one resolved tick)
pub type Tick = u64;

/// Vertical line a technique attacks along or a guard protects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Height {
    High,
    Mid,
    Low,
}

impl Height {
    /// High and Low are adjacent to Mid but not to each other
    pub fn is_adjacent(&self, other: Height) -> bool {
        matches!(
            (self, other),
            (Height::High, Height::Mid)
                | (Height::Mid, Height::High)
                | (Height::Mid, Height::Low)
                | (Height::Low, Height::Mid)
        )
    }
}

/// Discrete reach band between two engaged fighters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeBand {
    /// Touching distance (grappling, daggers)
    Grapple,
    /// Arm's length (swords, maces)
    Close,
    /// Extended arm (bastard swords, axes)
    Medium,
    /// Spear length and beyond
    Long,
}

impl RangeBand {
    /// Shift by whole bands, clamped at the extremes
    pub fn shifted(&self, steps: i8) -> RangeBand {
        const ORDER: [RangeBand; 4] = [
            RangeBand::Grapple,
            RangeBand::Close,
            RangeBand::Medium,
            RangeBand::Long,
        ];
        let idx = ORDER.iter().position(|r| r == self).unwrap_or(2) as i32;
        let idx = (idx + steps as i32).clamp(0, 3) as usize;
        ORDER[idx]
    }
}

/// Commitment level of a play, derived from modifier stack depth
///
/// Higher stakes scale both reward (hit chance, damage) and risk
/// (advantage swings on failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stakes {
    Guarded,
    Committed,
    Reckless,
}

impl Stakes {
    /// Stakes escalate with modifier stack depth: 0 -> guarded,
    /// 1 -> committed, 2+ -> reckless
    pub fn from_depth(depth: usize) -> Stakes {
        match depth {
            0 => Stakes::Guarded,
            1 => Stakes::Committed,
            _ => Stakes::Reckless,
        }
    }

    /// Flat addition to hit chance
    pub fn hit_bonus(&self) -> f32 {
        match self {
            Stakes::Guarded => 0.0,
            Stakes::Committed => 0.05,
            Stakes::Reckless => 0.10,
        }
    }

    /// Scales advantage swings in both directions
    pub fn advantage_mult(&self) -> f32 {
        match self {
            Stakes::Guarded => 0.75,
            Stakes::Committed => 1.0,
            Stakes::Reckless => 1.5,
        }
    }

    /// Scales the damage packet on a landed hit
    pub fn damage_mult(&self) -> f32 {
        match self {
            Stakes::Guarded => 0.9,
            Stakes::Committed => 1.0,
            Stakes::Reckless => 1.25,
        }
    }
}

/// Result of resolving one offensive play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Hit,
    Parried,
    Blocked,
    Deflected,
    Miss,
}

/// One axis of the per-pair engagement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvantageAxis {
    Pressure,
    Control,
    Position,
}

/// Phase of the per-encounter turn state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    DrawHand,
    PlayerCardSelection,
    CommitPhase,
    TickResolution,
    /// Reserved for reactive defenses; no transition reaches it yet
    PlayerReaction,
    Animating,
}

/// Which intrinsic stat a damage-scaling rule reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Power,
    Speed,
    Skill,
}

/// Intrinsic stats of an agent, consumed by damage scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub power: f32,
    pub speed: f32,
    pub skill: f32,
}

impl AgentStats {
    pub fn get(&self, kind: StatKind) -> f32 {
        match kind {
            StatKind::Power => self.power,
            StatKind::Speed => self.speed,
            StatKind::Skill => self.skill,
        }
    }
}

impl Default for AgentStats {
    fn default() -> Self {
        Self {
            power: 1.0,
            speed: 1.0,
            skill: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stakes_escalate_with_depth() {
        assert_eq!(Stakes::from_depth(0), Stakes::Guarded);
        assert_eq!(Stakes::from_depth(1), Stakes::Committed);
        assert_eq!(Stakes::from_depth(2), Stakes::Reckless);
        assert_eq!(Stakes::from_depth(4), Stakes::Reckless);
        assert!(Stakes::Guarded < Stakes::Committed);
        assert!(Stakes::Committed < Stakes::Reckless);
    }

    #[test]
    fn test_stakes_scale_reward_and_risk_together() {
        assert!(Stakes::Reckless.hit_bonus() > Stakes::Guarded.hit_bonus());
        assert!(Stakes::Reckless.advantage_mult() > Stakes::Guarded.advantage_mult());
        assert!(Stakes::Reckless.damage_mult() > Stakes::Guarded.damage_mult());
    }

    #[test]
    fn test_height_adjacency() {
        assert!(Height::High.is_adjacent(Height::Mid));
        assert!(Height::Low.is_adjacent(Height::Mid));
        assert!(!Height::High.is_adjacent(Height::Low));
        assert!(!Height::Mid.is_adjacent(Height::Mid));
    }

    #[test]
    fn test_range_shift_clamps() {
        assert_eq!(RangeBand::Close.shifted(1), RangeBand::Medium);
        assert_eq!(RangeBand::Close.shifted(-1), RangeBand::Grapple);
        assert_eq!(RangeBand::Grapple.shifted(-2), RangeBand::Grapple);
        assert_eq!(RangeBand::Long.shifted(3), RangeBand::Long);
    }
}
