//! Damage packets and the body/armor collaborator contract
//!
//! The engine builds a packet and hands it off; how layers, tissue, and
//! penetration interact is the collaborator's business. Whatever
//! sub-results come back are re-emitted as events unmodified.

use crate::content::template::DamageKind;
use crate::core::arena::AgentId;
use crate::core::types::Height;

/// Everything the body model needs to apply one landed hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamagePacket {
    pub amount: f32,
    /// Primary kind, taken from the technique's first damage instance
    pub kind: DamageKind,
    /// From the attacker's weapon profile
    pub penetration: f32,
}

/// What the collaborator reports back after applying a packet
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageReport {
    /// Damage that actually landed after armor
    pub applied: f32,
    pub severed: bool,
    pub gap_found: bool,
    pub layer_destroyed: bool,
}

/// The body/armor subsystem contract
pub trait BodyModel {
    /// Apply a packet to the target at the given attack line
    fn apply_damage(
        &mut self,
        target: AgentId,
        height: Option<Height>,
        packet: &DamagePacket,
    ) -> DamageReport;
}

/// Passes damage straight through; no armor, no wounds
#[derive(Debug, Default)]
pub struct NullBodyModel;

impl BodyModel for NullBodyModel {
    fn apply_damage(
        &mut self,
        _target: AgentId,
        _height: Option<Height>,
        packet: &DamagePacket,
    ) -> DamageReport {
        DamageReport {
            applied: packet.amount,
            ..Default::default()
        }
    }
}

/// Deterministic threshold model for tests and the demo runner
#[derive(Debug, Clone)]
pub struct ThresholdBodyModel {
    /// Armor soak subtracted from every packet
    pub soak: f32,
    /// Penetration above this finds a gap (full damage)
    pub gap_threshold: f32,
    /// Applied damage above this destroys an armor layer
    pub destroy_threshold: f32,
    /// Applied cutting damage above this severs the part
    pub sever_threshold: f32,
}

impl Default for ThresholdBodyModel {
    fn default() -> Self {
        Self {
            soak: 1.0,
            gap_threshold: 0.6,
            destroy_threshold: 6.0,
            sever_threshold: 10.0,
        }
    }
}

impl BodyModel for ThresholdBodyModel {
    fn apply_damage(
        &mut self,
        _target: AgentId,
        _height: Option<Height>,
        packet: &DamagePacket,
    ) -> DamageReport {
        let gap_found = packet.penetration > self.gap_threshold;
        let applied = if gap_found {
            packet.amount
        } else {
            (packet.amount - self.soak).max(0.0)
        };

        DamageReport {
            applied,
            severed: packet.kind == DamageKind::Cut && applied > self.sever_threshold,
            gap_found,
            layer_destroyed: applied > self.destroy_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arena::{AgentId, Arena};

    fn agent() -> AgentId {
        let mut arena: Arena<u8> = Arena::new();
        AgentId(arena.insert(0))
    }

    #[test]
    fn test_null_model_passes_through() {
        let mut model = NullBodyModel;
        let packet = DamagePacket {
            amount: 5.0,
            kind: DamageKind::Cut,
            penetration: 0.5,
        };
        let report = model.apply_damage(agent(), None, &packet);
        assert_eq!(report.applied, 5.0);
        assert!(!report.severed);
    }

    #[test]
    fn test_threshold_model_soaks_without_gap() {
        let mut model = ThresholdBodyModel::default();
        let packet = DamagePacket {
            amount: 5.0,
            kind: DamageKind::Blunt,
            penetration: 0.2,
        };
        let report = model.apply_damage(agent(), None, &packet);
        assert_eq!(report.applied, 4.0);
        assert!(!report.gap_found);
    }

    #[test]
    fn test_threshold_model_gap_skips_soak() {
        let mut model = ThresholdBodyModel::default();
        let packet = DamagePacket {
            amount: 5.0,
            kind: DamageKind::Pierce,
            penetration: 0.8,
        };
        let report = model.apply_damage(agent(), None, &packet);
        assert!(report.gap_found);
        assert_eq!(report.applied, 5.0);
    }

    #[test]
    fn test_threshold_model_severs_on_heavy_cut() {
        let mut model = ThresholdBodyModel::default();
        let packet = DamagePacket {
            amount: 12.0,
            kind: DamageKind::Cut,
            penetration: 0.9,
        };
        let report = model.apply_damage(agent(), None, &packet);
        assert!(report.severed);
        assert!(report.layer_destroyed);
    }
}
