//! Immutable card templates
//!
//! A template is content: the engine reads it, never mutates it. Card
//! instances reference templates by [`TemplateId`] through the registry.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::core::types::{AdvantageAxis, AgentStats, Height, Outcome, RangeBand, StatKind};
use crate::engagement::AdvantageEffect;

/// Index into the registry's template table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub(crate) u32);

impl TemplateId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Role tags; resolution keys off OFFENSIVE/DEFENSIVE, stacking off
    /// MODIFIER
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CardTags: u8 {
        const OFFENSIVE = 1 << 0;
        const DEFENSIVE = 1 << 1;
        const MODIFIER  = 1 << 2;
    }
}

bitflags! {
    /// Exclusivity categories a play occupies on the timeline
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Channels: u8 {
        const WEAPON   = 1 << 0;
        const OFF_HAND = 1 << 1;
        const FOOTWORK = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackMode {
    Swing,
    Thrust,
}

/// How a defensive technique turns a failed attack into an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenseKind {
    Parry,
    Block,
    Deflect,
}

impl DefenseKind {
    pub fn outcome(&self) -> Outcome {
        match self {
            DefenseKind::Parry => Outcome::Parried,
            DefenseKind::Block => Outcome::Blocked,
            DefenseKind::Deflect => Outcome::Deflected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    Cut,
    Pierce,
    Blunt,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageInstance {
    pub amount: f32,
    pub kind: DamageKind,
}

/// Which stats feed damage, and at what ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatScaling {
    pub ratio: f32,
    pub source: ScalingSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingSource {
    Stat(StatKind),
    Average(StatKind, StatKind),
}

impl Default for StatScaling {
    fn default() -> Self {
        Self {
            ratio: 1.0,
            source: ScalingSource::Stat(StatKind::Power),
        }
    }
}

impl StatScaling {
    pub fn apply(&self, stats: &AgentStats) -> f32 {
        let base = match self.source {
            ScalingSource::Stat(kind) => stats.get(kind),
            ScalingSource::Average(a, b) => (stats.get(a) + stats.get(b)) / 2.0,
        };
        base * self.ratio
    }
}

/// Per-outcome advantage overrides; `None` falls back to the global
/// defaults in the resolution engine
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeAdvantage {
    pub on_hit: Option<AdvantageEffect>,
    pub on_parried: Option<AdvantageEffect>,
    pub on_blocked: Option<AdvantageEffect>,
    pub on_deflected: Option<AdvantageEffect>,
    pub on_miss: Option<AdvantageEffect>,
}

impl OutcomeAdvantage {
    pub fn for_outcome(&self, outcome: Outcome) -> Option<&AdvantageEffect> {
        match outcome {
            Outcome::Hit => self.on_hit.as_ref(),
            Outcome::Parried => self.on_parried.as_ref(),
            Outcome::Blocked => self.on_blocked.as_ref(),
            Outcome::Deflected => self.on_deflected.as_ref(),
            Outcome::Miss => self.on_miss.as_ref(),
        }
    }
}

/// The combat half of a card: what happens when the play resolves
#[derive(Debug, Clone, PartialEq)]
pub struct Technique {
    pub attack_mode: Option<AttackMode>,
    /// Line an attack targets
    pub target_height: Option<Height>,
    pub secondary_height: Option<Height>,
    /// Line a defense protects
    pub guard_height: Option<Height>,
    /// Guard also gives partial cover to adjacent lines
    pub covers_adjacent: bool,
    pub difficulty: f32,
    pub channels: Channels,
    pub damage: Vec<DamageInstance>,
    pub scaling: StatScaling,
    /// How well each defense class answers this attack; < 1.0 means the
    /// defense bites harder than usual
    pub parry_mult: f32,
    pub block_mult: f32,
    pub deflect_mult: f32,
    /// Set on defensive techniques: how a stopped attack is classified
    pub defense: Option<DefenseKind>,
    /// Bonuses when the same technique is stacked as reinforcement
    pub overlay_hit_bonus: f32,
    pub overlay_damage_mult: f32,
    pub advantage: OutcomeAdvantage,
}

impl Default for Technique {
    fn default() -> Self {
        Self {
            attack_mode: None,
            target_height: None,
            secondary_height: None,
            guard_height: None,
            covers_adjacent: false,
            difficulty: 0.0,
            channels: Channels::WEAPON,
            damage: Vec::new(),
            scaling: StatScaling::default(),
            parry_mult: 1.0,
            block_mult: 1.0,
            deflect_mult: 1.0,
            defense: None,
            overlay_hit_bonus: 0.0,
            overlay_damage_mult: 1.0,
            advantage: OutcomeAdvantage::default(),
        }
    }
}

impl Technique {
    pub fn defense_mult(&self, kind: DefenseKind) -> f32 {
        match kind {
            DefenseKind::Parry => self.parry_mult,
            DefenseKind::Block => self.block_mult,
            DefenseKind::Deflect => self.deflect_mult,
        }
    }
}

/// What a modifier card does to the play it is stacked onto
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifyPlay {
    pub cost_mult: f32,
    pub damage_mult: f32,
    pub hit_bonus: f32,
    pub height_override: Option<Height>,
    pub advantage_override: Option<AdvantageEffect>,
}

impl Default for ModifyPlay {
    fn default() -> Self {
        Self {
            cost_mult: 1.0,
            damage_mult: 1.0,
            hit_bonus: 0.0,
            height_override: None,
            advantage_override: None,
        }
    }
}

/// Card-selection gate, evaluated by the command layer before any
/// mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Equipped weapon must be able to swing
    RequiresSwing,
    /// Equipped weapon must be able to thrust
    RequiresThrust,
    /// Minimum signed advantage on one engagement axis vs. the target
    MinAdvantage { axis: AdvantageAxis, value: f32 },
    /// Engagement range must be at or inside the band
    RangeAtMost(RangeBand),
    /// The named template must appear in last turn's plays
    PlayedLastTurn(String),
}

/// Equipped weapon, consumed read-only by validation and resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    pub name: String,
    pub accuracy: f32,
    pub parry: f32,
    pub damage_mult: f32,
    pub penetration: f32,
    pub reach: RangeBand,
    pub swing: bool,
    pub thrust: bool,
}

impl WeaponProfile {
    /// Common weapon: arming sword
    pub fn arming_sword() -> Self {
        Self {
            name: "arming_sword".into(),
            accuracy: 0.5,
            parry: 0.6,
            damage_mult: 1.0,
            penetration: 0.4,
            reach: RangeBand::Close,
            swing: true,
            thrust: true,
        }
    }

    /// Common weapon: spear
    pub fn spear() -> Self {
        Self {
            name: "spear".into(),
            accuracy: 0.6,
            parry: 0.3,
            damage_mult: 1.1,
            penetration: 0.7,
            reach: RangeBand::Long,
            swing: false,
            thrust: true,
        }
    }

    /// Common weapon: dagger
    pub fn dagger() -> Self {
        Self {
            name: "dagger".into(),
            accuracy: 0.7,
            parry: 0.2,
            damage_mult: 0.7,
            penetration: 0.6,
            reach: RangeBand::Grapple,
            swing: true,
            thrust: true,
        }
    }
}

impl Default for WeaponProfile {
    fn default() -> Self {
        Self::arming_sword()
    }
}

/// A complete card definition
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub tags: CardTags,
    pub stamina_cost: f32,
    pub time_cost: f32,
    pub focus_cost: f32,
    /// Turns the master stays locked after a pool play; 0 = none
    pub cooldown: u32,
    pub technique: Option<Technique>,
    pub modify_play: Option<ModifyPlay>,
    pub predicates: Vec<Predicate>,
}

impl Template {
    pub fn is_offensive(&self) -> bool {
        self.tags.contains(CardTags::OFFENSIVE)
    }

    pub fn is_defensive(&self) -> bool {
        self.tags.contains(CardTags::DEFENSIVE)
    }

    pub fn is_modifier(&self) -> bool {
        self.tags.contains(CardTags::MODIFIER)
    }

    /// Channels the play occupies; cards without a technique take none
    pub fn channels(&self) -> Channels {
        self.technique
            .as_ref()
            .map(|t| t.channels)
            .unwrap_or(Channels::empty())
    }

    /// Test/demo card: a mid-line cut
    pub fn cut() -> Self {
        Self {
            name: "cut".into(),
            tags: CardTags::OFFENSIVE,
            stamina_cost: 3.0,
            time_cost: 0.2,
            focus_cost: 0.0,
            cooldown: 0,
            technique: Some(Technique {
                attack_mode: Some(AttackMode::Swing),
                target_height: Some(Height::Mid),
                difficulty: 0.5,
                channels: Channels::WEAPON,
                damage: vec![DamageInstance {
                    amount: 4.0,
                    kind: DamageKind::Cut,
                }],
                ..Default::default()
            }),
            modify_play: None,
            predicates: vec![Predicate::RequiresSwing],
        }
    }

    /// Test/demo card: a high thrust, harder but more penetrating
    pub fn thrust() -> Self {
        Self {
            name: "thrust".into(),
            tags: CardTags::OFFENSIVE,
            stamina_cost: 2.0,
            time_cost: 0.2,
            focus_cost: 0.0,
            cooldown: 0,
            technique: Some(Technique {
                attack_mode: Some(AttackMode::Thrust),
                target_height: Some(Height::High),
                difficulty: 1.0,
                channels: Channels::WEAPON,
                damage: vec![DamageInstance {
                    amount: 3.0,
                    kind: DamageKind::Pierce,
                }],
                scaling: StatScaling {
                    ratio: 1.0,
                    source: ScalingSource::Average(StatKind::Power, StatKind::Speed),
                },
                parry_mult: 0.9,
                ..Default::default()
            }),
            modify_play: None,
            predicates: vec![Predicate::RequiresThrust],
        }
    }

    /// Test/demo card: a mid parry
    pub fn parry() -> Self {
        Self {
            name: "parry".into(),
            tags: CardTags::DEFENSIVE,
            stamina_cost: 1.0,
            time_cost: 0.2,
            focus_cost: 0.0,
            cooldown: 0,
            technique: Some(Technique {
                guard_height: Some(Height::Mid),
                covers_adjacent: true,
                channels: Channels::WEAPON,
                defense: Some(DefenseKind::Parry),
                ..Default::default()
            }),
            modify_play: None,
            predicates: Vec::new(),
        }
    }

    /// Test/demo card: a high block on the off-hand
    pub fn high_block() -> Self {
        Self {
            name: "high_block".into(),
            tags: CardTags::DEFENSIVE,
            stamina_cost: 1.0,
            time_cost: 0.3,
            focus_cost: 0.0,
            cooldown: 0,
            technique: Some(Technique {
                guard_height: Some(Height::High),
                channels: Channels::OFF_HAND,
                defense: Some(DefenseKind::Block),
                ..Default::default()
            }),
            modify_play: None,
            predicates: Vec::new(),
        }
    }

    /// Test/demo card: footwork deflection
    pub fn sidestep() -> Self {
        Self {
            name: "sidestep".into(),
            tags: CardTags::DEFENSIVE,
            stamina_cost: 1.0,
            time_cost: 0.2,
            focus_cost: 0.0,
            cooldown: 0,
            technique: Some(Technique {
                guard_height: Some(Height::Mid),
                channels: Channels::FOOTWORK,
                defense: Some(DefenseKind::Deflect),
                ..Default::default()
            }),
            modify_play: None,
            predicates: Vec::new(),
        }
    }

    /// Test/demo modifier: trade cost for accuracy
    pub fn feint() -> Self {
        Self {
            name: "feint".into(),
            tags: CardTags::MODIFIER,
            stamina_cost: 0.0,
            time_cost: 0.0,
            focus_cost: 1.0,
            cooldown: 0,
            technique: None,
            modify_play: Some(ModifyPlay {
                cost_mult: 1.2,
                hit_bonus: 0.1,
                ..Default::default()
            }),
            predicates: Vec::new(),
        }
    }

    /// Test/demo modifier: heavier, slower swing
    pub fn power_through() -> Self {
        Self {
            name: "power_through".into(),
            tags: CardTags::MODIFIER,
            stamina_cost: 0.0,
            time_cost: 0.0,
            focus_cost: 1.0,
            cooldown: 0,
            technique: None,
            modify_play: Some(ModifyPlay {
                cost_mult: 1.5,
                damage_mult: 1.4,
                ..Default::default()
            }),
            predicates: Vec::new(),
        }
    }

    /// Test/demo modifier: redirect the attack to the high line
    pub fn high_line() -> Self {
        Self {
            name: "high_line".into(),
            tags: CardTags::MODIFIER,
            stamina_cost: 0.0,
            time_cost: 0.0,
            focus_cost: 1.0,
            cooldown: 0,
            technique: None,
            modify_play: Some(ModifyPlay {
                height_override: Some(Height::High),
                ..Default::default()
            }),
            predicates: Vec::new(),
        }
    }

    /// Test/demo modifier: redirect the attack to the low line
    pub fn low_line() -> Self {
        Self {
            name: "low_line".into(),
            tags: CardTags::MODIFIER,
            stamina_cost: 0.0,
            time_cost: 0.0,
            focus_cost: 1.0,
            cooldown: 0,
            technique: None,
            modify_play: Some(ModifyPlay {
                height_override: Some(Height::Low),
                ..Default::default()
            }),
            predicates: Vec::new(),
        }
    }

    /// Test/demo pool technique: big overhead strike with a cooldown
    pub fn overhead_strike() -> Self {
        Self {
            name: "overhead_strike".into(),
            tags: CardTags::OFFENSIVE,
            stamina_cost: 4.0,
            time_cost: 0.4,
            focus_cost: 0.0,
            cooldown: 2,
            technique: Some(Technique {
                attack_mode: Some(AttackMode::Swing),
                target_height: Some(Height::High),
                difficulty: 1.5,
                channels: Channels::WEAPON | Channels::FOOTWORK,
                damage: vec![DamageInstance {
                    amount: 7.0,
                    kind: DamageKind::Cut,
                }],
                overlay_damage_mult: 1.2,
                ..Default::default()
            }),
            modify_play: None,
            predicates: vec![Predicate::RequiresSwing],
        }
    }
}
