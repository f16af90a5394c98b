//! Card registry: template interning, lookup, and load-time validation
//!
//! Content arrives either from the built-in catalog or from TOML files.
//! Referential and range validation runs exactly once, when the registry
//! is built; runtime code trusts what the registry hands out.

use ahash::AHashMap;
use serde::Deserialize;
use std::path::Path;

use crate::content::template::{
    AttackMode, CardTags, Channels, DamageInstance, DefenseKind, ModifyPlay, OutcomeAdvantage,
    Predicate, ScalingSource, StatScaling, Technique, Template, TemplateId, WeaponProfile,
};
use crate::core::error::{ContentError, EngineError, Result};
use crate::core::types::{AdvantageAxis, Height, RangeBand, StatKind};

/// Immutable content store for one encounter (or many)
pub struct CardRegistry {
    templates: Vec<Template>,
    by_name: AHashMap<String, TemplateId>,
    weapons: Vec<WeaponProfile>,
    weapons_by_name: AHashMap<String, usize>,
}

impl CardRegistry {
    /// Build a registry, running the one-time validation pass
    pub fn from_parts(
        templates: Vec<Template>,
        weapons: Vec<WeaponProfile>,
    ) -> std::result::Result<Self, ContentError> {
        validate_templates(&templates)?;
        validate_weapons(&weapons)?;

        let mut by_name = AHashMap::new();
        for (i, t) in templates.iter().enumerate() {
            by_name.insert(t.name.clone(), TemplateId(i as u32));
        }
        let mut weapons_by_name = AHashMap::new();
        for (i, w) in weapons.iter().enumerate() {
            weapons_by_name.insert(w.name.clone(), i);
        }

        Ok(Self {
            templates,
            by_name,
            weapons,
            weapons_by_name,
        })
    }

    /// The built-in catalog used by tests and the demo runner
    pub fn test_catalog() -> Self {
        let templates = vec![
            Template::cut(),
            Template::thrust(),
            Template::parry(),
            Template::high_block(),
            Template::sidestep(),
            Template::feint(),
            Template::power_through(),
            Template::high_line(),
            Template::low_line(),
            Template::overhead_strike(),
        ];
        let weapons = vec![
            WeaponProfile::arming_sword(),
            WeaponProfile::spear(),
            WeaponProfile::dagger(),
        ];
        // The built-in catalog is maintained alongside the validator
        Self::from_parts(templates, weapons).expect("built-in catalog must validate")
    }

    pub fn get(&self, id: TemplateId) -> Option<&Template> {
        self.templates.get(id.index())
    }

    pub fn id_of(&self, name: &str) -> Option<TemplateId> {
        self.by_name.get(name).copied()
    }

    pub fn weapon(&self, name: &str) -> Option<&WeaponProfile> {
        self.weapons_by_name
            .get(name)
            .and_then(|&i| self.weapons.get(i))
    }

    pub fn weapons(&self) -> impl Iterator<Item = &WeaponProfile> {
        self.weapons.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &Template)> {
        self.templates
            .iter()
            .enumerate()
            .map(|(i, t)| (TemplateId(i as u32), t))
    }

    /// Parse a TOML content document
    pub fn load_toml_str(content: &str) -> Result<Self> {
        let doc: ContentDoc = toml::from_str(content)?;
        let templates = doc
            .cards
            .into_iter()
            .map(CardDoc::into_template)
            .collect::<std::result::Result<Vec<_>, ContentError>>()?;
        Ok(Self::from_parts(templates, doc.weapons)?)
    }

    /// Load a content file from disk
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::load_toml_str(&content)
    }
}

fn validate_templates(templates: &[Template]) -> std::result::Result<(), ContentError> {
    let mut seen = AHashMap::new();
    for t in templates {
        if seen.insert(t.name.clone(), ()).is_some() {
            return Err(ContentError::DuplicateName(t.name.clone()));
        }
        if t.stamina_cost < 0.0 || t.time_cost < 0.0 || t.focus_cost < 0.0 {
            return Err(ContentError::NegativeCost(t.name.clone()));
        }
        if t.is_offensive() && t.technique.is_none() {
            return Err(ContentError::MissingTechnique(t.name.clone()));
        }
        if t.is_modifier() && t.modify_play.is_none() {
            return Err(ContentError::MissingModifyEffect(t.name.clone()));
        }
        if let Some(technique) = &t.technique {
            if technique.channels.is_empty() {
                return Err(ContentError::NoChannels(t.name.clone()));
            }
            for mult in [
                technique.parry_mult,
                technique.block_mult,
                technique.deflect_mult,
            ] {
                if mult <= 0.0 || mult > 4.0 {
                    return Err(ContentError::BadDefenseMult(t.name.clone()));
                }
            }
        }
    }
    Ok(())
}

fn validate_weapons(weapons: &[WeaponProfile]) -> std::result::Result<(), ContentError> {
    let mut seen = AHashMap::new();
    for w in weapons {
        if seen.insert(w.name.clone(), ()).is_some() {
            return Err(ContentError::DuplicateWeapon(w.name.clone()));
        }
        if !w.swing && !w.thrust {
            return Err(ContentError::UselessWeapon(w.name.clone()));
        }
    }
    Ok(())
}

// === TOML document schema ===
//
// Raw shapes mirror what content files actually say; conversion into the
// internal types happens here so the rest of the crate never sees TOML.

#[derive(Deserialize)]
struct ContentDoc {
    #[serde(default)]
    cards: Vec<CardDoc>,
    #[serde(default)]
    weapons: Vec<WeaponProfile>,
}

#[derive(Deserialize)]
struct CardDoc {
    name: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    stamina_cost: f32,
    #[serde(default)]
    time_cost: f32,
    #[serde(default)]
    focus_cost: f32,
    #[serde(default)]
    cooldown: u32,
    technique: Option<TechniqueDoc>,
    modify_play: Option<ModifyPlay>,
    #[serde(default)]
    predicates: Vec<PredicateDoc>,
}

impl CardDoc {
    fn into_template(self) -> std::result::Result<Template, ContentError> {
        let mut tags = CardTags::empty();
        for tag in &self.tags {
            match tag.as_str() {
                "offensive" => tags |= CardTags::OFFENSIVE,
                "defensive" => tags |= CardTags::DEFENSIVE,
                "modifier" => tags |= CardTags::MODIFIER,
                other => {
                    return Err(ContentError::Malformed(format!(
                        "{}: unknown tag '{}'",
                        self.name, other
                    )))
                }
            }
        }
        let predicates = self
            .predicates
            .into_iter()
            .map(|p| p.into_predicate(&self.name))
            .collect::<std::result::Result<Vec<_>, ContentError>>()?;
        Ok(Template {
            name: self.name,
            tags,
            stamina_cost: self.stamina_cost,
            time_cost: self.time_cost,
            focus_cost: self.focus_cost,
            cooldown: self.cooldown,
            technique: self.technique.map(TechniqueDoc::into_technique),
            modify_play: self.modify_play,
            predicates,
        })
    }
}

#[derive(Deserialize)]
struct TechniqueDoc {
    attack_mode: Option<AttackMode>,
    target_height: Option<Height>,
    secondary_height: Option<Height>,
    guard_height: Option<Height>,
    #[serde(default)]
    covers_adjacent: bool,
    #[serde(default)]
    difficulty: f32,
    #[serde(default)]
    channels: Vec<String>,
    #[serde(default)]
    damage: Vec<DamageInstance>,
    scaling: Option<ScalingDoc>,
    #[serde(default = "one")]
    parry_mult: f32,
    #[serde(default = "one")]
    block_mult: f32,
    #[serde(default = "one")]
    deflect_mult: f32,
    defense: Option<DefenseKind>,
    #[serde(default)]
    overlay_hit_bonus: f32,
    #[serde(default = "one")]
    overlay_damage_mult: f32,
    #[serde(default)]
    advantage: OutcomeAdvantage,
}

fn one() -> f32 {
    1.0
}

impl TechniqueDoc {
    fn into_technique(self) -> Technique {
        let mut channels = Channels::empty();
        for c in &self.channels {
            match c.as_str() {
                "weapon" => channels |= Channels::WEAPON,
                "off_hand" => channels |= Channels::OFF_HAND,
                "footwork" => channels |= Channels::FOOTWORK,
                // Unknown channel names fall out in validation as
                // NoChannels when nothing matched
                _ => {}
            }
        }
        Technique {
            attack_mode: self.attack_mode,
            target_height: self.target_height,
            secondary_height: self.secondary_height,
            guard_height: self.guard_height,
            covers_adjacent: self.covers_adjacent,
            difficulty: self.difficulty,
            channels,
            damage: self.damage,
            scaling: self.scaling.map(ScalingDoc::into_scaling).unwrap_or_default(),
            parry_mult: self.parry_mult,
            block_mult: self.block_mult,
            deflect_mult: self.deflect_mult,
            defense: self.defense,
            overlay_hit_bonus: self.overlay_hit_bonus,
            overlay_damage_mult: self.overlay_damage_mult,
            advantage: self.advantage,
        }
    }
}

#[derive(Deserialize)]
struct ScalingDoc {
    #[serde(default = "one")]
    ratio: f32,
    stat: Option<StatKind>,
    average: Option<[StatKind; 2]>,
}

impl ScalingDoc {
    fn into_scaling(self) -> StatScaling {
        let source = match (self.stat, self.average) {
            (_, Some([a, b])) => ScalingSource::Average(a, b),
            (Some(stat), None) => ScalingSource::Stat(stat),
            (None, None) => ScalingSource::Stat(StatKind::Power),
        };
        StatScaling {
            ratio: self.ratio,
            source,
        }
    }
}

#[derive(Deserialize)]
struct PredicateDoc {
    kind: String,
    axis: Option<AdvantageAxis>,
    value: Option<f32>,
    range: Option<RangeBand>,
    template: Option<String>,
}

impl PredicateDoc {
    fn into_predicate(self, card: &str) -> std::result::Result<Predicate, ContentError> {
        match self.kind.as_str() {
            "requires_swing" => Ok(Predicate::RequiresSwing),
            "requires_thrust" => Ok(Predicate::RequiresThrust),
            "min_advantage" => Ok(Predicate::MinAdvantage {
                axis: self.axis.unwrap_or(AdvantageAxis::Pressure),
                value: self.value.unwrap_or(0.0),
            }),
            "range_at_most" => Ok(Predicate::RangeAtMost(
                self.range.unwrap_or(RangeBand::Long),
            )),
            "played_last_turn" => self
                .template
                .map(Predicate::PlayedLastTurn)
                .ok_or_else(|| {
                    ContentError::Malformed(format!(
                        "{}: played_last_turn needs a template name",
                        card
                    ))
                }),
            other => Err(ContentError::Malformed(format!(
                "{}: unknown predicate '{}'",
                card, other
            ))),
        }
    }
}
