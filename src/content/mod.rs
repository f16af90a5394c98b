//! Content layer: immutable templates and their registry

pub mod registry;
pub mod template;

pub use registry::CardRegistry;
pub use template::{
    AttackMode, CardTags, Channels, DamageInstance, DamageKind, DefenseKind, ModifyPlay,
    OutcomeAdvantage, Predicate, ScalingSource, StatScaling, Technique, Template, TemplateId,
    WeaponProfile,
};
