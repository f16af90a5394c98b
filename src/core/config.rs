//! Engine configuration with documented constants
//!
//! The tuning numbers the resolution pipeline consumes are collected here
//! with explanations of their purpose and how they interact. Capacity
//! bounds (timeline slots, modifier stack, turn history) are deliberately
//! NOT configurable: they are gameplay constraints enforced by fixed-size
//! buffers in the scheduler.

/// Tunable constants for one encounter
///
/// These values have been tuned so a typical exchange between equal
/// fighters lands in the 35-65% hit range before stakes and advantage.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // === TURN STRUCTURE ===
    /// Cards drawn up to at the start of each turn
    pub hand_size: usize,

    /// Flat focus fee for every commit-phase operation
    ///
    /// Spent immediately (never held); the first stack of a turn pays it
    /// once, later stacks pay only their card's own focus cost.
    pub commit_focus_fee: f32,

    // === HIT CHANCE PIPELINE ===
    /// Starting point before any modifier applies
    pub base_hit_chance: f32,

    /// Final clamp: even a hopeless swing can land, even a perfect
    /// one can fail
    pub hit_chance_min: f32,
    pub hit_chance_max: f32,

    /// Scales technique difficulty into a hit-chance penalty
    pub difficulty_factor: f32,

    /// Scales weapon accuracy into a hit-chance bonus
    pub accuracy_factor: f32,

    /// Scales the defender's weapon parry stat into a penalty
    pub parry_factor: f32,

    /// Scales the mean engagement advantage (centered on 0) into a
    /// signed hit-chance term
    pub advantage_factor: f32,

    /// Scales attacker balance (centered on 0.5) into a hit-chance term
    pub balance_factor: f32,

    /// Defender balance below this grants the attacker a flat bonus
    pub low_balance_threshold: f32,
    pub low_balance_penalty: f32,

    // === GUARD COVERAGE ===
    /// Attack height exactly matches the defender's guard
    pub coverage_direct: f32,

    /// Attack height adjacent to a guard that covers adjacent lines
    pub coverage_adjacent: f32,

    /// Attack arrives at an unguarded opening
    pub coverage_open: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hand_size: 5,
            commit_focus_fee: 1.0,

            base_hit_chance: 0.5,
            hit_chance_min: 0.05,
            hit_chance_max: 0.95,
            difficulty_factor: 0.1,
            accuracy_factor: 0.1,
            parry_factor: 0.1,
            advantage_factor: 0.3,
            balance_factor: 0.2,
            low_balance_threshold: 0.35,
            low_balance_penalty: 0.1,

            coverage_direct: -0.15,
            coverage_adjacent: -0.08,
            coverage_open: 0.05,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.hit_chance_min >= self.hit_chance_max {
            return Err(format!(
                "hit_chance_min ({}) must be < hit_chance_max ({})",
                self.hit_chance_min, self.hit_chance_max
            ));
        }

        if !(0.0..=1.0).contains(&self.base_hit_chance) {
            return Err(format!(
                "base_hit_chance ({}) must lie in [0, 1]",
                self.base_hit_chance
            ));
        }

        // Direct coverage should never help the attacker more than an
        // open line does
        if self.coverage_direct > self.coverage_open {
            return Err(format!(
                "coverage_direct ({}) must be <= coverage_open ({})",
                self.coverage_direct, self.coverage_open
            ));
        }

        if self.commit_focus_fee < 0.0 {
            return Err("commit_focus_fee must be non-negative".into());
        }

        if self.hand_size == 0 {
            return Err("hand_size must be at least 1".into());
        }

        Ok(())
    }
}
