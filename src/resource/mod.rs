//! Two-phase resource accounting
//!
//! `commit` places a reversible hold (selection phase: the player may still
//! change their mind); `spend` is immediate and final (commit-phase focus);
//! `finalize` collapses `current` down to `available` at the point of no
//! return. Regeneration happens once per turn via `tick`.

/// A resource pool distinguishing held from spent amounts
///
/// Invariant: `available <= current <= max` at all times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resource {
    /// What the agent actually has
    pub current: f32,
    /// What is not yet reserved by a pending selection
    pub available: f32,
    pub max: f32,
    /// Restored by `tick`, capped at `max`
    pub regen: f32,
}

/// A commit or spend that exceeds the available amount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shortfall {
    pub need: f32,
    pub available: f32,
}

impl Resource {
    pub fn new(max: f32, regen: f32) -> Self {
        Self {
            current: max,
            available: max,
            max,
            regen,
        }
    }

    pub fn can_commit(&self, amount: f32) -> bool {
        amount <= self.available
    }

    /// Place a reversible hold: reduces `available`, leaves `current`
    pub fn commit(&mut self, amount: f32) -> Result<(), Shortfall> {
        if amount > self.available {
            return Err(Shortfall {
                need: amount,
                available: self.available,
            });
        }
        self.available -= amount;
        Ok(())
    }

    /// Release a hold placed by `commit`
    pub fn uncommit(&mut self, amount: f32) {
        self.available = (self.available + amount).min(self.current);
    }

    /// Immediately and irreversibly consume the amount
    pub fn spend(&mut self, amount: f32) -> Result<(), Shortfall> {
        if amount > self.available {
            return Err(Shortfall {
                need: amount,
                available: self.available,
            });
        }
        self.available -= amount;
        self.current -= amount;
        Ok(())
    }

    /// Give back a spent or finalized amount (commit-phase withdraw)
    pub fn refund(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
        self.available = (self.available + amount).min(self.current);
    }

    /// Point of no return: holds become real expenditure
    pub fn finalize(&mut self) {
        self.current = self.available;
    }

    /// Per-turn regeneration; clears any leftover holds
    pub fn tick(&mut self) {
        self.current = (self.current + self.regen).min(self.max);
        self.available = self.current;
    }
}

/// The three pools every agent carries
///
/// Time maxes at 1.0 (the tick domain) and fully regenerates each turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentResources {
    pub stamina: Resource,
    pub focus: Resource,
    pub time: Resource,
}

impl AgentResources {
    pub fn new(stamina_max: f32, stamina_regen: f32, focus_max: f32, focus_regen: f32) -> Self {
        Self {
            stamina: Resource::new(stamina_max, stamina_regen),
            focus: Resource::new(focus_max, focus_regen),
            time: Resource::new(1.0, 1.0),
        }
    }

    pub fn tick(&mut self) {
        self.stamina.tick();
        self.focus.tick();
        self.time.tick();
    }

    /// Collapse all selection-phase holds at the end of selection
    pub fn finalize(&mut self) {
        self.stamina.finalize();
        self.time.finalize();
    }
}
