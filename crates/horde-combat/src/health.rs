//! Hit-point counters.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// What a [`Health::take_damage`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Nothing changed (non-positive amount, invulnerable or already dead)
    Ignored,
    /// Hit points went down but are still above zero
    Damaged {
        /// Hit points left
        hp: i32,
    },
    /// Hit points reached zero with this hit
    Died,
}

/// Hit points with an optional invulnerability window after each hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    hp: i32,
    max_hp: i32,
    invulnerability_seconds: f32,
    invulnerable_for: f32,
}

impl Health {
    /// Creates a full health counter.
    ///
    /// `max_hp` is raised to at least 1.
    #[must_use]
    pub fn new(max_hp: i32, invulnerability_seconds: f32) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            hp: max_hp,
            max_hp,
            invulnerability_seconds: invulnerability_seconds.max(0.0),
            invulnerable_for: 0.0,
        }
    }

    /// Current hit points.
    #[must_use]
    pub const fn hp(&self) -> i32 {
        self.hp
    }

    /// Maximum hit points.
    #[must_use]
    pub const fn max_hp(&self) -> i32 {
        self.max_hp
    }

    /// Checks if dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Whether a hit was taken less than `invulnerability_seconds` ago.
    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_for > 0.0
    }

    /// Applies damage.
    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if amount <= 0 || self.is_dead() || self.is_invulnerable() {
            return DamageOutcome::Ignored;
        }

        self.hp = (self.hp - amount).max(0);
        if self.hp == 0 {
            return DamageOutcome::Died;
        }

        self.invulnerable_for = self.invulnerability_seconds;
        trace!(hp = self.hp, invulnerable_for = self.invulnerable_for, "damaged");
        DamageOutcome::Damaged { hp: self.hp }
    }

    /// Applies healing, clamped to the maximum. Dead counters stay dead.
    pub fn heal(&mut self, amount: i32) {
        if amount <= 0 || self.is_dead() {
            return;
        }
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
    }

    /// Counts the invulnerability window down.
    pub fn tick(&mut self, dt: f32) {
        if self.invulnerable_for > 0.0 && dt > 0.0 {
            self.invulnerable_for = (self.invulnerable_for - dt).max(0.0);
        }
    }
}
