//! Casualty tracking: wound capacity, damage state, and model loss.
//!
//! Wound capacity accounts for heterogeneous loadouts (a group of models
//! carrying a per-model wounds bonus is charged at its own rate). Model
//! loss is derived from an averaged per-model figure, not an exact
//! per-model ledger; the average is only used for that estimate.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::UnitDefinition;
use crate::modifier::{Modifier, ModifierOp, ModifierScope, StatKey};
use crate::roster::RosterEntry;

/// Damage state of one wound pool.
///
/// The legacy persistence format overloads a nullable current-wounds
/// value: absent means "at full, unmodified capacity", never zero. The
/// tagged form keeps that distinction explicit in code while serializing
/// back to the nullable sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<i32>", into = "Option<i32>")]
pub enum WoundState {
    /// Undamaged; current wounds equal whatever the pool's capacity is.
    #[default]
    Full,
    /// Damage has been tracked; the amount is clamped to capacity on read.
    Damaged(i32),
    /// No wounds remain.
    Destroyed,
}

impl From<Option<i32>> for WoundState {
    fn from(value: Option<i32>) -> Self {
        match value {
            None => Self::Full,
            Some(n) if n <= 0 => Self::Destroyed,
            Some(n) => Self::Damaged(n),
        }
    }
}

impl From<WoundState> for Option<i32> {
    fn from(state: WoundState) -> Self {
        match state {
            WoundState::Full => None,
            WoundState::Damaged(n) => Some(n),
            WoundState::Destroyed => Some(0),
        }
    }
}

impl WoundState {
    /// Current wounds remaining, clamped to `[0, total]`.
    #[must_use]
    pub fn current(self, total: i32) -> i32 {
        match self {
            Self::Full => total,
            Self::Damaged(n) => n.clamp(0, total),
            Self::Destroyed => 0,
        }
    }

    /// Apply damage, floored at zero. Non-positive amounts and damage to
    /// an already-destroyed pool are no-ops. Damage never re-snaps the
    /// pool to `Full`.
    #[must_use]
    pub fn apply_damage(self, total: i32, amount: i32) -> WoundState {
        if amount <= 0 {
            return self;
        }
        let current = self.current(total);
        if current <= 0 {
            return self;
        }
        let remaining = (current - amount).max(0);
        if remaining == 0 {
            Self::Destroyed
        } else {
            Self::Damaged(remaining)
        }
    }

    /// Heal, capped at capacity. Non-positive amounts and healing a pool
    /// already at capacity are no-ops. Reaching the cap normalizes back
    /// to `Full` rather than storing the numeric total.
    #[must_use]
    pub fn heal(self, total: i32, amount: i32) -> WoundState {
        if amount <= 0 {
            return self;
        }
        let current = self.current(total);
        if current >= total {
            return self;
        }
        let healed = current.saturating_add(amount);
        if healed >= total {
            Self::Full
        } else {
            Self::Damaged(healed)
        }
    }
}

/// Wound capacity of a unit, accounting for heterogeneous loadouts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnitWoundProfile {
    pub total: i32,
    /// Average wounds per model, used only for model-loss estimation.
    pub per_model: f64,
}

/// Sum the per-model wounds delta contributed by a modifier list.
/// Only additive `model`-scope wounds modifiers count.
#[must_use]
pub fn wounds_delta(modifiers: &[Modifier]) -> f64 {
    modifiers
        .iter()
        .filter(|m| m.stat == StatKey::Wounds && m.scope == ModifierScope::Model)
        .map(|m| match m.op {
            ModifierOp::Add => m.value,
            ModifierOp::Subtract => -m.value,
            _ => 0.0,
        })
        .sum()
}

/// Per-model wounds delta granted by an entry's own selected enhancement.
/// Missing enhancement or detachment ids contribute zero.
#[must_use]
pub fn enhancement_wounds_delta(
    catalog: &crate::catalog::Catalog,
    detachment_id: &str,
    entry: &RosterEntry,
) -> f64 {
    entry
        .enhancement
        .as_deref()
        .and_then(|id| catalog.enhancement(detachment_id, id))
        .map(|enhancement| wounds_delta(&enhancement.modifiers))
        .unwrap_or(0.0)
}

/// Compute total wound capacity for a roster entry.
///
/// Each loadout group carrying a per-model wounds delta charges its
/// equipped models at `base + enhancement_delta + group_delta`; remaining
/// models are charged `base + enhancement_delta`. A group declared by
/// several weapon profiles is counted once.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn unit_wound_profile(
    definition: &UnitDefinition,
    entry: &RosterEntry,
    enhancement_delta: f64,
) -> UnitWoundProfile {
    let base = definition.stats.wounds.magnitude().unwrap_or(0.0) + enhancement_delta;

    let mut total = 0.0;
    let mut remaining = entry.models;
    let mut seen: SmallVec<[&str; 4]> = SmallVec::new();
    for weapon in &definition.weapons {
        let Some(group) = weapon.loadout_group.as_deref() else {
            continue;
        };
        if seen.contains(&group) {
            continue;
        }
        seen.push(group);

        let delta = wounds_delta(&weapon.modifiers);
        if delta == 0.0 {
            continue;
        }
        let equipped = entry.loadout.get(group).copied().unwrap_or(0).min(remaining);
        if equipped == 0 {
            continue;
        }
        remaining -= equipped;
        total += f64::from(equipped) * (base + delta);
    }
    total += f64::from(remaining) * base;

    let total = total.round().max(0.0) as i32;
    let per_model = if entry.models > 0 {
        f64::from(total) / f64::from(entry.models)
    } else {
        0.0
    };
    UnitWoundProfile { total, per_model }
}

/// Derived damage view of one wound pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WoundTrackingState {
    pub total: i32,
    pub current: i32,
    pub taken: i32,
    pub models: u32,
    pub models_alive: u32,
    /// Average wounds per model backing the model-loss estimate.
    pub per_model: f64,
    pub state: WoundState,
}

/// Leader pools are tracked with the same shape as unit pools.
pub type LeaderWoundTrackingState = WoundTrackingState;

/// Build the derived view for a pool.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn track(profile: UnitWoundProfile, models: u32, state: WoundState) -> WoundTrackingState {
    let current = state.current(profile.total);
    let taken = profile.total - current;
    let lost = if profile.per_model > 0.0 {
        (f64::from(taken) / profile.per_model).floor() as u32
    } else {
        0
    };
    WoundTrackingState {
        total: profile.total,
        current,
        taken,
        models,
        models_alive: models.saturating_sub(lost),
        per_model: profile.per_model,
        state,
    }
}

/// Unit and leader pools summed for display. Performs no validation of
/// its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedWoundState {
    pub total: i32,
    pub current: i32,
    pub taken: i32,
    pub models: u32,
    pub models_alive: u32,
}

impl CombinedWoundState {
    /// Sum a unit pool with an optional leader pool.
    #[must_use]
    pub fn combine(unit: &WoundTrackingState, leader: Option<&WoundTrackingState>) -> Self {
        let mut combined = Self {
            total: unit.total,
            current: unit.current,
            taken: unit.taken,
            models: unit.models,
            models_alive: unit.models_alive,
        };
        if let Some(leader) = leader {
            combined.total += leader.total;
            combined.current += leader.current;
            combined.taken += leader.taken;
            combined.models += leader.models;
            combined.models_alive += leader.models_alive;
        }
        combined
    }
}
