//! Conditional-modifier gating.
//!
//! Some modifiers only apply while the unit is in a particular state
//! (below starting strength, carrying the warlord, and so on). Condition
//! keys are a closed set; anything else deserializes to `Unknown`, which
//! never evaluates true. An unrecognized condition must never silently
//! grant a bonus.

use serde::{Deserialize, Serialize};

use crate::wounds::WoundTrackingState;

/// Known condition keys a modifier may be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    BelowStartingStrength,
    BelowHalfStrength,
    Warlord,
    Damaged,
    #[serde(other)]
    Unknown,
}

/// Snapshot of the per-entry state conditions are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitConditionState {
    pub starting_models: u32,
    pub models_alive: u32,
    pub is_warlord: bool,
    pub wounds_taken: i32,
}

impl UnitConditionState {
    /// Derive the condition snapshot from a unit's wound tracking state.
    #[must_use]
    pub fn from_tracking(tracking: &WoundTrackingState, is_warlord: bool) -> Self {
        Self {
            starting_models: tracking.models,
            models_alive: tracking.models_alive,
            is_warlord,
            wounds_taken: tracking.taken,
        }
    }
}

/// Evaluate a modifier's condition against the unit's current state.
///
/// No condition means the modifier is unconditional. Unknown conditions
/// fail closed.
#[must_use]
pub fn condition_met(condition: Option<ConditionKind>, state: &UnitConditionState) -> bool {
    let Some(kind) = condition else {
        return true;
    };
    match kind {
        ConditionKind::BelowStartingStrength => state.models_alive < state.starting_models,
        ConditionKind::BelowHalfStrength => {
            u64::from(state.models_alive) * 2 < u64::from(state.starting_models)
        }
        ConditionKind::Warlord => state.is_warlord,
        ConditionKind::Damaged => state.wounds_taken > 0,
        ConditionKind::Unknown => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(starting: u32, alive: u32) -> UnitConditionState {
        UnitConditionState {
            starting_models: starting,
            models_alive: alive,
            is_warlord: false,
            wounds_taken: 0,
        }
    }

    #[test]
    fn absent_condition_is_unconditional() {
        assert!(condition_met(None, &state(5, 5)));
    }

    #[test]
    fn unknown_condition_fails_closed() {
        let parsed: ConditionKind = serde_json::from_str("\"while_charging\"").unwrap();
        assert_eq!(parsed, ConditionKind::Unknown);
        assert!(!condition_met(Some(parsed), &state(5, 0)));
    }

    #[test]
    fn below_starting_strength_tracks_model_loss() {
        let kind = Some(ConditionKind::BelowStartingStrength);
        assert!(!condition_met(kind, &state(5, 5)));
        assert!(condition_met(kind, &state(5, 4)));
    }

    #[test]
    fn below_half_strength_uses_strict_majority() {
        let kind = Some(ConditionKind::BelowHalfStrength);
        assert!(!condition_met(kind, &state(5, 3)));
        assert!(condition_met(kind, &state(5, 2)));
        assert!(!condition_met(kind, &state(4, 2)));
    }

    #[test]
    fn warlord_and_damaged_read_their_flags() {
        let mut s = state(3, 3);
        assert!(!condition_met(Some(ConditionKind::Warlord), &s));
        s.is_warlord = true;
        assert!(condition_met(Some(ConditionKind::Warlord), &s));

        assert!(!condition_met(Some(ConditionKind::Damaged), &s));
        s.wounds_taken = 1;
        assert!(condition_met(Some(ConditionKind::Damaged), &s));
    }
}
