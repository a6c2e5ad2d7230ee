//! Modifier vocabulary shared by the catalog and the collection pipeline.
use serde::{Deserialize, Serialize};

use crate::conditions::ConditionKind;

/// Characteristic keys a modifier can target.
///
/// Catalog data occasionally carries weapon-profile keys this engine never
/// evaluates (attacks, strength, and so on); those deserialize to `Other`
/// instead of failing the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    Movement,
    Toughness,
    Save,
    Wounds,
    Leadership,
    ObjectiveControl,
    #[serde(other)]
    Other,
}

impl StatKey {
    /// The unit characteristics evaluated by the stat pipeline, in display order.
    pub const CHARACTERISTICS: [StatKey; 6] = [
        StatKey::Movement,
        StatKey::Toughness,
        StatKey::Save,
        StatKey::Wounds,
        StatKey::Leadership,
        StatKey::ObjectiveControl,
    ];
}

/// Arithmetic applied by a modifier. Unknown operations deserialize to
/// `Unknown` and leave the running value untouched when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierOp {
    Add,
    Subtract,
    Multiply,
    Set,
    #[serde(other)]
    Unknown,
}

impl ModifierOp {
    /// Apply this operation to a running value.
    #[must_use]
    pub fn apply(self, current: f64, value: f64) -> f64 {
        match self {
            Self::Add => current + value,
            Self::Subtract => current - value,
            Self::Multiply => current * value,
            Self::Set => value,
            Self::Unknown => current,
        }
    }
}

/// Breadth over which a modifier applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModifierScope {
    #[default]
    Model,
    Unit,
    Melee,
    Ranged,
    Weapon,
    All,
}

impl ModifierScope {
    /// Whether the modifier feeds unit-characteristic evaluation.
    /// Weapon-profile scopes never do.
    #[must_use]
    pub fn affects_unit(self) -> bool {
        matches!(self, Self::Model | Self::Unit | Self::All)
    }

    /// Whether the modifier crosses from an attached leader onto the unit
    /// it leads. `model` stays on the wearer.
    #[must_use]
    pub fn propagates_from_leader(self) -> bool {
        matches!(self, Self::Unit | Self::All)
    }
}

/// A single rule-based stat modification as it appears in catalog data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub stat: StatKey,
    pub op: ModifierOp,
    pub value: f64,
    #[serde(default)]
    pub scope: ModifierScope,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub condition: Option<ConditionKind>,
}

/// What kind of source contributed a collected modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Enhancement,
    Weapon,
    Leader,
    LeaderEnhancement,
    Stratagem,
    DetachmentRule,
    Stance,
    MissionTwist,
}

/// A modifier plus the provenance it was collected under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedModifier {
    pub modifier: Modifier,
    /// Display label of the contributing source.
    pub source: String,
    pub kind: SourceKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_stat_key_deserializes_to_other() {
        let key: StatKey = serde_json::from_str("\"attacks\"").unwrap();
        assert_eq!(key, StatKey::Other);
    }

    #[test]
    fn unknown_op_is_ignored_when_applied() {
        let op: ModifierOp = serde_json::from_str("\"halve\"").unwrap();
        assert_eq!(op, ModifierOp::Unknown);
        assert!((op.apply(7.0, 3.0) - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn weapon_scopes_do_not_affect_unit_stats() {
        assert!(ModifierScope::Model.affects_unit());
        assert!(ModifierScope::Unit.affects_unit());
        assert!(ModifierScope::All.affects_unit());
        assert!(!ModifierScope::Melee.affects_unit());
        assert!(!ModifierScope::Ranged.affects_unit());
        assert!(!ModifierScope::Weapon.affects_unit());
    }

    #[test]
    fn model_scope_stays_on_the_leader() {
        assert!(!ModifierScope::Model.propagates_from_leader());
        assert!(ModifierScope::Unit.propagates_from_leader());
        assert!(ModifierScope::All.propagates_from_leader());
    }

    #[test]
    fn modifier_deserializes_with_defaults() {
        let m: Modifier =
            serde_json::from_str(r#"{"stat":"wounds","op":"add","value":2}"#).unwrap();
        assert_eq!(m.scope, ModifierScope::Model);
        assert!(m.source.is_none());
        assert!(m.condition.is_none());
    }
}
