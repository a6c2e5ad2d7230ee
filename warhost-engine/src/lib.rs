//! Warhost Roster Engine
//!
//! Platform-agnostic stat-modifier and casualty-tracking logic for the
//! Warhost roster builder. This crate derives a unit's effective combat
//! characteristics from its base datasheet and every active source of
//! rule-based modification (upgrades, loadout, attached leader,
//! stratagems, detachment rules, stances), and tracks damage across unit
//! and leader wound pools. It has no UI, no persistence, and no
//! randomness: identical inputs always produce identical outputs.

pub mod catalog;
pub mod collect;
pub mod conditions;
pub mod engine;
pub mod modifier;
pub mod roster;
pub mod stats;
pub mod wounds;

// Re-export commonly used types
pub use catalog::{
    ArmyRule, Catalog, DetachmentDefinition, DetachmentRule, Enhancement, RuleChoice, Stance,
    Stratagem, UnitAbility, UnitDefinition, UnitStats, WeaponProfile,
};
pub use collect::collect_modifiers;
pub use conditions::{ConditionKind, UnitConditionState, condition_met};
pub use engine::{
    WoundStore, apply_leader_damage, apply_unit_damage, combined_wound_state, heal_leader,
    heal_unit, leader_wound_state, modified_stats, reset_leader, reset_unit, unit_wound_state,
};
pub use modifier::{
    CollectedModifier, Modifier, ModifierOp, ModifierScope, SourceKind, StatKey,
};
pub use roster::{EntryId, GameContext, Roster, RosterEntry, RosterError};
pub use stats::{ModifiedStat, ModifiedStats, StatValue, evaluate_stat, modified_value};
pub use wounds::{
    CombinedWoundState, LeaderWoundTrackingState, UnitWoundProfile, WoundState,
    WoundTrackingState, enhancement_wounds_delta, track, unit_wound_profile, wounds_delta,
};
