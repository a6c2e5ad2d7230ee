//! Caller-facing facade over collection, evaluation, and casualty
//! tracking.
//!
//! Every function here is a pure projection of (catalog, roster,
//! context); mutation entry points compute what the new wound value
//! should be and defer the actual write to a [`WoundStore`], which is
//! only invoked when the value actually changes.

use crate::catalog::Catalog;
use crate::collect::collect_modifiers;
use crate::modifier::StatKey;
use crate::roster::{EntryId, GameContext, Roster};
use crate::stats::{ModifiedStats, modified_value};
use crate::wounds::{
    CombinedWoundState, LeaderWoundTrackingState, UnitWoundProfile, WoundState,
    WoundTrackingState, enhancement_wounds_delta, track, unit_wound_profile,
};

/// Persistence seam the external store implements. The engine never
/// writes roster state itself.
pub trait WoundStore {
    fn set_unit_wounds(&mut self, entry: EntryId, value: WoundState);
    fn set_leader_wounds(&mut self, entry: EntryId, value: WoundState);
}

/// Effective characteristics for one roster entry, or `None` when its
/// unit definition cannot be resolved.
#[must_use]
pub fn modified_stats(
    catalog: &Catalog,
    roster: &Roster,
    entry_id: EntryId,
    detachment_id: &str,
    context: Option<&GameContext>,
) -> Option<ModifiedStats> {
    let entry = roster.entry(entry_id)?;
    let definition = catalog.unit(&entry.unit)?;
    let collected = collect_modifiers(catalog, roster, entry_id, detachment_id, context);
    Some(ModifiedStats::evaluate(&definition.stats, &collected))
}

fn unit_profile(
    catalog: &Catalog,
    roster: &Roster,
    entry_id: EntryId,
    detachment_id: &str,
) -> Option<(UnitWoundProfile, u32, WoundState)> {
    let entry = roster.entry(entry_id)?;
    let definition = catalog.unit(&entry.unit)?;
    let delta = enhancement_wounds_delta(catalog, detachment_id, entry);
    Some((
        unit_wound_profile(definition, entry, delta),
        entry.models,
        entry.wounds,
    ))
}

/// The leader's wound capacity comes from its own evaluated wounds
/// characteristic, so its enhancement and gear are inherited.
#[allow(clippy::cast_possible_truncation)]
fn leader_profile(
    catalog: &Catalog,
    roster: &Roster,
    entry_id: EntryId,
    detachment_id: &str,
) -> Option<(UnitWoundProfile, u32, WoundState)> {
    let entry = roster.entry(entry_id)?;
    let leader_id = entry.attached_leader?;
    let leader_entry = roster.entry(leader_id)?;
    let leader_def = catalog.unit(&leader_entry.unit)?;

    let collected = collect_modifiers(catalog, roster, leader_id, detachment_id, None);
    let wounds = modified_value(StatKey::Wounds, leader_def.stats.wounds, &collected);
    let per_model = wounds.magnitude().unwrap_or(0.0);
    let total = (per_model * f64::from(leader_entry.models)).round().max(0.0) as i32;
    Some((
        UnitWoundProfile { total, per_model },
        leader_entry.models,
        entry.leader_wounds,
    ))
}

/// Wound tracking state of the unit's own pool.
#[must_use]
pub fn unit_wound_state(
    catalog: &Catalog,
    roster: &Roster,
    entry_id: EntryId,
    detachment_id: &str,
) -> Option<WoundTrackingState> {
    let (profile, models, state) = unit_profile(catalog, roster, entry_id, detachment_id)?;
    Some(track(profile, models, state))
}

/// Wound tracking state of the attached leader's pool, if any.
#[must_use]
pub fn leader_wound_state(
    catalog: &Catalog,
    roster: &Roster,
    entry_id: EntryId,
    detachment_id: &str,
) -> Option<LeaderWoundTrackingState> {
    let (profile, models, state) = leader_profile(catalog, roster, entry_id, detachment_id)?;
    Some(track(profile, models, state))
}

/// Unit and leader pools summed for display.
#[must_use]
pub fn combined_wound_state(
    catalog: &Catalog,
    roster: &Roster,
    entry_id: EntryId,
    detachment_id: &str,
) -> Option<CombinedWoundState> {
    let unit = unit_wound_state(catalog, roster, entry_id, detachment_id)?;
    let leader = leader_wound_state(catalog, roster, entry_id, detachment_id);
    Some(CombinedWoundState::combine(&unit, leader.as_ref()))
}

fn commit_unit(
    entry_id: EntryId,
    old: WoundState,
    new: WoundState,
    store: &mut impl WoundStore,
) -> WoundState {
    if new != old {
        store.set_unit_wounds(entry_id, new);
    }
    new
}

fn commit_leader(
    entry_id: EntryId,
    old: WoundState,
    new: WoundState,
    store: &mut impl WoundStore,
) -> WoundState {
    if new != old {
        store.set_leader_wounds(entry_id, new);
    }
    new
}

/// Apply damage to the unit pool. Returns the resulting state, or `None`
/// when the entry or its unit cannot be resolved. The store is only
/// invoked when the value changes.
pub fn apply_unit_damage(
    catalog: &Catalog,
    roster: &Roster,
    entry_id: EntryId,
    detachment_id: &str,
    amount: i32,
    store: &mut impl WoundStore,
) -> Option<WoundState> {
    let (profile, _, state) = unit_profile(catalog, roster, entry_id, detachment_id)?;
    let new = state.apply_damage(profile.total, amount);
    Some(commit_unit(entry_id, state, new, store))
}

/// Heal the unit pool, normalizing to full health at the cap.
pub fn heal_unit(
    catalog: &Catalog,
    roster: &Roster,
    entry_id: EntryId,
    detachment_id: &str,
    amount: i32,
    store: &mut impl WoundStore,
) -> Option<WoundState> {
    let (profile, _, state) = unit_profile(catalog, roster, entry_id, detachment_id)?;
    let new = state.heal(profile.total, amount);
    Some(commit_unit(entry_id, state, new, store))
}

/// Reset the unit pool to full health.
pub fn reset_unit(
    roster: &Roster,
    entry_id: EntryId,
    store: &mut impl WoundStore,
) -> Option<WoundState> {
    let state = roster.entry(entry_id)?.wounds;
    Some(commit_unit(entry_id, state, WoundState::Full, store))
}

/// Apply damage to the attached leader's pool.
pub fn apply_leader_damage(
    catalog: &Catalog,
    roster: &Roster,
    entry_id: EntryId,
    detachment_id: &str,
    amount: i32,
    store: &mut impl WoundStore,
) -> Option<WoundState> {
    let (profile, _, state) = leader_profile(catalog, roster, entry_id, detachment_id)?;
    let new = state.apply_damage(profile.total, amount);
    Some(commit_leader(entry_id, state, new, store))
}

/// Heal the attached leader's pool.
pub fn heal_leader(
    catalog: &Catalog,
    roster: &Roster,
    entry_id: EntryId,
    detachment_id: &str,
    amount: i32,
    store: &mut impl WoundStore,
) -> Option<WoundState> {
    let (profile, _, state) = leader_profile(catalog, roster, entry_id, detachment_id)?;
    let new = state.heal(profile.total, amount);
    Some(commit_leader(entry_id, state, new, store))
}

/// Reset the attached leader's pool to full health.
pub fn reset_leader(
    roster: &Roster,
    entry_id: EntryId,
    store: &mut impl WoundStore,
) -> Option<WoundState> {
    let entry = roster.entry(entry_id)?;
    entry.attached_leader?;
    Some(commit_leader(entry_id, entry.leader_wounds, WoundState::Full, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        DetachmentDefinition, Enhancement, UnitAbility, UnitDefinition, UnitStats, WeaponProfile,
    };
    use crate::modifier::{Modifier, ModifierOp, ModifierScope};
    use crate::stats::StatValue;

    #[derive(Default)]
    struct RecordingStore {
        unit_writes: Vec<(EntryId, WoundState)>,
        leader_writes: Vec<(EntryId, WoundState)>,
    }

    impl WoundStore for RecordingStore {
        fn set_unit_wounds(&mut self, entry: EntryId, value: WoundState) {
            self.unit_writes.push((entry, value));
        }

        fn set_leader_wounds(&mut self, entry: EntryId, value: WoundState) {
            self.leader_writes.push((entry, value));
        }
    }

    fn wounds_modifier(value: f64) -> Modifier {
        Modifier {
            stat: StatKey::Wounds,
            op: ModifierOp::Add,
            value,
            scope: ModifierScope::Model,
            source: None,
            condition: None,
        }
    }

    fn test_catalog() -> Catalog {
        Catalog {
            units: vec![
                UnitDefinition {
                    id: "squad".to_string(),
                    name: "Squad".to_string(),
                    stats: UnitStats {
                        wounds: StatValue::Numeric(3.0),
                        save: StatValue::Threshold(3),
                        ..UnitStats::default()
                    },
                    invulnerable_save: None,
                    weapons: vec![WeaponProfile {
                        name: "Shield generator".to_string(),
                        loadout_group: Some("shield".to_string()),
                        modifiers: vec![wounds_modifier(1.0)],
                        keywords: Vec::new(),
                    }],
                    abilities: Vec::new(),
                    keywords: Vec::new(),
                },
                UnitDefinition {
                    id: "captain".to_string(),
                    name: "Captain".to_string(),
                    stats: UnitStats {
                        wounds: StatValue::Numeric(5.0),
                        ..UnitStats::default()
                    },
                    invulnerable_save: None,
                    weapons: Vec::new(),
                    abilities: vec![UnitAbility {
                        name: "Leader".to_string(),
                        desc: String::new(),
                        loadout_group: None,
                        leads: vec!["squad".to_string()],
                    }],
                    keywords: Vec::new(),
                },
            ],
            detachments: vec![DetachmentDefinition {
                id: "taskforce".to_string(),
                name: "Task Force".to_string(),
                enhancements: vec![Enhancement {
                    id: "relic_plate".to_string(),
                    name: "Relic Plate".to_string(),
                    desc: String::new(),
                    modifiers: vec![wounds_modifier(2.0)],
                }],
                stratagems: Vec::new(),
                rules: Vec::new(),
            }],
            ..Catalog::empty()
        }
    }

    #[test]
    fn enhancement_and_weapon_stack_onto_wounds() {
        let catalog = test_catalog();
        let mut roster = Roster::new();
        let squad = roster.add_unit("squad", 1);
        roster
            .set_enhancement(squad, Some("relic_plate".to_string()))
            .unwrap();
        roster.set_loadout_count(squad, "shield", 1).unwrap();

        let stats = modified_stats(&catalog, &roster, squad, "taskforce", None).unwrap();
        assert_eq!(stats.wounds.base, StatValue::Numeric(3.0));
        assert_eq!(stats.wounds.modified, StatValue::Numeric(6.0));
        assert!(stats.wounds.has_modifier);
        assert!(!stats.save.has_modifier);
    }

    #[test]
    fn damage_and_heal_round_trip_through_the_store() {
        let catalog = test_catalog();
        let mut roster = Roster::new();
        let squad = roster.add_unit("squad", 5);

        let mut store = RecordingStore::default();
        let state = apply_unit_damage(&catalog, &roster, squad, "taskforce", 999, &mut store);
        assert_eq!(state, Some(WoundState::Destroyed));
        assert_eq!(store.unit_writes, vec![(squad, WoundState::Destroyed)]);

        roster.set_unit_wounds(squad, WoundState::Destroyed).unwrap();
        let healed = heal_unit(&catalog, &roster, squad, "taskforce", 999, &mut store);
        assert_eq!(healed, Some(WoundState::Full));
        assert_eq!(store.unit_writes.last(), Some(&(squad, WoundState::Full)));
    }

    #[test]
    fn non_positive_amounts_never_touch_the_store() {
        let catalog = test_catalog();
        let mut roster = Roster::new();
        let squad = roster.add_unit("squad", 5);
        roster.set_unit_wounds(squad, WoundState::Damaged(7)).unwrap();

        let mut store = RecordingStore::default();
        apply_unit_damage(&catalog, &roster, squad, "taskforce", -5, &mut store);
        apply_unit_damage(&catalog, &roster, squad, "taskforce", 0, &mut store);
        heal_unit(&catalog, &roster, squad, "taskforce", -5, &mut store);
        assert!(store.unit_writes.is_empty());

        // Healing at full health is also a silent no-op.
        roster.set_unit_wounds(squad, WoundState::Full).unwrap();
        heal_unit(&catalog, &roster, squad, "taskforce", 5, &mut store);
        assert!(store.unit_writes.is_empty());
    }

    #[test]
    fn leader_pool_is_independent_of_the_unit_pool() {
        let catalog = test_catalog();
        let mut roster = Roster::new();
        let squad = roster.add_unit("squad", 5);
        let captain = roster.add_unit("captain", 1);
        roster.attach_leader(squad, captain, &catalog).unwrap();
        roster
            .set_enhancement(captain, Some("relic_plate".to_string()))
            .unwrap();

        // Leader total inherits the captain's own enhancement: 5 + 2.
        let leader = leader_wound_state(&catalog, &roster, squad, "taskforce").unwrap();
        assert_eq!(leader.total, 7);

        let mut store = RecordingStore::default();
        apply_leader_damage(&catalog, &roster, squad, "taskforce", 3, &mut store);
        assert_eq!(store.leader_writes, vec![(squad, WoundState::Damaged(4))]);
        assert!(store.unit_writes.is_empty());

        let unit = unit_wound_state(&catalog, &roster, squad, "taskforce").unwrap();
        assert_eq!(unit.current, 15);
    }

    #[test]
    fn combined_state_sums_for_display() {
        let catalog = test_catalog();
        let mut roster = Roster::new();
        let squad = roster.add_unit("squad", 5);
        let captain = roster.add_unit("captain", 1);
        roster.attach_leader(squad, captain, &catalog).unwrap();
        roster.set_unit_wounds(squad, WoundState::Damaged(10)).unwrap();

        let combined = combined_wound_state(&catalog, &roster, squad, "taskforce").unwrap();
        assert_eq!(combined.total, 20);
        assert_eq!(combined.current, 15);
        assert_eq!(combined.models, 6);
    }

    #[test]
    fn reset_restores_the_sentinel() {
        let catalog = test_catalog();
        let mut roster = Roster::new();
        let squad = roster.add_unit("squad", 5);
        roster.set_unit_wounds(squad, WoundState::Damaged(2)).unwrap();

        let mut store = RecordingStore::default();
        assert_eq!(reset_unit(&roster, squad, &mut store), Some(WoundState::Full));
        assert_eq!(store.unit_writes, vec![(squad, WoundState::Full)]);

        // Unknown entries resolve to None without touching the store.
        assert!(apply_unit_damage(&catalog, &roster, EntryId(42), "taskforce", 5, &mut store).is_none());
        assert_eq!(store.unit_writes.len(), 1);
    }

    #[test]
    fn reset_leader_restores_the_sentinel() {
        let catalog = test_catalog();
        let mut roster = Roster::new();
        let squad = roster.add_unit("squad", 5);
        let captain = roster.add_unit("captain", 1);
        roster.attach_leader(squad, captain, &catalog).unwrap();
        roster
            .set_leader_wounds(squad, WoundState::Damaged(2))
            .unwrap();

        let mut store = RecordingStore::default();
        assert_eq!(
            reset_leader(&roster, squad, &mut store),
            Some(WoundState::Full)
        );
        assert_eq!(store.leader_writes, vec![(squad, WoundState::Full)]);
        assert!(store.unit_writes.is_empty());

        // Without an attached leader there is no pool to reset.
        assert!(reset_leader(&roster, captain, &mut store).is_none());
        assert_eq!(store.leader_writes.len(), 1);
    }
}
