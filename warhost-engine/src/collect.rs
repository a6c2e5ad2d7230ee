//! The modifier collection pipeline.
//!
//! Gathers every currently-active modifier affecting one roster entry,
//! tagged with provenance, in a fixed order the stat evaluator's
//! tie-breaking depends on: own enhancement, equipped weapons, attached
//! leader, then (only when a game context is supplied) stratagems,
//! detachment rules, stance, and mission twists.

use smallvec::SmallVec;

use crate::catalog::{Catalog, DetachmentDefinition, UnitDefinition};
use crate::conditions::{UnitConditionState, condition_met};
use crate::modifier::{CollectedModifier, Modifier, SourceKind};
use crate::roster::{EntryId, GameContext, Roster, RosterEntry};
use crate::wounds::{enhancement_wounds_delta, track, unit_wound_profile};

/// Collect every active modifier for one roster entry.
///
/// Pure function of its inputs: identical (catalog, roster, context)
/// always yields the identical list. Missing ids (unknown unit,
/// enhancement, detachment, or a stale leader link) degrade to empty
/// contributions instead of failing.
#[must_use]
pub fn collect_modifiers(
    catalog: &Catalog,
    roster: &Roster,
    entry_id: EntryId,
    detachment_id: &str,
    context: Option<&GameContext>,
) -> Vec<CollectedModifier> {
    let Some(entry) = roster.entry(entry_id) else {
        log::debug!("collect: roster entry {entry_id:?} not found");
        return Vec::new();
    };
    let Some(definition) = catalog.unit(&entry.unit) else {
        log::debug!("collect: unit '{}' not in catalog", entry.unit);
        return Vec::new();
    };
    let detachment = catalog.detachment(detachment_id);

    let mut out = Vec::new();

    collect_own_enhancement(catalog, detachment_id, entry, &mut out);
    collect_equipped_weapons(definition, entry, &mut out);
    collect_attached_leader(catalog, roster, detachment_id, entry, &mut out);

    // Without a game context no game-state modifiers apply at all. This
    // is deliberate, not an oversight.
    let Some(ctx) = context else {
        return out;
    };
    let state = derive_condition_state(catalog, detachment_id, definition, entry);

    collect_stratagems(catalog, detachment, ctx, &state, &mut out);
    collect_detachment_rules(detachment, ctx, &state, &mut out);
    collect_stance(catalog, ctx, &state, &mut out);
    collect_mission_twists(ctx);

    out
}

/// A modifier's own source label, when present, wins over the name of
/// the catalog entry that carried it.
fn label_for<'a>(modifier: &'a Modifier, default: &'a str) -> &'a str {
    modifier.source.as_deref().unwrap_or(default)
}

fn push(out: &mut Vec<CollectedModifier>, modifier: &Modifier, source: &str, kind: SourceKind) {
    out.push(CollectedModifier {
        modifier: modifier.clone(),
        source: label_for(modifier, source).to_string(),
        kind,
    });
}

fn collect_own_enhancement(
    catalog: &Catalog,
    detachment_id: &str,
    entry: &RosterEntry,
    out: &mut Vec<CollectedModifier>,
) {
    let Some(enhancement_id) = entry.enhancement.as_deref() else {
        return;
    };
    let Some(enhancement) = catalog.enhancement(detachment_id, enhancement_id) else {
        log::debug!("collect: enhancement '{enhancement_id}' not found in '{detachment_id}'");
        return;
    };
    for m in &enhancement.modifiers {
        push(out, m, &enhancement.name, SourceKind::Enhancement);
    }
}

/// A weapon is equipped if it carries no loadout group (always carried)
/// or its group has a positive equipped-model count. Each group is
/// processed at most once even when several profiles declare it, so a
/// single physical equipment choice is never double-counted.
fn collect_equipped_weapons(
    definition: &UnitDefinition,
    entry: &RosterEntry,
    out: &mut Vec<CollectedModifier>,
) {
    let mut seen_groups: SmallVec<[&str; 4]> = SmallVec::new();
    for weapon in &definition.weapons {
        let equipped = match weapon.loadout_group.as_deref() {
            None => true,
            Some(group) => {
                if seen_groups.contains(&group) {
                    continue;
                }
                seen_groups.push(group);
                entry.loadout.get(group).copied().unwrap_or(0) > 0
            }
        };
        if !equipped {
            continue;
        }
        for m in &weapon.modifiers {
            push(out, m, &weapon.name, SourceKind::Weapon);
        }
    }
}

/// An attached leader contributes only its `unit`- and `all`-scope
/// modifiers; `model`-scope gear stays on the leader itself.
fn collect_attached_leader(
    catalog: &Catalog,
    roster: &Roster,
    detachment_id: &str,
    entry: &RosterEntry,
    out: &mut Vec<CollectedModifier>,
) {
    let Some(leader_id) = entry.attached_leader else {
        return;
    };
    let Some(leader_entry) = roster.entry(leader_id) else {
        log::debug!("collect: stale leader link {leader_id:?} on entry {:?}", entry.id);
        return;
    };
    let Some(leader_def) = catalog.unit(&leader_entry.unit) else {
        log::debug!("collect: leader unit '{}' not in catalog", leader_entry.unit);
        return;
    };

    if let Some(enhancement_id) = leader_entry.enhancement.as_deref() {
        if let Some(enhancement) = catalog.enhancement(detachment_id, enhancement_id) {
            for m in &enhancement.modifiers {
                if m.scope.propagates_from_leader() {
                    let label =
                        format!("{}: {}", leader_def.name, label_for(m, &enhancement.name));
                    out.push(CollectedModifier {
                        modifier: m.clone(),
                        source: label,
                        kind: SourceKind::LeaderEnhancement,
                    });
                }
            }
        }
    }

    let mut seen_groups: SmallVec<[&str; 4]> = SmallVec::new();
    for weapon in &leader_def.weapons {
        let equipped = match weapon.loadout_group.as_deref() {
            None => true,
            Some(group) => {
                if seen_groups.contains(&group) {
                    continue;
                }
                seen_groups.push(group);
                leader_entry.loadout.get(group).copied().unwrap_or(0) > 0
            }
        };
        if !equipped {
            continue;
        }
        for m in &weapon.modifiers {
            if m.scope.propagates_from_leader() {
                let label = format!("{}: {}", leader_def.name, label_for(m, &weapon.name));
                out.push(CollectedModifier {
                    modifier: m.clone(),
                    source: label,
                    kind: SourceKind::Leader,
                });
            }
        }
    }
}

fn derive_condition_state(
    catalog: &Catalog,
    detachment_id: &str,
    definition: &UnitDefinition,
    entry: &RosterEntry,
) -> UnitConditionState {
    let delta = enhancement_wounds_delta(catalog, detachment_id, entry);
    let profile = unit_wound_profile(definition, entry, delta);
    let tracking = track(profile, entry.models, entry.wounds);
    UnitConditionState::from_tracking(&tracking, entry.warlord)
}

/// Stratagems are pooled from the current detachment plus the
/// faction-wide core list.
fn collect_stratagems(
    catalog: &Catalog,
    detachment: Option<&DetachmentDefinition>,
    ctx: &GameContext,
    state: &UnitConditionState,
    out: &mut Vec<CollectedModifier>,
) {
    let pool = detachment
        .map(|d| d.stratagems.as_slice())
        .unwrap_or_default()
        .iter()
        .chain(catalog.core_stratagems.iter());
    for stratagem in pool {
        if !ctx.active_stratagems.contains(&stratagem.id) {
            continue;
        }
        for m in &stratagem.modifiers {
            if condition_met(m.condition, state) {
                push(out, m, &stratagem.name, SourceKind::Stratagem);
            }
        }
    }
}

fn collect_detachment_rules(
    detachment: Option<&DetachmentDefinition>,
    ctx: &GameContext,
    state: &UnitConditionState,
    out: &mut Vec<CollectedModifier>,
) {
    let Some(detachment) = detachment else {
        return;
    };
    for rule in &detachment.rules {
        for m in &rule.modifiers {
            if condition_met(m.condition, state) {
                push(out, m, &rule.name, SourceKind::DetachmentRule);
            }
        }
        let Some(choice_id) = ctx.rule_choices.get(&rule.id) else {
            continue;
        };
        let Some(choice) = rule.choices.iter().find(|c| &c.id == choice_id) else {
            log::debug!("collect: rule '{}' has no choice '{choice_id}'", rule.id);
            continue;
        };
        let label = format!("{}: {}", rule.name, choice.name);
        for m in &choice.modifiers {
            if condition_met(m.condition, state) {
                push(out, m, &label, SourceKind::DetachmentRule);
            }
        }
    }
}

fn collect_stance(
    catalog: &Catalog,
    ctx: &GameContext,
    state: &UnitConditionState,
    out: &mut Vec<CollectedModifier>,
) {
    let Some(stance_id) = ctx.stance.as_deref() else {
        return;
    };
    let Some(stance) = catalog.stance(stance_id) else {
        log::debug!("collect: stance '{stance_id}' not in catalog");
        return;
    };
    for m in &stance.modifiers {
        if condition_met(m.condition, state) {
            push(out, m, &stance.name, SourceKind::Stance);
        }
    }
}

/// Mission twists are part of the context surface, but the catalog
/// carries no twist table yet, so this step contributes nothing.
fn collect_mission_twists(ctx: &GameContext) {
    for twist in &ctx.mission_twists {
        log::debug!("collect: mission twist '{twist}' has no catalog source; skipped");
    }
}
