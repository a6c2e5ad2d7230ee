//! Mutable roster state: the player's army list and in-game context.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::wounds::WoundState;

/// Stable handle for a roster entry. Links between entries (leader
/// attachment) use these instead of positional indices, so reordering
/// the roster cannot silently invalidate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u32);

/// One line item in the army list: a unit plus its current configuration
/// and damage state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: EntryId,
    /// Catalog id of the unit definition.
    pub unit: String,
    pub models: u32,
    #[serde(default)]
    pub enhancement: Option<String>,
    /// Equipped model count per loadout group.
    #[serde(default)]
    pub loadout: BTreeMap<String, u32>,
    /// Unit wound pool.
    #[serde(default)]
    pub wounds: WoundState,
    /// Attached leader's wound pool, tracked separately from the unit's.
    #[serde(default)]
    pub leader_wounds: WoundState,
    #[serde(default)]
    pub attached_leader: Option<EntryId>,
    #[serde(default)]
    pub warlord: bool,
}

impl RosterEntry {
    /// Create a fresh entry at full health with no equipment selections.
    #[must_use]
    pub fn new(id: EntryId, unit: impl Into<String>, models: u32) -> Self {
        Self {
            id,
            unit: unit.into(),
            models,
            enhancement: None,
            loadout: BTreeMap::new(),
            wounds: WoundState::Full,
            leader_wounds: WoundState::Full,
            attached_leader: None,
            warlord: false,
        }
    }
}

/// Errors raised when a roster mutation would violate an invariant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("roster entry {0:?} does not exist")]
    UnknownEntry(EntryId),
    #[error("unit '{0}' is not in the catalog")]
    UnknownUnit(String),
    #[error("an entry cannot lead itself")]
    SelfAttachment,
    #[error("'{leader}' is not an eligible leader for '{bodyguard}'")]
    NotEligible { leader: String, bodyguard: String },
}

/// The player's army list. Entries are owned exclusively by this list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a roster from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid roster data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// All entries, in list order.
    #[must_use]
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    /// Look up an entry by id.
    #[must_use]
    pub fn entry(&self, id: EntryId) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn entry_mut(&mut self, id: EntryId) -> Option<&mut RosterEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    fn next_id(&self) -> EntryId {
        EntryId(self.entries.iter().map(|e| e.id.0 + 1).max().unwrap_or(0))
    }

    /// Add a unit to the roster and return its handle.
    pub fn add_unit(&mut self, unit: impl Into<String>, models: u32) -> EntryId {
        let id = self.next_id();
        self.entries.push(RosterEntry::new(id, unit, models));
        id
    }

    /// Remove an entry. Any leader links pointing at it are detached.
    /// Returns false if the entry did not exist.
    pub fn remove(&mut self, id: EntryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return false;
        }
        for entry in &mut self.entries {
            if entry.attached_leader == Some(id) {
                entry.attached_leader = None;
                entry.leader_wounds = WoundState::Full;
            }
        }
        true
    }

    /// Set the model count of an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist.
    pub fn set_model_count(&mut self, id: EntryId, models: u32) -> Result<(), RosterError> {
        let entry = self.entry_mut(id).ok_or(RosterError::UnknownEntry(id))?;
        entry.models = models;
        Ok(())
    }

    /// Set how many models carry a loadout group's equipment. A count of
    /// zero removes the selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist.
    pub fn set_loadout_count(
        &mut self,
        id: EntryId,
        group: &str,
        count: u32,
    ) -> Result<(), RosterError> {
        let entry = self.entry_mut(id).ok_or(RosterError::UnknownEntry(id))?;
        if count == 0 {
            entry.loadout.remove(group);
        } else {
            entry.loadout.insert(group.to_string(), count);
        }
        Ok(())
    }

    /// Select or clear an entry's enhancement.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist.
    pub fn set_enhancement(
        &mut self,
        id: EntryId,
        enhancement: Option<String>,
    ) -> Result<(), RosterError> {
        let entry = self.entry_mut(id).ok_or(RosterError::UnknownEntry(id))?;
        entry.enhancement = enhancement;
        Ok(())
    }

    /// Mark or unmark an entry as the warlord.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist.
    pub fn set_warlord(&mut self, id: EntryId, warlord: bool) -> Result<(), RosterError> {
        let entry = self.entry_mut(id).ok_or(RosterError::UnknownEntry(id))?;
        entry.warlord = warlord;
        Ok(())
    }

    /// Attach a leader entry to a bodyguard entry. The leader's datasheet
    /// must carry a leader ability naming the bodyguard's unit.
    ///
    /// # Errors
    ///
    /// Returns an error if either entry or unit is missing, the two
    /// entries are the same, or the leader is not eligible.
    pub fn attach_leader(
        &mut self,
        bodyguard: EntryId,
        leader: EntryId,
        catalog: &Catalog,
    ) -> Result<(), RosterError> {
        if bodyguard == leader {
            return Err(RosterError::SelfAttachment);
        }
        let bodyguard_unit = self
            .entry(bodyguard)
            .ok_or(RosterError::UnknownEntry(bodyguard))?
            .unit
            .clone();
        let leader_unit = self
            .entry(leader)
            .ok_or(RosterError::UnknownEntry(leader))?
            .unit
            .clone();
        let leader_def = catalog
            .unit(&leader_unit)
            .ok_or_else(|| RosterError::UnknownUnit(leader_unit.clone()))?;
        if !leader_def.can_lead(&bodyguard_unit) {
            return Err(RosterError::NotEligible {
                leader: leader_unit,
                bodyguard: bodyguard_unit,
            });
        }
        let entry = self
            .entry_mut(bodyguard)
            .ok_or(RosterError::UnknownEntry(bodyguard))?;
        entry.attached_leader = Some(leader);
        entry.leader_wounds = WoundState::Full;
        Ok(())
    }

    /// Detach a bodyguard's leader, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist.
    pub fn detach_leader(&mut self, bodyguard: EntryId) -> Result<(), RosterError> {
        let entry = self
            .entry_mut(bodyguard)
            .ok_or(RosterError::UnknownEntry(bodyguard))?;
        entry.attached_leader = None;
        entry.leader_wounds = WoundState::Full;
        Ok(())
    }

    /// Record a new unit wound value. Used by callers implementing the
    /// persistence seam over an in-memory roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist.
    pub fn set_unit_wounds(&mut self, id: EntryId, value: WoundState) -> Result<(), RosterError> {
        let entry = self.entry_mut(id).ok_or(RosterError::UnknownEntry(id))?;
        entry.wounds = value;
        Ok(())
    }

    /// Record a new leader wound value for a bodyguard entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist.
    pub fn set_leader_wounds(&mut self, id: EntryId, value: WoundState) -> Result<(), RosterError> {
        let entry = self.entry_mut(id).ok_or(RosterError::UnknownEntry(id))?;
        entry.leader_wounds = value;
        Ok(())
    }
}

/// Snapshot of in-game selections. When absent, no game-state modifiers
/// apply at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameContext {
    /// Ids of currently active stratagems.
    #[serde(default)]
    pub active_stratagems: BTreeSet<String>,
    /// Selected choice per detachment rule id.
    #[serde(default)]
    pub rule_choices: BTreeMap<String, String>,
    /// Currently selected army-wide stance.
    #[serde(default)]
    pub stance: Option<String>,
    /// Active mission twists. The catalog carries no twist table yet, so
    /// these contribute nothing.
    #[serde(default)]
    pub mission_twists: BTreeSet<String>,
}
