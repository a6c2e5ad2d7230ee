//! Static catalog data: unit datasheets, detachments, and army rules.
//!
//! Everything here is read-only for the lifetime of the process. The
//! surrounding application is responsible for loading well-formed data;
//! the engine only degrades gracefully when ids fail to resolve.

use serde::{Deserialize, Serialize};

use crate::modifier::Modifier;
use crate::stats::StatValue;

/// Base characteristic line of a datasheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct UnitStats {
    #[serde(default)]
    pub movement: StatValue,
    #[serde(default)]
    pub toughness: StatValue,
    #[serde(default)]
    pub save: StatValue,
    #[serde(default)]
    pub wounds: StatValue,
    #[serde(default)]
    pub leadership: StatValue,
    #[serde(default)]
    pub objective_control: StatValue,
}

/// A weapon profile on a datasheet. Profiles tagged with the same loadout
/// group are mutually exclusive equip choices for the same physical slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    pub name: String,
    #[serde(default)]
    pub loadout_group: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A datasheet ability. `leads` lists the unit ids this unit may be
/// attached to as a leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitAbility {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub loadout_group: Option<String>,
    #[serde(default)]
    pub leads: Vec<String>,
}

/// Immutable catalog entry for one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub stats: UnitStats,
    #[serde(default)]
    pub invulnerable_save: Option<StatValue>,
    #[serde(default)]
    pub weapons: Vec<WeaponProfile>,
    #[serde(default)]
    pub abilities: Vec<UnitAbility>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl UnitDefinition {
    /// Whether this unit's abilities make it an eligible leader for the
    /// given bodyguard unit.
    #[must_use]
    pub fn can_lead(&self, unit_id: &str) -> bool {
        self.abilities
            .iter()
            .any(|a| a.leads.iter().any(|id| id == unit_id))
    }
}

/// A purchasable enhancement within a detachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enhancement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

/// A tactical action activatable during play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stratagem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

/// A selectable option within a detachment rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleChoice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

/// An always-on detachment rule, optionally with selectable choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetachmentRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub choices: Vec<RuleChoice>,
}

/// Named bundle of enhancements, stratagems, and rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetachmentDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub enhancements: Vec<Enhancement>,
    #[serde(default)]
    pub stratagems: Vec<Stratagem>,
    #[serde(default)]
    pub rules: Vec<DetachmentRule>,
}

/// One of an army rule's mutually exclusive modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stance {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

/// Army-wide special rule with selectable stances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmyRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub stances: Vec<Stance>,
}

/// Container for all static rules data the engine consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Catalog {
    #[serde(default)]
    pub units: Vec<UnitDefinition>,
    #[serde(default)]
    pub detachments: Vec<DetachmentDefinition>,
    #[serde(default)]
    pub army_rules: Vec<ArmyRule>,
    /// Faction-wide stratagems available regardless of detachment.
    #[serde(default)]
    pub core_stratagems: Vec<Stratagem>,
}

impl Catalog {
    /// Create an empty catalog (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load catalog data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid catalog data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Find a unit definition by id.
    #[must_use]
    pub fn unit(&self, id: &str) -> Option<&UnitDefinition> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Find a detachment by id.
    #[must_use]
    pub fn detachment(&self, id: &str) -> Option<&DetachmentDefinition> {
        self.detachments.iter().find(|d| d.id == id)
    }

    /// Find an enhancement inside a detachment.
    #[must_use]
    pub fn enhancement(&self, detachment_id: &str, enhancement_id: &str) -> Option<&Enhancement> {
        self.detachment(detachment_id)?
            .enhancements
            .iter()
            .find(|e| e.id == enhancement_id)
    }

    /// Find a stance by id across every army rule.
    #[must_use]
    pub fn stance(&self, id: &str) -> Option<&Stance> {
        self.army_rules
            .iter()
            .flat_map(|rule| rule.stances.iter())
            .find(|s| s.id == id)
    }
}
