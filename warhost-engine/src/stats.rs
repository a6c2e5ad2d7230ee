//! Characteristic values and the stat evaluation fold.
//!
//! Base characteristics are a mix of plain numbers and dice-threshold
//! "N+" notation (saves, some leadership values). Evaluation parses the
//! base to a magnitude, folds the applicable modifiers over it in three
//! fixed passes, and reformats to the original notation.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::modifier::{CollectedModifier, ModifierOp, StatKey};

/// A single characteristic value as it appears on a datasheet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StatValue {
    /// Plain numeric value, e.g. movement 6 or wounds 3.
    Numeric(f64),
    /// Dice-threshold notation, e.g. a 2+ save.
    Threshold(i32),
    /// No value on the datasheet ("-").
    #[default]
    Missing,
}

impl StatValue {
    /// Numeric magnitude the evaluator folds over, if the value has one.
    #[must_use]
    pub fn magnitude(self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(v),
            Self::Threshold(n) => Some(f64::from(n)),
            Self::Missing => None,
        }
    }

    /// Rebuild a result magnitude in this value's notation.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn with_magnitude(self, magnitude: f64) -> StatValue {
        match self {
            Self::Numeric(_) => Self::Numeric(magnitude),
            Self::Threshold(_) => Self::Threshold(magnitude.round() as i32),
            Self::Missing => Self::Missing,
        }
    }

    fn parse(text: &str) -> StatValue {
        let text = text.trim();
        if text.is_empty() || text == "-" {
            return Self::Missing;
        }
        if let Some(prefix) = text.strip_suffix('+') {
            if let Ok(n) = prefix.trim().parse::<i32>() {
                return Self::Threshold(n);
            }
        }
        match text.parse::<f64>() {
            Ok(v) => Self::Numeric(v),
            Err(_) => Self::Missing,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[allow(clippy::cast_possible_truncation)]
            Self::Numeric(v) => {
                if v.fract() == 0.0 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{v}")
                }
            }
            Self::Threshold(n) => write!(f, "{n}+"),
            Self::Missing => write!(f, "-"),
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            #[allow(clippy::cast_possible_truncation)]
            Self::Numeric(v) if v.fract() == 0.0 => serializer.serialize_i64(*v as i64),
            Self::Numeric(v) => serializer.serialize_f64(*v),
            Self::Threshold(_) | Self::Missing => serializer.serialize_str(&self.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for StatValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Self::Numeric(v)),
            Raw::Text(text) => Ok(Self::parse(&text)),
        }
    }
}

impl std::str::FromStr for StatValue {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// One evaluated characteristic with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedStat {
    pub base: StatValue,
    pub modified: StatValue,
    /// Display labels of the sources whose modifiers matched this stat.
    pub sources: Vec<String>,
    pub has_modifier: bool,
}

/// Fold the applicable modifiers into a single effective value.
///
/// Three fixed passes run in collection order within each pass: every
/// `set` first (the last one wins), then `add`/`subtract` cumulatively,
/// then `multiply` cumulatively. The pass order is a contract; stacking
/// must not depend on the order sources produced their modifiers.
#[must_use]
pub fn modified_value(stat: StatKey, base: StatValue, modifiers: &[CollectedModifier]) -> StatValue {
    let Some(mut value) = base.magnitude() else {
        return base;
    };

    let applicable = || {
        modifiers
            .iter()
            .filter(move |c| c.modifier.stat == stat && c.modifier.scope.affects_unit())
    };

    for c in applicable() {
        if c.modifier.op == ModifierOp::Set {
            value = c.modifier.value;
        }
    }
    for c in applicable() {
        if matches!(c.modifier.op, ModifierOp::Add | ModifierOp::Subtract) {
            value = c.modifier.op.apply(value, c.modifier.value);
        }
    }
    for c in applicable() {
        if c.modifier.op == ModifierOp::Multiply {
            value *= c.modifier.value;
        }
    }

    base.with_magnitude(value)
}

/// Evaluate one characteristic and record which sources touched it.
#[must_use]
pub fn evaluate_stat(
    stat: StatKey,
    base: StatValue,
    modifiers: &[CollectedModifier],
) -> ModifiedStat {
    let sources: Vec<String> = modifiers
        .iter()
        .filter(|c| c.modifier.stat == stat && c.modifier.scope.affects_unit())
        .map(|c| c.source.clone())
        .collect();
    let has_modifier = !sources.is_empty();
    ModifiedStat {
        base,
        modified: modified_value(stat, base, modifiers),
        sources,
        has_modifier,
    }
}

/// The full set of effective unit characteristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedStats {
    pub movement: ModifiedStat,
    pub toughness: ModifiedStat,
    pub save: ModifiedStat,
    pub wounds: ModifiedStat,
    pub leadership: ModifiedStat,
    pub objective_control: ModifiedStat,
}

impl ModifiedStats {
    /// Evaluate every characteristic of a datasheet against one collected
    /// modifier list.
    #[must_use]
    pub fn evaluate(stats: &crate::catalog::UnitStats, modifiers: &[CollectedModifier]) -> Self {
        Self {
            movement: evaluate_stat(StatKey::Movement, stats.movement, modifiers),
            toughness: evaluate_stat(StatKey::Toughness, stats.toughness, modifiers),
            save: evaluate_stat(StatKey::Save, stats.save, modifiers),
            wounds: evaluate_stat(StatKey::Wounds, stats.wounds, modifiers),
            leadership: evaluate_stat(StatKey::Leadership, stats.leadership, modifiers),
            objective_control: evaluate_stat(
                StatKey::ObjectiveControl,
                stats.objective_control,
                modifiers,
            ),
        }
    }

    /// Look up one evaluated characteristic by key.
    #[must_use]
    pub fn get(&self, stat: StatKey) -> Option<&ModifiedStat> {
        match stat {
            StatKey::Movement => Some(&self.movement),
            StatKey::Toughness => Some(&self.toughness),
            StatKey::Save => Some(&self.save),
            StatKey::Wounds => Some(&self.wounds),
            StatKey::Leadership => Some(&self.leadership),
            StatKey::ObjectiveControl => Some(&self.objective_control),
            StatKey::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::{Modifier, ModifierScope, SourceKind};

    fn collected(stat: StatKey, op: ModifierOp, value: f64) -> CollectedModifier {
        CollectedModifier {
            modifier: Modifier {
                stat,
                op,
                value,
                scope: ModifierScope::Unit,
                source: None,
                condition: None,
            },
            source: "test".to_string(),
            kind: SourceKind::Enhancement,
        }
    }

    #[test]
    fn parses_numeric_threshold_and_missing() {
        assert_eq!("6".parse::<StatValue>().unwrap(), StatValue::Numeric(6.0));
        assert_eq!("2+".parse::<StatValue>().unwrap(), StatValue::Threshold(2));
        assert_eq!("-".parse::<StatValue>().unwrap(), StatValue::Missing);
        assert_eq!("??".parse::<StatValue>().unwrap(), StatValue::Missing);
    }

    #[test]
    fn display_round_trips_notation() {
        assert_eq!(StatValue::Threshold(3).to_string(), "3+");
        assert_eq!(StatValue::Numeric(6.0).to_string(), "6");
        assert_eq!(StatValue::Missing.to_string(), "-");
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let v: StatValue = serde_json::from_str("3").unwrap();
        assert_eq!(v, StatValue::Numeric(3.0));
        let v: StatValue = serde_json::from_str("\"2+\"").unwrap();
        assert_eq!(v, StatValue::Threshold(2));
    }

    #[test]
    fn pass_order_is_set_then_additive_then_multiplicative() {
        // Supply the passes in the worst possible collection order.
        let mods = vec![
            collected(StatKey::Movement, ModifierOp::Multiply, 2.0),
            collected(StatKey::Movement, ModifierOp::Add, 2.0),
            collected(StatKey::Movement, ModifierOp::Set, 12.0),
        ];
        let result = modified_value(StatKey::Movement, StatValue::Numeric(6.0), &mods);
        assert_eq!(result, StatValue::Numeric(28.0));
    }

    #[test]
    fn last_set_in_collection_order_wins() {
        let mods = vec![
            collected(StatKey::Toughness, ModifierOp::Set, 4.0),
            collected(StatKey::Toughness, ModifierOp::Set, 9.0),
        ];
        let result = modified_value(StatKey::Toughness, StatValue::Numeric(5.0), &mods);
        assert_eq!(result, StatValue::Numeric(9.0));
    }

    #[test]
    fn save_notation_survives_modification() {
        let mods = vec![collected(StatKey::Save, ModifierOp::Add, 1.0)];
        let result = modified_value(StatKey::Save, StatValue::Threshold(2), &mods);
        assert_eq!(result, StatValue::Threshold(3));
        assert_eq!(result.to_string(), "3+");
    }

    #[test]
    fn weapon_scope_modifiers_are_filtered_out() {
        let mut melee = collected(StatKey::Wounds, ModifierOp::Add, 5.0);
        melee.modifier.scope = ModifierScope::Melee;
        let result = modified_value(StatKey::Wounds, StatValue::Numeric(3.0), &[melee]);
        assert_eq!(result, StatValue::Numeric(3.0));
    }

    #[test]
    fn unknown_op_leaves_value_unchanged() {
        let mods = vec![
            collected(StatKey::Wounds, ModifierOp::Unknown, 99.0),
            collected(StatKey::Wounds, ModifierOp::Add, 1.0),
        ];
        let result = modified_value(StatKey::Wounds, StatValue::Numeric(3.0), &mods);
        assert_eq!(result, StatValue::Numeric(4.0));
    }

    #[test]
    fn missing_base_stays_missing() {
        let mods = vec![collected(StatKey::ObjectiveControl, ModifierOp::Add, 2.0)];
        let result = modified_value(StatKey::ObjectiveControl, StatValue::Missing, &mods);
        assert_eq!(result, StatValue::Missing);
    }

    #[test]
    fn evaluate_stat_records_provenance() {
        let mods = vec![collected(StatKey::Wounds, ModifierOp::Add, 2.0)];
        let stat = evaluate_stat(StatKey::Wounds, StatValue::Numeric(3.0), &mods);
        assert!(stat.has_modifier);
        assert_eq!(stat.sources, vec!["test".to_string()]);
        assert_eq!(stat.modified, StatValue::Numeric(5.0));

        let untouched = evaluate_stat(StatKey::Movement, StatValue::Numeric(6.0), &mods);
        assert!(!untouched.has_modifier);
        assert!(untouched.sources.is_empty());
    }
}
