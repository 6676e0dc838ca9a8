//! Rep/load parsing and set validation.
//!
//! Workout entries arrive in two shapes (nested `performed_sets` or the
//! legacy flat `reps`/`weight` fields) with numbers that may be free text.
//! Everything here funnels those shapes into [`ValidatedSet`] before any
//! aggregation runs. A set that cannot be validated is dropped without an
//! error.

use crate::estimate::estimate_e1rm;
use crate::{ExerciseLogEntry, LooseNumber, PerformedSet};

/// A set with a usable rep count and a positive load
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidatedSet {
    pub reps: u32,
    pub weight_kg: f64,
}

impl ValidatedSet {
    pub fn e1rm(&self) -> f64 {
        estimate_e1rm(self.weight_kg, f64::from(self.reps))
    }

    pub fn volume(&self) -> f64 {
        self.weight_kg * f64::from(self.reps)
    }
}

/// The two input shapes an exercise entry can take
#[derive(Clone, Copy, Debug)]
pub enum SetShape<'a> {
    Performed(&'a [PerformedSet]),
    Flat {
        reps: Option<&'a LooseNumber>,
        weight: Option<&'a LooseNumber>,
    },
}

impl ExerciseLogEntry {
    /// Nested sets win whenever present; an empty list falls back to the
    /// flat fields.
    pub fn shape(&self) -> SetShape<'_> {
        if self.performed_sets.is_empty() {
            SetShape::Flat {
                reps: self.reps.as_ref(),
                weight: self.weight.as_ref(),
            }
        } else {
            SetShape::Performed(&self.performed_sets)
        }
    }

    /// All usable sets of this entry, in input order
    pub fn validated_sets(&self) -> Vec<ValidatedSet> {
        match self.shape() {
            SetShape::Performed(sets) => sets
                .iter()
                .filter_map(|set| validate_set(set.reps.as_ref(), set.weight_kg.as_ref()))
                .collect(),
            SetShape::Flat { reps, weight } => validate_set(reps, weight).into_iter().collect(),
        }
    }
}

fn validate_set(reps: Option<&LooseNumber>, weight: Option<&LooseNumber>) -> Option<ValidatedSet> {
    let reps = parse_reps(reps?)?;
    let weight_kg = parse_load(weight?)?;
    Some(ValidatedSet { reps, weight_kg })
}

/// Extract the first embedded positive integer.
///
/// Numbers are truncated toward zero. For text only the first run of digits
/// is considered; a `-` directly in front of it marks it negative.
pub fn parse_reps(value: &LooseNumber) -> Option<u32> {
    match value {
        LooseNumber::Number(n) => {
            if !n.is_finite() {
                return None;
            }
            let whole = n.trunc();
            if whole < 1.0 {
                None
            } else {
                Some(whole as u32)
            }
        }
        LooseNumber::Text(text) => {
            let (negative, digits) = first_numeric_run(text, false)?;
            if negative {
                return None;
            }
            // digit runs past u32::MAX saturate, like large numeric reps
            let reps = digits.parse::<u32>().unwrap_or(u32::MAX);
            (reps > 0).then_some(reps)
        }
    }
}

/// Extract a positive load in kilograms (`102.5`, `"102.5 kg"`).
pub fn parse_load(value: &LooseNumber) -> Option<f64> {
    let load = match value {
        LooseNumber::Number(n) => *n,
        LooseNumber::Text(text) => {
            let (negative, digits) = first_numeric_run(text, true)?;
            if negative {
                return None;
            }
            digits.parse::<f64>().ok()?
        }
    };
    (load.is_finite() && load > 0.0).then_some(load)
}

/// Find the first run of ASCII digits (optionally with one decimal part)
/// and report whether a minus sign sits right before it.
fn first_numeric_run(text: &str, allow_fraction: bool) -> Option<(bool, &str)> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let negative = start > 0 && bytes[start - 1] == b'-';

    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if allow_fraction
        && end + 1 < bytes.len()
        && bytes[end] == b'.'
        && bytes[end + 1].is_ascii_digit()
    {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    Some((negative, &text[start..end]))
}

/// Grouping key for exercise names: trimmed, whitespace collapsed,
/// lowercased. Every cross-table match goes through this function.
pub fn normalize_exercise_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> LooseNumber {
        LooseNumber::from(s)
    }

    fn num(n: f64) -> LooseNumber {
        LooseNumber::from(n)
    }

    #[test]
    fn test_parse_reps_from_text() {
        assert_eq!(parse_reps(&text("8-12")), Some(8));
        assert_eq!(parse_reps(&text("10 reps")), Some(10));
        assert_eq!(parse_reps(&text("x5")), Some(5));
        assert_eq!(parse_reps(&text("rest")), None);
        assert_eq!(parse_reps(&text("")), None);
        assert_eq!(parse_reps(&text("0")), None);
        assert_eq!(parse_reps(&text("-3")), None);
        assert_eq!(parse_reps(&text("99999999999 reps")), Some(u32::MAX));
        assert_eq!(parse_reps(&num(99999999999.0)), Some(u32::MAX));
    }

    #[test]
    fn test_parse_reps_from_number() {
        assert_eq!(parse_reps(&num(5.0)), Some(5));
        assert_eq!(parse_reps(&num(7.9)), Some(7));
        assert_eq!(parse_reps(&num(0.0)), None);
        assert_eq!(parse_reps(&num(0.5)), None);
        assert_eq!(parse_reps(&num(-3.0)), None);
        assert_eq!(parse_reps(&num(f64::NAN)), None);
        assert_eq!(parse_reps(&num(f64::INFINITY)), None);
    }

    #[test]
    fn test_parse_load() {
        assert_eq!(parse_load(&num(100.0)), Some(100.0));
        assert_eq!(parse_load(&text("102.5 kg")), Some(102.5));
        assert_eq!(parse_load(&text("60kg")), Some(60.0));
        assert_eq!(parse_load(&text("bodyweight")), None);
        assert_eq!(parse_load(&num(0.0)), None);
        assert_eq!(parse_load(&num(-20.0)), None);
        assert_eq!(parse_load(&text("-20")), None);
        assert_eq!(parse_load(&num(f64::NAN)), None);
    }

    #[test]
    fn test_normalize_exercise_name() {
        assert_eq!(normalize_exercise_name("Back Squat"), "back squat");
        assert_eq!(normalize_exercise_name("  back   Squat\t"), "back squat");
        assert_eq!(normalize_exercise_name("   "), "");
    }

    #[test]
    fn test_performed_sets_take_precedence() {
        let entry = ExerciseLogEntry {
            name: "Bench".into(),
            reps: Some(num(3.0)),
            weight: Some(num(200.0)),
            performed_sets: vec![
                PerformedSet {
                    reps: Some(num(5.0)),
                    weight_kg: Some(num(80.0)),
                    rir: Some(2.0),
                },
                PerformedSet {
                    reps: Some(text("rest")),
                    weight_kg: Some(num(80.0)),
                    rir: None,
                },
            ],
            ..Default::default()
        };

        assert!(matches!(entry.shape(), SetShape::Performed(_)));
        assert_eq!(
            entry.validated_sets(),
            vec![ValidatedSet {
                reps: 5,
                weight_kg: 80.0
            }]
        );
    }

    #[test]
    fn test_flat_shape_fallback() {
        let entry = ExerciseLogEntry {
            name: "Row".into(),
            sets: Some(num(3.0)),
            reps: Some(text("8-10")),
            weight: Some(text("60kg")),
            ..Default::default()
        };

        assert!(matches!(entry.shape(), SetShape::Flat { .. }));
        assert_eq!(
            entry.validated_sets(),
            vec![ValidatedSet {
                reps: 8,
                weight_kg: 60.0
            }]
        );
    }

    #[test]
    fn test_missing_weight_discards_set() {
        let entry = ExerciseLogEntry {
            name: "Pull-up".into(),
            reps: Some(num(10.0)),
            ..Default::default()
        };
        assert!(entry.validated_sets().is_empty());
    }

    #[test]
    fn test_entry_deserializes_both_shapes() {
        let nested: ExerciseLogEntry = serde_json::from_str(
            r#"{"name":"Squat","performed_sets":[{"reps":"5","weight_kg":100}]}"#,
        )
        .unwrap();
        assert_eq!(nested.validated_sets().len(), 1);

        let flat: ExerciseLogEntry =
            serde_json::from_str(r#"{"name":"Squat","sets":3,"reps":5,"weight_kg":"100"}"#)
                .unwrap();
        assert_eq!(
            flat.validated_sets(),
            vec![ValidatedSet {
                reps: 5,
                weight_kg: 100.0
            }]
        );
    }
}
