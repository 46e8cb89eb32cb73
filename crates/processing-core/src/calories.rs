//! Calorie estimation from an exercise's formula.
//!
//! Binding order, later wins:
//! 1. Session values: `bodyWeight`, `reps`/`count`, `minutes`, `seconds`.
//! 2. Declared variables whose tag is a numeric literal (e.g. `"50"`).
//! 3. Caller-supplied extras (e.g. the dumbbell `weight`).
//!
//! Non-numeric tags such as `"grams"` or `"time"` only annotate units.

use std::collections::BTreeMap;

use serde::Serialize;

use repsense_exercise_model::exercise::CalorieFormula;

use crate::formula::{Formula, FormulaError};

/// Run-time values a formula may refer to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalorieContext {
    /// Body weight, in whatever unit the formula expects (grams in the built-in catalog).
    pub body_weight: f64,
    pub total_count: u32,
    pub elapsed_secs: f64,
    /// Extra named values, bound last.
    pub extra: BTreeMap<String, f64>,
}

impl CalorieContext {
    pub fn new(body_weight: f64, total_count: u32, elapsed_secs: f64) -> Self {
        Self {
            body_weight,
            total_count,
            elapsed_secs,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: f64) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

/// Outcome of an estimate. A failed formula reports `0` alongside the error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalorieEstimate {
    pub value: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "error_as_string")]
    pub error: Option<FormulaError>,
}

impl CalorieEstimate {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn error_as_string<S: serde::Serializer>(
    error: &Option<FormulaError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Evaluates calorie formulas.
pub struct CalorieEstimator;

impl CalorieEstimator {
    /// Variable table for a formula under a context.
    pub fn bind(formula: &CalorieFormula, ctx: &CalorieContext) -> BTreeMap<String, f64> {
        let count = ctx.total_count as f64;
        let mut table: BTreeMap<String, f64> = [
            ("bodyWeight", ctx.body_weight),
            ("reps", count),
            ("count", count),
            ("minutes", ctx.elapsed_secs / 60.0),
            ("seconds", ctx.elapsed_secs),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        for (name, tag) in &formula.variables {
            if let Some(value) = numeric_tag(tag) {
                table.insert(name.clone(), value);
            }
        }

        table.extend(ctx.extra.iter().map(|(k, v)| (k.clone(), *v)));
        table
    }

    /// Evaluate, surfacing any formula error.
    pub fn try_estimate(formula: &CalorieFormula, ctx: &CalorieContext) -> Result<f64, FormulaError> {
        let parsed = Formula::parse(&formula.formula)?;
        parsed.evaluate(&Self::bind(formula, ctx))
    }

    /// Evaluate, falling back to `0` on error.
    pub fn estimate(formula: &CalorieFormula, ctx: &CalorieContext) -> CalorieEstimate {
        match Self::try_estimate(formula, ctx) {
            Ok(value) => CalorieEstimate {
                value,
                unit: formula.unit.clone(),
                error: None,
            },
            Err(e) => {
                tracing::warn!(formula = %formula.formula, error = %e, "Calorie formula failed");
                CalorieEstimate {
                    value: 0.0,
                    unit: formula.unit.clone(),
                    error: Some(e),
                }
            }
        }
    }
}

fn numeric_tag(tag: &str) -> Option<f64> {
    tag.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formula(src: &str, vars: &[(&str, &str)]) -> CalorieFormula {
        CalorieFormula {
            formula: src.to_string(),
            unit: "kcal".to_string(),
            variables: vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_squat_estimate() {
        let f = formula(
            "(0.00032 * bodyWeight * reps) / 30",
            &[("bodyWeight", "grams"), ("reps", "count")],
        );
        let est = CalorieEstimator::estimate(&f, &CalorieContext::new(70_000.0, 10, 45.0));
        assert!(est.is_ok());
        assert!((est.value - 7.466_666_666).abs() < 1e-6);
        assert_eq!(est.unit, "kcal");
    }

    #[test]
    fn test_minutes_binding_and_numeric_tag() {
        let f = formula(
            "(0.0014 * bodyWeight * minutes * (count / (minutes * averageJacksPerMinute)))",
            &[
                ("bodyWeight", "grams"),
                ("minutes", "time"),
                ("count", "number"),
                ("averageJacksPerMinute", "50"),
            ],
        );
        let ctx = CalorieContext::new(70_000.0, 50, 120.0);
        let table = CalorieEstimator::bind(&f, &ctx);
        assert_eq!(table["minutes"], 2.0);
        assert_eq!(table["averageJacksPerMinute"], 50.0);
        assert_eq!(table["count"], 50.0);

        let value = CalorieEstimator::try_estimate(&f, &ctx).unwrap();
        // 0.0014 * 70000 * 2 * (50 / 100)
        assert!((value - 98.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_elapsed_time_reports_error_and_zero() {
        let f = formula(
            "count / (minutes * averageJacksPerMinute)",
            &[("averageJacksPerMinute", "50")],
        );
        let est = CalorieEstimator::estimate(&f, &CalorieContext::new(70_000.0, 12, 0.0));
        assert_eq!(est.value, 0.0);
        assert!(matches!(est.error, Some(FormulaError::NonFinite { .. })));
    }

    #[test]
    fn test_unbound_variable_reports_error() {
        let f = formula(
            "((0.0003 * bodyWeight + (weight * 0.075)) * reps) / 30",
            &[("weight", "grams")],
        );
        let ctx = CalorieContext::new(70_000.0, 12, 60.0);
        let est = CalorieEstimator::estimate(&f, &ctx);
        assert_eq!(est.value, 0.0);
        assert_eq!(est.error, Some(FormulaError::UnknownVariable("weight".into())));

        let with_weight = ctx.with_variable("weight", 5_000.0);
        let value = CalorieEstimator::try_estimate(&f, &with_weight).unwrap();
        // (21 + 375) * 12 / 30
        assert!((value - 158.4).abs() < 1e-9);
    }

    #[test]
    fn test_extras_override_declared_defaults() {
        let f = formula("rate * 2", &[("rate", "50")]);
        let ctx = CalorieContext::new(0.0, 0, 0.0).with_variable("rate", 10.0);
        assert_eq!(CalorieEstimator::try_estimate(&f, &ctx).unwrap(), 20.0);
    }

    #[test]
    fn test_non_finite_tags_are_annotations() {
        let f = formula("reps", &[("reps", "NaN")]);
        let table = CalorieEstimator::bind(&f, &CalorieContext::new(0.0, 3, 0.0));
        assert_eq!(table["reps"], 3.0);
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let f = formula("bodyWeight *", &[]);
        let est = CalorieEstimator::estimate(&f, &CalorieContext::new(70_000.0, 1, 1.0));
        assert_eq!(est.value, 0.0);
        assert_eq!(est.error, Some(FormulaError::UnexpectedEnd));
    }

    #[test]
    fn test_estimate_serializes_error_as_text() {
        let f = formula("nope", &[]);
        let est = CalorieEstimator::estimate(&f, &CalorieContext::default());
        let json = serde_json::to_value(&est).unwrap();
        assert_eq!(json["value"], 0.0);
        assert_eq!(json["error"], "unknown variable 'nope'");
    }
}
