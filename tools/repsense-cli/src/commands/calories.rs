//! Evaluate an exercise's calorie formula for given figures.

use repsense_common::config::AppConfig;
use repsense_common::error::RepsenseError;
use repsense_processing_core::{CalorieContext, CalorieEstimator, Formula};

pub fn run(
    config: &AppConfig,
    exercise: String,
    reps: u32,
    minutes: f64,
    body_weight: Option<f64>,
    vars: Vec<String>,
) -> anyhow::Result<()> {
    let catalog = super::load_catalog(config)?;
    let definition = super::lookup(&catalog, &exercise)?;

    let mut ctx = CalorieContext::new(
        body_weight.unwrap_or(config.session.body_weight_grams),
        reps,
        minutes * 60.0,
    );
    ctx.extra = super::parse_vars(&vars)?;

    let formula = &definition.calorie_formula;
    println!("Formula: {}", formula.formula);
    if let Ok(parsed) = Formula::parse(&formula.formula) {
        let used = parsed.variables();
        for (name, value) in CalorieEstimator::bind(formula, &ctx) {
            if used.contains(name.as_str()) {
                println!("  {name} = {value}");
            }
        }
    }

    let estimate = CalorieEstimator::estimate(formula, &ctx);
    match estimate.error {
        None => println!("Estimate: {:.2} {}", estimate.value, estimate.unit),
        Some(e) => return Err(RepsenseError::formula(e.to_string()).into()),
    }

    Ok(())
}
