//! Validate an exercise catalog file.

use std::path::PathBuf;

use repsense_common::error::RepsenseError;
use repsense_exercise_model::catalog::ExerciseCatalog;
use repsense_processing_core::{CountingEngine, Formula};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating catalog at: {}", path.display());

    let catalog = ExerciseCatalog::load(&path).map_err(|e| RepsenseError::catalog(e.to_string()))?;
    println!("  Exercises: {}", catalog.len());

    // Definitions passed structural checks on load; these need the engine.
    let mut issues = Vec::new();
    for id in catalog.ids() {
        let def = super::lookup(&catalog, id)?;
        if let Err(e) = CountingEngine::new(def.clone()) {
            issues.push(format!("{id}: {e}"));
        }
        if let Err(e) = Formula::parse(&def.calorie_formula.formula) {
            issues.push(format!("{id}: calorie formula: {e}"));
        }
    }

    if issues.is_empty() {
        println!("\nCatalog is valid.");
        return Ok(());
    }

    println!("\nValidation issues:");
    for issue in &issues {
        println!("  - {issue}");
    }
    anyhow::bail!("{} issue(s) found", issues.len())
}
