pub mod calories;
pub mod list;
pub mod replay;
pub mod validate;

use std::collections::BTreeMap;

use std::sync::Arc;

use repsense_common::config::AppConfig;
use repsense_common::error::{RepsenseError, RepsenseResult};
use repsense_exercise_model::catalog::ExerciseCatalog;
use repsense_exercise_model::exercise::ExerciseDefinition;

/// Load the catalog selected by flags or config.
pub fn load_catalog(config: &AppConfig) -> RepsenseResult<ExerciseCatalog> {
    ExerciseCatalog::load_or_builtin(config.catalog_path.as_deref())
        .map_err(|e| RepsenseError::catalog(format!("failed to load exercise catalog: {e}")))
}

/// Look up one exercise.
pub fn lookup(catalog: &ExerciseCatalog, id: &str) -> RepsenseResult<Arc<ExerciseDefinition>> {
    catalog
        .get(id)
        .map_err(|e| RepsenseError::catalog(e.to_string()))
}

/// Parse repeated `NAME=VALUE` arguments.
pub fn parse_vars(vars: &[String]) -> RepsenseResult<BTreeMap<String, f64>> {
    let mut out = BTreeMap::new();
    for var in vars {
        let (name, value) = var
            .split_once('=')
            .ok_or_else(|| RepsenseError::config(format!("expected NAME=VALUE, got '{var}'")))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|e| RepsenseError::config(format!("invalid value for '{name}': {e}")))?;
        out.insert(name.trim().to_string(), value);
    }
    Ok(out)
}
