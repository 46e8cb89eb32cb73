//! Exercise catalog snapshots.
//!
//! A catalog is loaded once, validated as a whole, and then only read.
//! Sessions are handed an `Arc<ExerciseDefinition>` from it; refreshing the
//! catalog means loading a new snapshot, which leaves running sessions on
//! the definition they started with.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::exercise::{ExerciseDefinition, ExerciseError};

const BUILTIN_CATALOG: &str = include_str!("../catalog/default_exercises.json");

/// Read-only set of exercise definitions keyed by `exerciseId`.
#[derive(Debug, Clone, Default)]
pub struct ExerciseCatalog {
    exercises: BTreeMap<String, Arc<ExerciseDefinition>>,
}

impl ExerciseCatalog {
    /// Build a catalog, validating every definition.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ExerciseDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut exercises = BTreeMap::new();
        for def in definitions {
            def.validate()?;
            let id = def.exercise_id.clone();
            if exercises.insert(id.clone(), Arc::new(def)).is_some() {
                return Err(CatalogError::DuplicateId(id));
            }
        }
        Ok(Self { exercises })
    }

    /// Parse a catalog from a JSON array of definitions.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<ExerciseDefinition> =
            serde_json::from_str(json).map_err(|e| CatalogError::ParseError {
                location: "inline catalog".to_string(),
                source: e,
            })?;
        Self::from_definitions(definitions)
    }

    /// Load a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| CatalogError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let definitions: Vec<ExerciseDefinition> =
            serde_json::from_str(&json).map_err(|e| CatalogError::ParseError {
                location: path.display().to_string(),
                source: e,
            })?;
        let catalog = Self::from_definitions(definitions)?;
        tracing::info!(path = %path.display(), exercises = catalog.len(), "Loaded exercise catalog");
        Ok(catalog)
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Load `path` if given, otherwise the built-in catalog.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    /// Definition snapshot for an exercise.
    pub fn get(&self, exercise_id: &str) -> Result<Arc<ExerciseDefinition>, CatalogError> {
        self.exercises
            .get(exercise_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(exercise_id.to_string()))
    }

    pub fn contains(&self, exercise_id: &str) -> bool {
        self.exercises.contains_key(exercise_id)
    }

    /// Exercise IDs in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.exercises.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExerciseDefinition> {
        self.exercises.values().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }
}

/// Errors that can occur when loading or querying a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {location}: {source}")]
    ParseError {
        location: String,
        source: serde_json::Error,
    },

    #[error("Invalid exercise: {0}")]
    Invalid(#[from] ExerciseError),

    #[error("Exercise '{0}' is defined more than once")]
    DuplicateId(String),

    #[error("Exercise '{0}' not found")]
    NotFound(String),
}
