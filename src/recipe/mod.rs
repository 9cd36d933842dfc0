//! Project recipes
//!
//! A recipe is a named list of steps. Each step is a JSON-like object tagged
//! with a `stepType`; recipes can be written as JSON or TOML:
//!
//! ```toml
//! name = "typescript"
//!
//! [[steps]]
//! stepId = "addDependencies"
//! stepName = "Add dependencies"
//! stepType = "add-dependency"
//! packages = [{ name = "typescript", version = "4", isDevDep = true }]
//! ```

mod runner;
mod step;

use std::path::Path;

use serde::Deserialize;

use crate::pm::{InstallerError, InstallerResult};

pub use runner::{RecipeRunner, RunSummary};
pub use step::{
    ADD_DEPENDENCY, PRINT_MESSAGE, StepConfig, StepHeader, StepKind, is_add_dependency_executor,
};

/// A named list of raw steps
#[derive(Debug, Clone, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<serde_json::Value>,
}

impl Recipe {
    /// Load a recipe from a `.json` or `.toml` file
    pub fn load(path: impl AsRef<Path>) -> InstallerResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let parse: fn(&str) -> Result<Self, String> = match extension.as_deref() {
            Some("json") => |s| serde_json::from_str(s).map_err(|e| e.to_string()),
            Some("toml") => |s| toml::from_str(s).map_err(|e| e.to_string()),
            _ => return Err(InstallerError::UnsupportedRecipeFormat(path.to_path_buf())),
        };

        let content = std::fs::read_to_string(path)?;
        let recipe = parse(&content).map_err(|message| InstallerError::RecipeParse {
            path: path.to_path_buf(),
            message,
        })?;

        if recipe.name.trim().is_empty() {
            return Err(InstallerError::RecipeParse {
                path: path.to_path_buf(),
                message: "recipe name must not be empty".to_string(),
            });
        }
        Ok(recipe)
    }
}
