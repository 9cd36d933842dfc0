//! recipe-installer - runs project recipe steps that add JavaScript dependencies
//!
//! - `pm`: package manager detection (npm or yarn) and dependency installation
//! - `recipe`: step descriptors, recipe files and the sequential step runner

pub mod pm;
pub mod recipe;

// Re-export commonly used types
pub use pm::{
    DependencyInstaller, InstallerConfig, InstallerError, InstallerResult, PackageManagerKind,
    PackageSpec,
};
pub use recipe::{Recipe, RecipeRunner, RunSummary, StepConfig, is_add_dependency_executor};
