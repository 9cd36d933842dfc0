//! Dependency installer
//!
//! Detects whether a project is managed by npm or yarn and drives that
//! package manager's CLI to add dependencies.
//!
//! # Detection
//! - `yarn.lock` in the project root selects yarn
//! - anything else falls back to npm
//!
//! Detection is re-done on every call and never cached.

mod error;
mod installer;
mod probe;
mod process;

pub use error::{InstallerError, InstallerResult};
pub use installer::{
    DependencyInstaller, InstallerConfig, PackageManagerKind, PackageSpec, build_command,
};
pub use probe::{FsProber, LockfileProber};
pub use process::{DryRunRunner, PmCommand, ProcessRunner, TokioRunner};

/// Lock file whose presence means the project is managed by yarn
pub const YARN_LOCKFILE: &str = "yarn.lock";
