//! Installer error types

use std::path::PathBuf;

use thiserror::Error;

/// Installer error type
#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("Invalid package spec: {0}")]
    InvalidSpec(String),

    #[error("Failed to launch `{program}`: {source}")]
    ProcessSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}", describe_exit(.code))]
    ProcessExit {
        command: String,
        /// Exit code, `None` when the process was killed by a signal
        code: Option<i32>,
    },

    #[error("Unsupported recipe format: {}", .0.display())]
    UnsupportedRecipeFormat(PathBuf),

    #[error("Failed to parse recipe {}: {message}", .path.display())]
    RecipeParse { path: PathBuf, message: String },

    #[error("Invalid step '{step_id}': {message}")]
    InvalidStep { step_id: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InstallerError {
    /// Whether the error came from launching or running the package manager
    pub fn is_process_failure(&self) -> bool {
        matches!(self, Self::ProcessSpawn { .. } | Self::ProcessExit { .. })
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// Result type for installer operations
pub type InstallerResult<T> = Result<T, InstallerError>;
