//! Step configuration descriptors

use serde::Deserialize;
use serde_json::Value;

use crate::pm::{InstallerError, InstallerResult, PackageSpec};

/// Step type tag handled by the dependency installer
pub const ADD_DEPENDENCY: &str = "add-dependency";

/// Step type tag that shows a message to the user
pub const PRINT_MESSAGE: &str = "print-message";

/// True iff `config` declares `"stepType": "add-dependency"`.
///
/// Anything else, including a missing or non-string tag or a value that is
/// not an object, is `false`.
pub fn is_add_dependency_executor(config: &Value) -> bool {
    step_type(config) == Some(ADD_DEPENDENCY)
}

fn step_type(config: &Value) -> Option<&str> {
    config.get("stepType").and_then(Value::as_str)
}

/// Fields every step carries
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepHeader {
    pub step_id: String,
    #[serde(default)]
    pub step_name: String,
    pub step_type: String,
    #[serde(default)]
    pub explanation: String,
}

/// What a step does
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    AddDependency {
        packages: Vec<PackageSpec>,
        dev_packages: Vec<PackageSpec>,
    },
    PrintMessage {
        message: String,
    },
    /// A step type this crate has no executor for
    Unknown(Value),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DependencyEntry {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    is_dev_dep: bool,
}

#[derive(Deserialize)]
struct AddDependencyBody {
    #[serde(default)]
    packages: Vec<DependencyEntry>,
}

#[derive(Deserialize)]
struct PrintMessageBody {
    message: String,
}

/// A parsed recipe step
#[derive(Debug, Clone, PartialEq)]
pub struct StepConfig {
    pub header: StepHeader,
    pub kind: StepKind,
}

impl StepConfig {
    /// Parse a raw step object, dispatching on its `stepType`
    ///
    /// A step whose header is missing or malformed becomes [`StepKind::Unknown`]
    /// unless it is tagged with a type this crate executes.
    pub fn from_value(value: &Value) -> InstallerResult<Self> {
        let known = matches!(step_type(value), Some(ADD_DEPENDENCY | PRINT_MESSAGE));
        let header: StepHeader = match serde_json::from_value(value.clone()) {
            Ok(header) => header,
            Err(e) if known => return Err(invalid_step(value, e.to_string())),
            Err(_) => {
                return Ok(Self {
                    header: loose_header(value),
                    kind: StepKind::Unknown(value.clone()),
                });
            }
        };

        let kind = if is_add_dependency_executor(value) {
            let body: AddDependencyBody = serde_json::from_value(value.clone())
                .map_err(|e| invalid_step(value, e.to_string()))?;

            let mut packages = Vec::new();
            let mut dev_packages = Vec::new();
            for entry in body.packages {
                let spec = match entry.version {
                    Some(version) => PackageSpec::with_version(entry.name, version),
                    None => PackageSpec::new(entry.name),
                }
                .map_err(|e| invalid_step(value, e.to_string()))?;

                if entry.is_dev_dep {
                    dev_packages.push(spec);
                } else {
                    packages.push(spec);
                }
            }
            StepKind::AddDependency {
                packages,
                dev_packages,
            }
        } else if header.step_type == PRINT_MESSAGE {
            let body: PrintMessageBody = serde_json::from_value(value.clone())
                .map_err(|e| invalid_step(value, e.to_string()))?;
            StepKind::PrintMessage {
                message: body.message,
            }
        } else {
            StepKind::Unknown(value.clone())
        };

        Ok(Self { header, kind })
    }

    pub fn id(&self) -> &str {
        &self.header.step_id
    }

    /// Human-readable name, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.header.step_name.is_empty() {
            &self.header.step_id
        } else {
            &self.header.step_name
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn step_id_of(value: &Value) -> String {
    string_field(value, "stepId").unwrap_or_else(|| "<unnamed>".to_string())
}

/// Best-effort header for a step that does not deserialize cleanly
fn loose_header(value: &Value) -> StepHeader {
    let step_type = match value.get("stepType") {
        Some(Value::String(tag)) => tag.clone(),
        Some(other) => other.to_string(),
        None => "<missing>".to_string(),
    };
    StepHeader {
        step_id: step_id_of(value),
        step_name: string_field(value, "stepName").unwrap_or_default(),
        step_type,
        explanation: string_field(value, "explanation").unwrap_or_default(),
    }
}

fn invalid_step(value: &Value, message: String) -> InstallerError {
    InstallerError::InvalidStep {
        step_id: step_id_of(value),
        message,
    }
}
