//! Package manager selection and dependency installation

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::YARN_LOCKFILE;
use super::error::{InstallerError, InstallerResult};
use super::probe::{FsProber, LockfileProber};
use super::process::{PmCommand, ProcessRunner, TokioRunner};

/// One requested dependency, e.g. `typescript@4` or `ts-node`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPackageSpec")]
pub struct PackageSpec {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Deserialize)]
struct RawPackageSpec {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

impl TryFrom<RawPackageSpec> for PackageSpec {
    type Error = InstallerError;

    fn try_from(raw: RawPackageSpec) -> InstallerResult<Self> {
        match raw.version {
            Some(version) => Self::with_version(raw.name, version),
            None => Self::new(raw.name),
        }
    }
}

impl PackageSpec {
    /// A package without a version constraint
    ///
    /// Surrounding whitespace is trimmed; whitespace inside the name is rejected.
    pub fn new(name: impl Into<String>) -> InstallerResult<Self> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(InstallerError::InvalidSpec(
                "package name must not be empty".to_string(),
            ));
        }
        if name.contains(char::is_whitespace) {
            return Err(InstallerError::InvalidSpec(format!(
                "package name '{}' must not contain whitespace",
                name
            )));
        }
        Ok(Self {
            name: name.to_string(),
            version: None,
        })
    }

    /// A package pinned to `version` (trimmed); an empty version means "any"
    pub fn with_version(
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> InstallerResult<Self> {
        let mut spec = Self::new(name)?;
        let version = version.into();
        let version = version.trim();
        if !version.is_empty() {
            spec.version = Some(version.to_string());
        }
        Ok(spec)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Token passed to the package manager: `name` or `name@version`
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for PackageSpec {
    type Err = InstallerError;

    /// Parses `lodash`, `lodash@^4.0.0` or `@types/node@20`
    fn from_str(spec: &str) -> InstallerResult<Self> {
        // A leading '@' marks a scope, not a version
        match spec.rfind('@') {
            Some(at_pos) if at_pos > 0 => {
                Self::with_version(&spec[..at_pos], &spec[at_pos + 1..])
            }
            _ => Self::new(spec),
        }
    }
}

/// Package managers the installer knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManagerKind {
    Npm,
    Yarn,
}

impl PackageManagerKind {
    /// Executable name
    pub fn program(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
        }
    }

    /// Subcommand that adds packages
    pub fn add_verb(self) -> &'static str {
        match self {
            Self::Npm => "install",
            Self::Yarn => "add",
        }
    }

    /// Flag marking the added packages as dev dependencies
    pub fn dev_flag(self) -> &'static str {
        match self {
            Self::Npm => "--save-dev",
            Self::Yarn => "-D",
        }
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Build the command that adds `packages` with the given package manager.
///
/// An empty package list yields the bare verb and flags.
pub fn build_command(kind: PackageManagerKind, packages: &[PackageSpec], dev: bool) -> PmCommand {
    let mut command = PmCommand::new(kind.program()).arg(kind.add_verb());
    if dev {
        command = command.arg(kind.dev_flag());
    }
    command.args(packages.iter().map(PackageSpec::token))
}

/// Installer configuration
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Project root: probed for lock files and used as the working directory
    pub root: PathBuf,
    /// Marker whose presence selects yarn
    pub yarn_lockfile: String,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_default(),
            yarn_lockfile: YARN_LOCKFILE.to_string(),
        }
    }
}

impl InstallerConfig {
    /// Create a new config with the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Override the yarn lock file name
    pub fn yarn_lockfile(mut self, name: impl Into<String>) -> Self {
        self.yarn_lockfile = name.into();
        self
    }
}

/// Adds dependencies through whichever package manager the project uses
pub struct DependencyInstaller<P = FsProber, R = TokioRunner> {
    config: InstallerConfig,
    prober: P,
    runner: R,
}

impl DependencyInstaller {
    /// Installer for the current directory using the real filesystem and processes
    pub fn new() -> Self {
        Self::with_config(InstallerConfig::default())
    }

    pub fn with_config(config: InstallerConfig) -> Self {
        Self::with_parts(config, FsProber, TokioRunner)
    }
}

impl Default for DependencyInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: LockfileProber, R: ProcessRunner> DependencyInstaller<P, R> {
    /// Installer with explicit probing and process collaborators
    pub fn with_parts(config: InstallerConfig, prober: P, runner: R) -> Self {
        Self {
            config,
            prober,
            runner,
        }
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Pick yarn when its lock file is present, npm otherwise.
    ///
    /// Not cached: every call probes again, so two consecutive calls can
    /// disagree if the lock file appears or disappears in between.
    pub fn select_package_manager(&self) -> PackageManagerKind {
        let marker = self.config.root.join(&self.config.yarn_lockfile);
        if self.prober.exists(&marker) {
            PackageManagerKind::Yarn
        } else {
            PackageManagerKind::Npm
        }
    }

    /// The command `install_packages` would run right now
    pub fn plan(&self, packages: &[PackageSpec], dev: bool) -> PmCommand {
        build_command(self.select_package_manager(), packages, dev)
    }

    /// Add `packages` to the project and wait for the package manager to exit.
    ///
    /// Spawn failures and non-zero exits are returned as-is; nothing is
    /// retried or rolled back.
    pub async fn install_packages(&self, packages: &[PackageSpec], dev: bool) -> InstallerResult<()> {
        let command = self.plan(packages, dev);
        self.runner.run(&command, &self.config.root).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pm::process::DryRunRunner;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Prober answering from a queue first, then from a fallback flag
    struct ScriptedProber {
        once: Mutex<VecDeque<bool>>,
        fallback: AtomicBool,
    }

    impl ScriptedProber {
        fn new(fallback: bool) -> Self {
            Self {
                once: Mutex::new(VecDeque::new()),
                fallback: AtomicBool::new(fallback),
            }
        }

        fn return_once(&self, value: bool) {
            self.once.lock().unwrap().push_back(value);
        }

        fn set(&self, value: bool) {
            self.fallback.store(value, Ordering::SeqCst);
        }
    }

    impl LockfileProber for ScriptedProber {
        fn exists(&self, _path: &Path) -> bool {
            self.once
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.load(Ordering::SeqCst))
        }
    }

    fn test_packages() -> Vec<PackageSpec> {
        vec![
            PackageSpec::with_version("typescript", "4").unwrap(),
            PackageSpec::new("ts-node").unwrap(),
        ]
    }

    #[test]
    fn test_selection_is_not_memoized() {
        let prober = ScriptedProber::new(false);
        prober.return_once(true);
        let installer =
            DependencyInstaller::with_parts(InstallerConfig::new("/project"), &prober, DryRunRunner::new());

        assert_eq!(installer.select_package_manager(), PackageManagerKind::Yarn);
        assert_eq!(installer.select_package_manager(), PackageManagerKind::Npm);
    }

    #[test]
    fn test_selection_probes_project_root() {
        struct OnlyPath(PathBuf);
        impl LockfileProber for OnlyPath {
            fn exists(&self, path: &Path) -> bool {
                path == self.0
            }
        }

        let config = InstallerConfig::new("/project");
        let yarn = DependencyInstaller::with_parts(
            config.clone(),
            OnlyPath(PathBuf::from("/project/yarn.lock")),
            DryRunRunner::new(),
        );
        assert_eq!(yarn.select_package_manager(), PackageManagerKind::Yarn);

        let elsewhere = DependencyInstaller::with_parts(
            config,
            OnlyPath(PathBuf::from("/other/yarn.lock")),
            DryRunRunner::new(),
        );
        assert_eq!(elsewhere.select_package_manager(), PackageManagerKind::Npm);
    }

    #[test]
    fn test_selection_against_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let installer = DependencyInstaller::with_config(InstallerConfig::new(dir.path()));

        assert_eq!(installer.select_package_manager(), PackageManagerKind::Npm);
        std::fs::write(dir.path().join("yarn.lock"), "").unwrap();
        assert_eq!(installer.select_package_manager(), PackageManagerKind::Yarn);
        std::fs::remove_file(dir.path().join("yarn.lock")).unwrap();
        assert_eq!(installer.select_package_manager(), PackageManagerKind::Npm);
    }

    #[tokio::test]
    async fn test_issues_commands_for_each_manager() {
        let prober = ScriptedProber::new(false);
        let runner = DryRunRunner::new();
        let installer =
            DependencyInstaller::with_parts(InstallerConfig::new("/project"), &prober, runner.clone());
        let packages = test_packages();

        installer.install_packages(&packages, true).await.unwrap();
        installer.install_packages(&packages, false).await.unwrap();

        prober.set(true);
        installer.install_packages(&packages, true).await.unwrap();
        installer.install_packages(&packages, false).await.unwrap();

        let calls: Vec<String> = runner.calls().iter().map(ToString::to_string).collect();
        assert_eq!(
            calls,
            vec![
                "npm install --save-dev typescript@4 ts-node",
                "npm install typescript@4 ts-node",
                "yarn add -D typescript@4 ts-node",
                "yarn add typescript@4 ts-node",
            ]
        );
    }

    #[tokio::test]
    async fn test_runs_in_project_root() {
        let runner = DryRunRunner::new();
        let installer = DependencyInstaller::with_parts(
            InstallerConfig::new("/project"),
            ScriptedProber::new(false),
            runner.clone(),
        );

        installer.install_packages(&[], false).await.unwrap();
        installer.install_packages(&test_packages(), true).await.unwrap();

        let cwds: Vec<PathBuf> = runner.invocations().into_iter().map(|(_, cwd)| cwd).collect();
        assert_eq!(cwds, vec![installer.config().root.clone(); 2]);
        assert_eq!(installer.config().root, PathBuf::from("/project"));
    }

    #[test]
    fn test_custom_yarn_lockfile_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("yarn.lock"), "").unwrap();
        let config = InstallerConfig::new(dir.path()).yarn_lockfile("custom-yarn.lock");
        let installer = DependencyInstaller::with_config(config);

        assert_eq!(installer.config().yarn_lockfile, "custom-yarn.lock");
        assert_eq!(installer.select_package_manager(), PackageManagerKind::Npm);
        std::fs::write(dir.path().join("custom-yarn.lock"), "").unwrap();
        assert_eq!(installer.select_package_manager(), PackageManagerKind::Yarn);
    }

    #[test]
    fn test_package_names_are_trimmed() {
        let spec = PackageSpec::new(" lodash\t").unwrap();
        assert_eq!(spec.token(), "lodash");

        let spec = PackageSpec::with_version(" typescript ", " 4 ").unwrap();
        assert_eq!(spec.token(), "typescript@4");

        let spec: PackageSpec = " react@18 ".parse().unwrap();
        assert_eq!(spec.token(), "react@18");

        assert!(PackageSpec::new("lo dash").is_err());
        // Ranges may contain spaces; the token is passed as a single argument
        let spec = PackageSpec::with_version("lodash", " >=4 <5 ").unwrap();
        assert_eq!(spec.token(), "lodash@>=4 <5");
        assert!(serde_json::from_str::<PackageSpec>(r#"{"name": "   "}"#).is_err());
    }

    #[test]
    fn test_empty_package_list() {
        assert_eq!(
            build_command(PackageManagerKind::Npm, &[], true).to_string(),
            "npm install --save-dev"
        );
        assert_eq!(
            build_command(PackageManagerKind::Yarn, &[], false).to_string(),
            "yarn add"
        );
    }

    #[tokio::test]
    async fn test_runner_failure_propagates() {
        struct Failing;
        impl ProcessRunner for Failing {
            async fn run(&self, command: &PmCommand, _cwd: &Path) -> InstallerResult<()> {
                Err(InstallerError::ProcessExit {
                    command: command.to_string(),
                    code: Some(1),
                })
            }
        }

        let installer =
            DependencyInstaller::with_parts(InstallerConfig::new("/project"), FsProber, Failing);
        let err = installer.install_packages(&test_packages(), false).await.unwrap_err();
        assert!(err.is_process_failure());
    }

    #[test]
    fn test_parse_package_spec() {
        let spec: PackageSpec = "lodash@^4.0.0".parse().unwrap();
        assert_eq!(spec.name(), "lodash");
        assert_eq!(spec.version(), Some("^4.0.0"));

        let spec: PackageSpec = "@types/node@20".parse().unwrap();
        assert_eq!(spec.name(), "@types/node");
        assert_eq!(spec.version(), Some("20"));

        let spec: PackageSpec = "@types/node".parse().unwrap();
        assert_eq!(spec.name(), "@types/node");
        assert_eq!(spec.version(), None);

        let spec: PackageSpec = "react@".parse().unwrap();
        assert_eq!(spec.token(), "react");

        assert!("".parse::<PackageSpec>().is_err());
        assert!("@".parse::<PackageSpec>().is_ok_and(|s| s.name() == "@"));
    }

    #[test]
    fn test_deserialize_package_spec() {
        let spec: PackageSpec =
            serde_json::from_str(r#"{"name": "typescript", "version": "4"}"#).unwrap();
        assert_eq!(spec.token(), "typescript@4");

        let spec: PackageSpec = serde_json::from_str(r#"{"name": "ts-node"}"#).unwrap();
        assert_eq!(spec.token(), "ts-node");

        assert!(serde_json::from_str::<PackageSpec>(r#"{"name": ""}"#).is_err());
        assert!(serde_json::from_str::<PackageSpec>(r#"{"version": "1"}"#).is_err());
    }
}
