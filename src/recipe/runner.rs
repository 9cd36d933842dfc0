//! Sequential recipe execution

use std::io::Write;

use colored::Colorize;

use super::Recipe;
use super::step::{StepConfig, StepKind};
use crate::pm::{DependencyInstaller, InstallerResult, LockfileProber, ProcessRunner};

/// Outcome of a completed recipe run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ids of the steps that ran
    pub executed: Vec<String>,
    /// Ids of the steps with no matching executor
    pub skipped: Vec<String>,
}

/// Runs recipe steps one at a time, stopping at the first failure
pub struct RecipeRunner<P, R, W> {
    installer: DependencyInstaller<P, R>,
    out: W,
}

impl<P: LockfileProber, R: ProcessRunner> RecipeRunner<P, R, std::io::Stdout> {
    pub fn new(installer: DependencyInstaller<P, R>) -> Self {
        Self::with_output(installer, std::io::stdout())
    }
}

impl<P: LockfileProber, R: ProcessRunner, W: Write> RecipeRunner<P, R, W> {
    /// Runner that writes step banners and messages to `out`
    pub fn with_output(installer: DependencyInstaller<P, R>, out: W) -> Self {
        Self { installer, out }
    }

    pub fn installer(&self) -> &DependencyInstaller<P, R> {
        &self.installer
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub async fn run(&mut self, recipe: &Recipe) -> InstallerResult<RunSummary> {
        tracing::info!(recipe = %recipe.name, steps = recipe.steps.len(), "running recipe");

        let mut summary = RunSummary::default();
        for raw in &recipe.steps {
            let step = StepConfig::from_value(raw)?;
            if self.run_step(&step).await? {
                summary.executed.push(step.id().to_string());
            } else {
                summary.skipped.push(step.id().to_string());
            }
        }

        tracing::info!(
            executed = summary.executed.len(),
            skipped = summary.skipped.len(),
            "recipe finished"
        );
        Ok(summary)
    }

    /// Returns `false` when the step type has no executor
    async fn run_step(&mut self, step: &StepConfig) -> InstallerResult<bool> {
        match &step.kind {
            StepKind::AddDependency {
                packages,
                dev_packages,
            } => {
                self.banner(step)?;
                // Runtime dependencies first, then dev dependencies
                for (group, dev) in [(packages, false), (dev_packages, true)] {
                    if group.is_empty() {
                        continue;
                    }
                    tracing::debug!(step = step.id(), dev, count = group.len(), "installing packages");
                    self.installer.install_packages(group, dev).await?;
                }
                Ok(true)
            }
            StepKind::PrintMessage { message } => {
                self.banner(step)?;
                writeln!(self.out, "{}", message)?;
                Ok(true)
            }
            StepKind::Unknown(_) => {
                tracing::warn!(
                    step = step.id(),
                    step_type = %step.header.step_type,
                    "no executor for step type, skipping"
                );
                Ok(false)
            }
        }
    }

    fn banner(&mut self, step: &StepConfig) -> InstallerResult<()> {
        writeln!(self.out, "{} {}", "==>".cyan().bold(), step.display_name().bold())?;
        if !step.header.explanation.is_empty() {
            writeln!(self.out, "    {}", step.header.explanation.dimmed())?;
        }
        Ok(())
    }
}
