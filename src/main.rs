//! recipe - add npm/yarn dependencies directly or through recipe files

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use recipe_installer::pm::{
    DependencyInstaller, DryRunRunner, FsProber, InstallerConfig, LockfileProber, PackageSpec,
    ProcessRunner, TokioRunner,
};
use recipe_installer::recipe::{Recipe, RecipeRunner};

#[derive(Parser)]
#[command(name = "recipe")]
#[command(author, version, about = "Add npm or yarn dependencies to a project")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProjectArgs {
    /// Project root directory (defaults to the current directory)
    #[arg(short, long)]
    root: Option<PathBuf>,
    /// Print the package manager commands instead of running them
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add packages with the project's package manager
    Add {
        /// Package specs (e.g., lodash, express@4.18.0, @types/node@20)
        #[arg(required = true)]
        packages: Vec<String>,
        /// Add as dev dependency
        #[arg(short = 'D', long)]
        dev: bool,
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Run every step of a recipe file (.json or .toml)
    Run {
        /// Recipe file
        recipe: PathBuf,
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Show which package manager the project uses
    Which {
        /// Project root directory
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("recipe_installer=info,recipe=info")),
        )
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Add {
            packages,
            dev,
            project,
        } => add(packages, dev, project).await,
        Commands::Run { recipe, project } => run_recipe(recipe, project).await,
        Commands::Which { root } => {
            which(root);
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

fn config_for(root: Option<PathBuf>) -> InstallerConfig {
    match root {
        Some(root) => InstallerConfig::new(root),
        None => InstallerConfig::default(),
    }
}

/// Add packages given on the command line
async fn add(packages: Vec<String>, dev: bool, project: ProjectArgs) -> Result<()> {
    let specs = packages
        .iter()
        .map(|p| p.parse::<PackageSpec>())
        .collect::<Result<Vec<_>, _>>()
        .into_diagnostic()?;

    let config = config_for(project.root);
    if project.dry_run {
        let installer = DependencyInstaller::with_parts(config, FsProber, DryRunRunner::echoing());
        install(&installer, &specs, dev).await
    } else {
        let installer = DependencyInstaller::with_parts(config, FsProber, TokioRunner);
        install(&installer, &specs, dev).await
    }
}

async fn install<P: LockfileProber, R: ProcessRunner>(
    installer: &DependencyInstaller<P, R>,
    specs: &[PackageSpec],
    dev: bool,
) -> Result<()> {
    let kind = installer.select_package_manager();
    let group = if dev { "dev" } else { "prod" };
    println!(
        "{} {} {}",
        format!("{} ->", kind).cyan().bold(),
        group.dimmed(),
        specs
            .iter()
            .map(PackageSpec::token)
            .collect::<Vec<_>>()
            .join(" ")
    );
    tracing::info!(manager = %kind, dev, count = specs.len(), "adding packages");

    installer.install_packages(specs, dev).await.into_diagnostic()?;

    println!(
        "{}: Added {} packages",
        "Success".green().bold(),
        specs.len()
    );
    Ok(())
}

/// Load a recipe file and run its steps
async fn run_recipe(path: PathBuf, project: ProjectArgs) -> Result<()> {
    let recipe = Recipe::load(&path).into_diagnostic()?;
    println!("{} {}", "recipe".cyan().bold(), recipe.name.bold());
    if let Some(description) = &recipe.description {
        println!("  {}", description.dimmed());
    }

    let config = config_for(project.root);
    let outcome = if project.dry_run {
        let installer = DependencyInstaller::with_parts(config, FsProber, DryRunRunner::echoing());
        RecipeRunner::new(installer).run(&recipe).await
    } else {
        let installer = DependencyInstaller::with_parts(config, FsProber, TokioRunner);
        RecipeRunner::new(installer).run(&recipe).await
    };
    let summary = outcome.into_diagnostic()?;

    println!(
        "{}: {} steps run, {} skipped",
        "Success".green().bold(),
        summary.executed.len(),
        summary.skipped.len()
    );
    for id in &summary.skipped {
        println!("  {} {}", "skipped".yellow(), id);
    }
    Ok(())
}

/// Print the package manager detected for the project
fn which(root: Option<PathBuf>) {
    let installer = DependencyInstaller::with_config(config_for(root));
    println!("{}", installer.select_package_manager());
}
