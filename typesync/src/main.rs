use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use typesync::config::{self, Config, DEFAULT_CONFIG_FILE};
use typesync::db::{validate_schema, DatabaseConnection};
use typesync::utils::{logging::init_logging, write_atomic};
use typesync::{SyncReport, ValidationLevel};

#[derive(Debug, Parser)]
#[command(
    name = "typesync",
    version,
    about = "Generate TypeScript declarations from backend models, blocking breaking changes."
)]
struct Cli {
    /// Configuration file (default: typesync.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model containers to extract: source paths, JSON Schema files or registry names.
    #[arg(long, num_args = 1..)]
    modules: Vec<String>,

    /// Generated declaration file (default: frontend/types/schemas.ts).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Snapshot of the last generated schemas (default: beside the output).
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Breaking-change policy: strict, moderate or lenient.
    #[arg(long, value_name = "LEVEL")]
    validation_level: Option<ValidationLevel>,

    /// Generate even when breaking changes are detected.
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Write the sync report as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Check that the configured database has the expected tables first.
    #[arg(long, default_value_t = false)]
    check_database: bool,

    /// Enable debug logging.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    init_logging(&config.logging, cli.verbose).context("failed to initialise logging")?;

    if cli.check_database {
        let Some(database) = &config.database else {
            bail!("--check-database requires a [database] section in the configuration");
        };
        let connection = DatabaseConnection::connect(database)
            .await
            .context("failed to connect to the database")?;
        validate_schema(&connection, &database.expected_tables)
            .await
            .context("database pre-flight check failed")?;
    }

    let mut synchronizer = typesync::from_config(&config);
    let report = synchronizer.sync(cli.force)?;

    print_summary(&report);

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        write_atomic(path, json.as_bytes())
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    Ok(report.success)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => config::load_from_file(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            config::load_from_file(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("failed to load {}", DEFAULT_CONFIG_FILE))
        }
        None => Ok(Config::default()),
    }
}

/// Command-line flags win over the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if !cli.modules.is_empty() {
        config.models.containers = cli.modules.clone();
    }
    if let Some(output) = &cli.output {
        config.output.path = output.clone();
    }
    if let Some(snapshot) = &cli.snapshot {
        config.output.snapshot_path = Some(snapshot.clone());
    }
    if let Some(level) = cli.validation_level {
        config.validation.level = level;
    }
}

fn print_summary(report: &SyncReport) {
    println!("Schemas processed: {}", report.schemas_processed);
    println!("Changes detected: {}", report.changes.len());
    for change in &report.changes {
        println!("  [{}] {}", change.change_type, change.description);
    }
    println!("Files generated: {}", report.generated_files.len());
    for file in &report.generated_files {
        println!("  {}", file);
    }
    if !report.validation_errors.is_empty() {
        println!("Validation errors: {}", report.validation_errors.len());
        for error in &report.validation_errors {
            println!("  {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "typesync",
            "--modules",
            "src/models",
            "schemas/*.json",
            "--output",
            "web/types.ts",
            "--validation-level",
            "strict",
            "--force",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.models.containers, vec!["src/models", "schemas/*.json"]);
        assert_eq!(config.output.path, PathBuf::from("web/types.ts"));
        assert_eq!(config.validation.level, ValidationLevel::Strict);
        assert!(cli.force);
    }

    #[test]
    fn rejects_unknown_validation_level() {
        assert!(Cli::try_parse_from(["typesync", "--validation-level", "paranoid"]).is_err());
    }
}
