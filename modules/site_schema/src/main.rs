//! `site-schema` command line entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sea_orm::DbBackend;
use site_schema::api::native::NativeClient;
use site_schema::domain::{verify_catalog, Catalog, Direction, Service, TenancyPolicy, TracingEventPublisher};
use site_schema::infra::storage::{ddl, SeaOrmSchemaRepository};
use site_schema::{migrations, Config, MigrationApi, MigrationError, RunReport, StepId};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "site-schema", version, about = "Apply and revert site schema migrations")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `database_url` from the configuration
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply every pending step
    Up,
    /// Revert the most recent steps
    Down {
        #[arg(default_value_t = 1)]
        count: usize,
    },
    /// Show applied and pending steps
    Status,
    /// Apply one step; it must be the next one in order
    Apply { step: StepId },
    /// Revert one step; it must be the most recently applied
    Revert { step: StepId },
    /// Check every step's rollback and tenant isolation without a database
    Verify,
    /// Print the DDL of the catalog without touching a database
    Script {
        #[arg(long, value_enum, default_value_t = Backend::Postgres)]
        backend: Backend,
        /// Render the single step that builds the final schema
        #[arg(long)]
        baseline: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    Postgres,
    Sqlite,
}

impl From<Backend> for DbBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Postgres => DbBackend::Postgres,
            Backend::Sqlite => DbBackend::Sqlite,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    site_schema::logging::init(&config.logging)?;

    let catalog = Arc::new(migrations::catalog().context("migration catalog is invalid")?);
    match cli.command {
        Command::Verify => verify(&catalog),
        Command::Script { backend, baseline } => script(&catalog, backend.into(), baseline),
        Command::Status => status(&connect(&config, &catalog).await?, &catalog).await,
        Command::Up => {
            let client = connect(&config, &catalog).await?;
            finish(&client, &catalog, client.up().await).await
        }
        Command::Down { count } => {
            let client = connect(&config, &catalog).await?;
            finish(&client, &catalog, client.down(count).await).await
        }
        Command::Apply { step } => {
            let client = connect(&config, &catalog).await?;
            finish(&client, &catalog, client.apply(step).await).await
        }
        Command::Revert { step } => {
            let client = connect(&config, &catalog).await?;
            finish(&client, &catalog, client.revert(step).await).await
        }
    }
}

async fn connect(config: &Config, catalog: &Arc<Catalog>) -> Result<NativeClient> {
    let db = sea_orm::Database::connect(config.connect_options())
        .await
        .context("failed to connect to database")?;
    let repo = Arc::new(SeaOrmSchemaRepository::new(Arc::new(db)));
    let service = Service::new(catalog.clone(), repo, Arc::new(TracingEventPublisher));
    Ok(NativeClient::new(Arc::new(service)))
}

async fn status(client: &NativeClient, catalog: &Catalog) -> Result<()> {
    let status = client.status().await?;
    for applied in &status.applied {
        println!("applied  {}_{}  at {}", applied.id, applied.name, applied.applied_at);
    }
    for pending in &status.pending {
        println!("pending  {}", pending);
    }
    println!("current version: {}", version(catalog, status.current));
    Ok(())
}

/// Print the outcome of a run; on failure also print where the ledger stopped
async fn finish(
    client: &NativeClient,
    catalog: &Catalog,
    result: Result<RunReport, MigrationError>,
) -> Result<()> {
    match result {
        Ok(report) => {
            print_report(catalog, &report);
            Ok(())
        }
        Err(err) => {
            let current = client.status().await.ok().and_then(|s| s.current);
            eprintln!("migration failed: {}", err);
            eprintln!("current version: {}", version(catalog, current));
            Err(err.into())
        }
    }
}

fn print_report(catalog: &Catalog, report: &RunReport) {
    if report.outcomes.is_empty() {
        println!("nothing to do");
    }
    for outcome in &report.outcomes {
        println!("{}", outcome);
    }
    println!("current version: {}", version(catalog, report.current));
}

fn version(catalog: &Catalog, current: Option<StepId>) -> String {
    match current {
        None => "none (empty schema)".to_string(),
        Some(id) => catalog
            .get(id)
            .map(|step| step.label())
            .unwrap_or_else(|_| id.to_string()),
    }
}

fn verify(catalog: &Catalog) -> Result<()> {
    let report = verify_catalog(catalog, &TenancyPolicy::default()).into_result()?;
    println!("verified {} steps: rollback and tenant isolation hold", report.steps_checked);
    Ok(())
}

fn script(catalog: &Catalog, backend: DbBackend, baseline: bool) -> Result<()> {
    let steps = if baseline {
        vec![catalog.baseline_step()?]
    } else {
        catalog.steps().to_vec()
    };
    for step in &steps {
        println!("-- {}", step.label());
        let plan = ddl::render_step(step, Direction::Up, backend)
            .with_context(|| format!("cannot render {}", step.label()))?;
        for (_, statements) in plan {
            for sql in statements {
                println!("{};", sql);
            }
        }
        println!();
    }
    Ok(())
}
