use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use loomwork_adapters::{FakeEmailAdapter, FakeSmsAdapter};
use loomwork_config::EngineConfig;
use loomwork_executor::ExecutorCore;
use loomwork_model::WorkflowDef;
use loomwork_processors::ProcessorRegistry;
use loomwork_scheduler::{enroll_contact, EnrollOutcome, TickScheduler};
use loomwork_store::{ExecutionStore, SqliteStore};

/// loomwork — a persistent, graph-based workflow execution engine.
#[derive(Parser)]
#[command(name = "loomwork")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the SQLite database file (default: ~/.loomwork/loomwork.db)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Path to a JSON engine config file overriding the built-in defaults.
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Apply pending store migrations and exit.
  Migrate,

  /// Whole-graph replace a workflow from a JSON definition file.
  ImportWorkflow {
    /// Path to a `WorkflowDef` JSON document.
    workflow_file: PathBuf,
  },

  /// Manually enroll a contact into a workflow.
  Enroll {
    workflow_id: String,
    contact_id: String,
    /// Enroll even if an active enrollment already exists for this pair.
    #[arg(long)]
    force: bool,
  },

  /// Run the tick scheduler loop until interrupted (Ctrl-C).
  Tick,

  /// Claim and run exactly one tick, then exit (useful for cron-driven
  /// deployments instead of the long-running loop).
  TickOnce,
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();

  let data_dir = cli.data_dir.unwrap_or_else(|| {
    dirs::home_dir()
      .expect("could not determine home directory")
      .join(".loomwork")
  });
  tokio::fs::create_dir_all(&data_dir)
    .await
    .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;
  let database_url = format!("sqlite://{}/loomwork.db", data_dir.display());

  let config = match &cli.config {
    Some(path) => {
      let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
      EngineConfig::from_json(&raw).with_context(|| format!("failed to parse config file: {}", path.display()))?
    }
    None => EngineConfig::default(),
  };

  match cli.command {
    Commands::Migrate => {
      let store = SqliteStore::connect(&database_url).await.context("failed to open store")?;
      store.migrate().await.context("failed to run migrations")?;
      println!("migrations applied");
    }
    Commands::ImportWorkflow { workflow_file } => {
      import_workflow(&database_url, &workflow_file).await?;
    }
    Commands::Enroll {
      workflow_id,
      contact_id,
      force,
    } => {
      enroll(&database_url, &config, &workflow_id, &contact_id, force).await?;
    }
    Commands::Tick => {
      run_tick_loop(&database_url, config).await?;
    }
    Commands::TickOnce => {
      run_tick_once(&database_url, config).await?;
    }
  }

  Ok(())
}

async fn import_workflow(database_url: &str, workflow_file: &PathBuf) -> Result<()> {
  let store = SqliteStore::connect(database_url).await.context("failed to open store")?;

  let raw = tokio::fs::read_to_string(workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;
  let def: WorkflowDef = serde_json::from_str(&raw)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

  let workflow = store.save_workflow(&def).await.context("failed to save workflow")?;
  println!(
    "imported workflow '{}' ({} nodes, {} edges)",
    workflow.workflow_id,
    workflow.nodes.len(),
    workflow.edges.len()
  );
  Ok(())
}

async fn enroll(
  database_url: &str,
  config: &EngineConfig,
  workflow_id: &str,
  contact_id: &str,
  force: bool,
) -> Result<()> {
  let store = SqliteStore::connect(database_url).await.context("failed to open store")?;

  match enroll_contact(&store, workflow_id, contact_id, !force, config.max_attempts as i64)
    .await
    .context("enrollment failed")?
  {
    EnrollOutcome::Enrolled { enrollment, execution } => {
      println!(
        "enrolled contact '{contact_id}' into workflow '{workflow_id}' (enrollment {}, execution {})",
        enrollment.enrollment_id, execution.execution_id
      );
    }
    EnrollOutcome::Skipped => {
      println!("skipped: contact '{contact_id}' already has an active enrollment in '{workflow_id}'");
    }
  }
  Ok(())
}

async fn build_scheduler(database_url: &str, config: EngineConfig) -> Result<Arc<TickScheduler>> {
  let store: Arc<dyn ExecutionStore> = Arc::new(
    SqliteStore::connect(database_url)
      .await
      .context("failed to open store")?,
  );
  let registry = Arc::new(ProcessorRegistry::new());
  // Real provider adapters are out of this crate's scope; the fakes let
  // the engine run end-to-end without live Twilio/SendGrid-equivalent
  // credentials.
  let sms = Arc::new(FakeSmsAdapter::new());
  let email = Arc::new(FakeEmailAdapter::new());
  let executor = Arc::new(ExecutorCore::new(store.clone(), registry, sms, email, config.clone()));
  Ok(Arc::new(TickScheduler::new(store, executor, config)))
}

async fn run_tick_once(database_url: &str, config: EngineConfig) -> Result<()> {
  let scheduler = build_scheduler(database_url, config).await?;
  let results = scheduler.tick().await.context("tick failed")?;
  println!("processed {} execution(s)", results.len());
  for result in results {
    println!("  {} -> {:?} ({} nodes)", result.execution_id, result.outcome, result.nodes_processed);
  }
  Ok(())
}

async fn run_tick_loop(database_url: &str, config: EngineConfig) -> Result<()> {
  let scheduler = build_scheduler(database_url, config).await?;
  let cancel = CancellationToken::new();

  let shutdown = cancel.clone();
  tokio::spawn(async move {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
    shutdown.cancel();
  });

  info!("tick scheduler starting");
  scheduler.run(cancel).await;
  info!("tick scheduler stopped");
  Ok(())
}
