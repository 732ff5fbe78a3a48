//! Compliancy - pipeline compliance gate CLI
//!
//! The `compliancy` command inspects a pipeline run the way the gate sees it.
//!
//! ## Commands
//!
//! - `resolve`: Enrich a run and print its run context
//! - `gate`: Enrich a run and report the production-stage gate decision
//!
//! Azure DevOps access is configured through `AZDO_BASE_URL`,
//! `AZDO_RELEASE_URL`, `AZDO_EXTMGMT_URL` and `AZDO_TOKEN`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use compliancy_azdo::AzdoClient;
use compliancy_core::telemetry::init_tracing;
use compliancy_core::{
    production_stage_ids, registrations_for_run, GateConfig, PipelineClassification,
    PipelineKind, RunContext, RunRequest, RunResolver,
};
use compliancy_state::{
    ClassificationSnapshotStore, DeviationRepository, JsonFileStore, PipelineRegistration,
    RegistrationRepository,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "compliancy")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pipeline compliance gate", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Gate configuration file (JSON)
    #[arg(long, global = true, env = "COMPLIANCY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Identifies the run the gate was invoked for.
#[derive(Args, Debug)]
struct RunArgs {
    /// Azure DevOps organization
    #[arg(long, env = "AZDO_ORGANIZATION")]
    organization: String,

    /// Project id
    #[arg(long)]
    project: String,

    /// Release id (classic releases) or build id
    #[arg(long)]
    run: String,

    /// Stage the gate is invoked for
    #[arg(long)]
    stage: String,

    /// `release` for classic releases, anything else for builds
    #[arg(long, default_value = "build")]
    pipeline_type: String,
}

impl RunArgs {
    fn request(&self) -> RunRequest {
        RunRequest {
            organization: self.organization.clone(),
            project_id: self.project.clone(),
            run_id: self.run.clone(),
            stage_id: self.stage.clone(),
            pipeline_type: self.pipeline_type.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a pipeline run and print its run context as JSON
    Resolve {
        #[command(flatten)]
        run: RunArgs,

        /// Read classification snapshots from a store file instead of extension data
        #[arg(long, env = "COMPLIANCY_STORE")]
        store: Option<PathBuf>,
    },

    /// Report the production-stage gate decision and rule profile for a run
    Gate {
        #[command(flatten)]
        run: RunArgs,

        /// Store file with registrations, deviations and classification snapshots
        #[arg(long, env = "COMPLIANCY_STORE")]
        store: PathBuf,
    },
}

/// What the gate decided for one run, before any rule is evaluated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GateDecision {
    run_id: String,
    stage_id: String,
    pipeline_kind: PipelineKind,
    pipeline_id: String,
    classification: Option<PipelineClassification>,
    is_production: bool,
    production_stages: BTreeSet<String>,
    profile: String,
    ci_identifiers: Vec<String>,
    deviations: usize,
    checked_at: DateTime<Utc>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = Arc::new(load_config(cli.config.as_deref())?);

    match cli.command {
        Commands::Resolve { run, store } => cmd_resolve(config, &run, store.as_deref()).await,
        Commands::Gate { run, store } => cmd_gate(config, &run, &store).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<GateConfig> {
    match path {
        Some(path) => GateConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(GateConfig::default()),
    }
}

fn open_store(path: &Path) -> Result<JsonFileStore> {
    JsonFileStore::open(path)
        .with_context(|| format!("Failed to open store {}", path.display()))
}

fn azdo_client() -> Result<Arc<AzdoClient>> {
    let client = AzdoClient::from_env().context("Failed to create Azure DevOps client")?;
    Ok(Arc::new(client))
}

async fn cmd_resolve(config: Arc<GateConfig>, run: &RunArgs, store: Option<&Path>) -> Result<()> {
    let client = azdo_client()?;
    let snapshots: Arc<dyn ClassificationSnapshotStore> = match store {
        Some(path) => Arc::new(open_store(path)?),
        None => Arc::clone(&client) as Arc<dyn ClassificationSnapshotStore>,
    };

    let ctx = RunResolver::new(client, snapshots, config)
        .resolve(&run.request())
        .await
        .with_context(|| format!("Failed to resolve run {}", run.run))?;

    println!("{}", serde_json::to_string_pretty(&ctx)?);
    Ok(())
}

async fn cmd_gate(config: Arc<GateConfig>, run: &RunArgs, store: &Path) -> Result<()> {
    let store = Arc::new(open_store(store)?);
    let client = azdo_client()?;

    let ctx = RunResolver::new(client, store.clone(), Arc::clone(&config))
        .resolve(&run.request())
        .await
        .with_context(|| format!("Failed to resolve run {}", run.run))?;

    let registrations = store
        .registrations(&ctx.organization, &ctx.project_id)
        .await
        .context("Failed to read registrations")?;
    let deviations = store
        .deviations(&ctx.organization, &ctx.project_id)
        .await
        .context("Failed to read deviations")?
        .map_or(0, |d| d.len());

    let decision = gate_decision(&ctx, &registrations, &config, deviations, Utc::now());
    info!(
        run_id = %decision.run_id,
        is_production = decision.is_production,
        profile = %decision.profile,
        "gate decision"
    );

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn gate_decision(
    ctx: &RunContext,
    registrations: &[PipelineRegistration],
    config: &GateConfig,
    deviations: usize,
    checked_at: DateTime<Utc>,
) -> GateDecision {
    let own = registrations_for_run(ctx, registrations);
    let pipeline_id = ctx.pipeline_id();
    let production_stages = production_stage_ids(&own, ctx.pipeline_kind(), &pipeline_id);
    let is_production = compliancy_core::is_production_run(ctx, &own);
    let catalog = config.profile_catalog();

    GateDecision {
        run_id: ctx.run_id.clone(),
        stage_id: ctx.stage_id.clone(),
        pipeline_kind: ctx.pipeline_kind(),
        pipeline_id,
        classification: ctx.classification,
        is_production,
        production_stages,
        profile: catalog.select(&own).name.clone(),
        ci_identifiers: own.iter().map(|r| r.ci_identifier.clone()).collect(),
        deviations,
        checked_at,
    }
}
