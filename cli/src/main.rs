//! CLI entrypoint for gatherline
//!
//! Wires the infrastructure adapters into the application layer using
//! dependency injection and runs one automation session per invocation.
//! The hosting task runtime (or operator) is responsible for whole-session
//! retries; ctrl-c maps onto the cooperative soft-timeout signal.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use gatherline_application::ports::content_generator::ContentGenerator;
use gatherline_application::ports::corpus_store::CorpusStore;
use gatherline_application::ports::department_catalog::DepartmentCatalog;
use gatherline_application::ports::evaluation::EvaluationTrigger;
use gatherline_application::ports::event_bus::ProgressPublisher;
use gatherline_application::ports::knowledge_graph::KnowledgeGraph;
use gatherline_application::ports::metrics::MetricsSink;
use gatherline_application::{
    DedupEngine, QualityScorer, RunAutomationUseCase, TaskHandler, TaskRunner,
};
use gatherline_domain::{AutomationRequest, TaskKind};
use gatherline_infrastructure::{
    ChatClient, ConfigLoader, FileConfig, GraphClient, HttpDepartmentCatalog,
    HttpEvaluationTrigger, JsonlCorpusStore, JsonlProgressPublisher, LlmContentGenerator,
    LlmScoringOracle, LlmSimilarityOracle, LogMetricsSink,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gatherline", about = "Automated multi-department gather creation")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Explicit config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one automation session for a project
    Run {
        /// Project identifier
        #[arg(long)]
        project_id: String,

        /// User on whose behalf the session runs
        #[arg(long)]
        user_id: String,

        /// Task id; generated when omitted
        #[arg(long)]
        task_id: Option<String>,

        /// Override the global iteration ceiling
        #[arg(long)]
        max_iterations: Option<u32>,
    },
    /// Check connectivity to the knowledge-graph service
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = ConfigLoader::load(cli.config.as_ref())
        .map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))?;

    match cli.command {
        Command::Health => health(&config).await,
        Command::Run {
            project_id,
            user_id,
            task_id,
            max_iterations,
        } => run(&config, project_id, user_id, task_id, max_iterations).await,
    }
}

async fn health(config: &FileConfig) -> Result<()> {
    let client = GraphClient::new(config.graph.client_config());
    let healthy = client
        .with_connection(|c| async move { Ok(c.health_check().await) })
        .await
        .context("could not reach the knowledge-graph service")?;

    if healthy {
        println!("knowledge graph at {} is healthy", config.graph.addr);
        Ok(())
    } else {
        bail!("knowledge graph at {} is not healthy", config.graph.addr);
    }
}

async fn run(
    config: &FileConfig,
    project_id: String,
    user_id: String,
    task_id: Option<String>,
    max_iterations: Option<u32>,
) -> Result<()> {
    let task_id =
        task_id.unwrap_or_else(|| format!("gather-{}", chrono::Utc::now().timestamp_millis()));

    // === Dependency injection ===
    let graph = Arc::new(GraphClient::new(config.graph.client_config()));
    if let Err(e) = graph.connect().await {
        // Enrichment degrades without the graph; only durable writes would
        // have failed outright, and the runner absorbs those.
        warn!(error = %e, "Knowledge graph unavailable, continuing degraded");
    }

    let chat = || ChatClient::new(config.llm.api_url.clone(), config.llm.api_key.clone());
    let generator = Arc::new(LlmContentGenerator::new(chat()));
    let similarity = Arc::new(LlmSimilarityOracle::new(
        chat(),
        config.llm.utility_model.clone(),
    ));
    let scoring = Arc::new(LlmScoringOracle::new(
        chat(),
        config.llm.utility_model.clone(),
    ));

    let store = Arc::new(JsonlCorpusStore::new(&config.storage.dir));
    let catalog = Arc::new(HttpDepartmentCatalog::new(
        config.catalog.api_url.clone(),
        config.catalog.api_key.clone(),
    ));
    let evaluation = Arc::new(HttpEvaluationTrigger::new(
        config.catalog.api_url.clone(),
        config.catalog.api_key.clone(),
    ));
    let events = Arc::new(JsonlProgressPublisher::new(&config.events.dir));
    let metrics = Arc::new(LogMetricsSink);

    // ctrl-c acts as the cooperative soft-timeout signal
    let cancellation = CancellationToken::new();
    let signal_token = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping at the next iteration boundary");
            signal_token.cancel();
        }
    });

    let use_case = RunAutomationUseCase::new(
        generator as Arc<dyn ContentGenerator>,
        DedupEngine::new(similarity),
        QualityScorer::new(scoring),
        store as Arc<dyn CorpusStore>,
        catalog as Arc<dyn DepartmentCatalog>,
        Arc::clone(&graph) as Arc<dyn KnowledgeGraph>,
        evaluation as Arc<dyn EvaluationTrigger>,
        events as Arc<dyn ProgressPublisher>,
    )
    .with_metrics(Arc::clone(&metrics) as Arc<dyn MetricsSink>)
    .with_cancellation(cancellation)
    .with_soft_budget(Duration::from_secs(config.automation.soft_budget_secs))
    .with_default_model(config.automation.default_model.clone())
    .with_context_limit(config.automation.context_limit);

    let runner = TaskRunner::new(Arc::clone(&graph) as Arc<dyn KnowledgeGraph>)
        .with_metrics(metrics as Arc<dyn MetricsSink>)
        .with_cache_ttl(config.automation.cache_ttl_secs)
        .register(TaskKind::GatherAutomation, Arc::new(use_case) as Arc<dyn TaskHandler>);

    let request = AutomationRequest::new(project_id.as_str(), user_id, task_id)
        .with_max_iterations(max_iterations.unwrap_or(config.automation.max_iterations));

    info!(project = %request.project_id, task_id = %request.task_id, "Session starting");
    let result = runner.run(TaskKind::GatherAutomation, &request).await;
    graph.disconnect().await;

    match result {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(e) => bail!("session failed: {e}"),
    }
}
