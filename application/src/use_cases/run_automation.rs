//! Automated gather creation - the department orchestrator.
//!
//! Processes every automatable department strictly in sequence. Each
//! department runs a generate -> dedup -> persist -> score loop until its
//! quality threshold is met, the global iteration budget runs out, the
//! generator dries up, or everything it produces is a duplicate. Completed
//! departments cascade their run summaries into the generation context of
//! every later department.
//!
//! Failure policy: errors inside a single iteration are logged and the loop
//! moves on, with two exceptions - the cooperative soft-timeout signal and
//! persistence failures, which abort the session and propagate to the
//! hosting task runtime's retry policy. Whatever happens, exactly one
//! terminal event is published.

use crate::dedup::DedupEngine;
use crate::error::AutomationError;
use crate::ports::content_generator::ContentGenerator;
use crate::ports::corpus_store::CorpusStore;
use crate::ports::department_catalog::DepartmentCatalog;
use crate::ports::evaluation::EvaluationTrigger;
use crate::ports::event_bus::ProgressPublisher;
use crate::ports::knowledge_graph::KnowledgeGraph;
use crate::ports::metrics::{MetricsSink, NoMetrics};
use crate::quality::QualityScorer;
use crate::runner::TaskHandler;
use async_trait::async_trait;
use gatherline_domain::{
    AutomationMetadata, AutomationRequest, ContextItem, DepartmentConfig, DepartmentRunSummary,
    GatherItem, ProgressEvent, SessionCounters, SessionOutcome, SessionStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Model used when neither the department nor the caller picks one.
pub const DEFAULT_MODEL: &str = "anthropic/claude-sonnet-4.5";

/// Default size of the project-wide graph context snapshot.
const DEFAULT_CONTEXT_LIMIT: usize = 50;

/// Outcome of one inner-loop iteration.
enum IterationOutcome {
    Produced { items_created: usize, new_score: f32 },
    /// The generator returned nothing; the department loop ends.
    NoCandidates,
    /// Every candidate was removed by dedup; the department loop ends.
    AllDuplicates,
}

/// Use case driving one automated gather creation session.
pub struct RunAutomationUseCase {
    generator: Arc<dyn ContentGenerator>,
    dedup: DedupEngine,
    scorer: QualityScorer,
    corpus_store: Arc<dyn CorpusStore>,
    catalog: Arc<dyn DepartmentCatalog>,
    graph: Arc<dyn KnowledgeGraph>,
    evaluation: Arc<dyn EvaluationTrigger>,
    events: Arc<dyn ProgressPublisher>,
    metrics: Arc<dyn MetricsSink>,
    cancellation: Option<CancellationToken>,
    soft_budget: Option<Duration>,
    default_model: String,
    context_limit: usize,
}

impl RunAutomationUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        dedup: DedupEngine,
        scorer: QualityScorer,
        corpus_store: Arc<dyn CorpusStore>,
        catalog: Arc<dyn DepartmentCatalog>,
        graph: Arc<dyn KnowledgeGraph>,
        evaluation: Arc<dyn EvaluationTrigger>,
        events: Arc<dyn ProgressPublisher>,
    ) -> Self {
        Self {
            generator,
            dedup,
            scorer,
            corpus_store,
            catalog,
            graph,
            evaluation,
            events,
            metrics: Arc::new(NoMetrics),
            cancellation: None,
            soft_budget: None,
            default_model: DEFAULT_MODEL.to_string(),
            context_limit: DEFAULT_CONTEXT_LIMIT,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Cooperative cancellation signal, polled at iteration boundaries.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Soft time budget for the whole session. The hosting runtime is
    /// expected to enforce a larger hard budget on top.
    pub fn with_soft_budget(mut self, budget: Duration) -> Self {
        self.soft_budget = Some(budget);
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit;
        self
    }

    /// Run one session. Always publishes a terminal event before returning.
    pub async fn execute(
        &self,
        request: &AutomationRequest,
    ) -> Result<SessionOutcome, AutomationError> {
        let deadline = self.soft_budget.map(|budget| Instant::now() + budget);

        info!(
            project = %request.project_id,
            task_id = %request.task_id,
            max_iterations = request.max_iterations,
            "Starting automated gather creation"
        );

        match self.run_session(request, deadline).await {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_soft_timeout() => {
                warn!(
                    project = %request.project_id,
                    task_id = %request.task_id,
                    "Soft time budget exceeded, stopping gracefully"
                );
                self.events
                    .publish(
                        &request.project_id,
                        ProgressEvent::AutomationTimeout {
                            task_id: request.task_id.clone(),
                            message: "Session exceeded its time budget, partial results saved"
                                .to_string(),
                        },
                    )
                    .await;
                Err(e)
            }
            Err(e) => {
                error!(
                    project = %request.project_id,
                    task_id = %request.task_id,
                    error = %e,
                    "Automated gather creation failed"
                );
                self.events
                    .publish(
                        &request.project_id,
                        ProgressEvent::AutomationError {
                            task_id: request.task_id.clone(),
                            error: e.to_string(),
                        },
                    )
                    .await;
                Err(e)
            }
        }
    }

    async fn run_session(
        &self,
        request: &AutomationRequest,
        deadline: Option<Instant>,
    ) -> Result<SessionOutcome, AutomationError> {
        let project = &request.project_id;

        let mut corpus = self
            .corpus_store
            .read(project)
            .await
            .map_err(|e| AutomationError::Persistence(e.to_string()))?;
        info!(project = %project, count = corpus.len(), "Loaded existing gather items");

        let project_context = self.graph.project_context(project, self.context_limit).await;
        info!(
            project = %project,
            context_items = project_context.len(),
            "Loaded graph context"
        );

        let departments = self
            .catalog
            .list_automatable(project)
            .await
            .map_err(|e| AutomationError::Catalog(e.to_string()))?;
        info!(
            project = %project,
            department_count = departments.len(),
            "Loaded departments for automation"
        );

        if departments.is_empty() {
            warn!(project = %project, "No departments eligible for automation");
            let outcome = SessionOutcome::empty();
            self.publish_complete(request, &outcome).await;
            return Ok(outcome);
        }

        self.events
            .publish(
                project,
                ProgressEvent::AutomationStarted {
                    task_id: request.task_id.clone(),
                    departments_count: departments.len(),
                    max_iterations: request.max_iterations,
                },
            )
            .await;

        let mut counters = SessionCounters::new(request.max_iterations);

        for department in &departments {
            if !department.is_automatable() {
                warn!(
                    department = %department.slug,
                    "Skipping department not flagged for automation"
                );
                continue;
            }

            self.check_soft_timeout(deadline)?;

            let summary = self
                .process_department(
                    request,
                    department,
                    &mut corpus,
                    &project_context,
                    &mut counters,
                    deadline,
                )
                .await?;

            self.metrics.incr("departments_processed", 1);
            self.events
                .publish(
                    project,
                    ProgressEvent::DepartmentComplete {
                        department: summary.department.clone(),
                        department_name: summary.name.clone(),
                        quality_score: summary.quality_score,
                        iterations_used: summary.iterations,
                        items_created: summary.items_created,
                        threshold: summary.threshold,
                    },
                )
                .await;
            info!(
                department = %summary.department,
                quality_score = summary.quality_score,
                iterations = summary.iterations,
                items_created = summary.items_created,
                "Department processing complete"
            );

            counters.record_department(summary);
        }

        let outcome = SessionOutcome {
            status: SessionStatus::Completed,
            iterations: counters.total_iterations(),
            departments_processed: counters.processed().len(),
            items_created: counters.items_created(),
            summary: counters.into_summaries(),
            message: None,
        };

        self.publish_complete(request, &outcome).await;
        info!(
            project = %project,
            task_id = %request.task_id,
            total_iterations = outcome.iterations,
            departments_processed = outcome.departments_processed,
            items_created = outcome.items_created,
            "Automated gather creation complete"
        );

        Ok(outcome)
    }

    async fn process_department(
        &self,
        request: &AutomationRequest,
        department: &DepartmentConfig,
        corpus: &mut Vec<GatherItem>,
        project_context: &[ContextItem],
        counters: &mut SessionCounters,
        deadline: Option<Instant>,
    ) -> Result<DepartmentRunSummary, AutomationError> {
        let project = &request.project_id;
        let threshold = department.threshold();
        let model = department.model_or(&self.default_model).to_string();

        info!(
            department = %department.slug,
            department_name = %department.name,
            department_number = department.number,
            threshold,
            model = %model,
            "Processing department"
        );

        self.events
            .publish(
                project,
                ProgressEvent::DepartmentStarted {
                    department: department.slug.clone(),
                    department_name: department.name.clone(),
                    department_number: department.number,
                    threshold,
                    model: model.clone(),
                    total_iterations: counters.total_iterations(),
                },
            )
            .await;

        let mut department_iterations: u32 = 0;
        let mut department_items: usize = 0;

        // The pre-existing corpus may already clear the bar; score it before
        // the first generation call.
        let mut quality_score = self
            .scorer
            .score(department, &department_corpus(corpus, &department.slug))
            .await;

        while quality_score < threshold && counters.can_iterate() {
            self.check_soft_timeout(deadline)?;

            let result = self
                .run_iteration(
                    request,
                    department,
                    corpus,
                    project_context,
                    counters,
                    quality_score,
                    &model,
                    department_iterations,
                )
                .await;

            match result {
                Ok(IterationOutcome::Produced {
                    items_created,
                    new_score,
                }) => {
                    department_items += items_created;
                    quality_score = new_score;
                    department_iterations += 1;
                    counters.record_iteration();
                    counters.record_items(items_created);
                    self.metrics.incr("iterations", 1);
                    self.metrics.incr("items_created", items_created as u64);
                    self.metrics.observe("quality_score", quality_score as f64);

                    self.events
                        .publish(
                            project,
                            ProgressEvent::IterationComplete {
                                department: department.slug.clone(),
                                department_name: department.name.clone(),
                                iteration: department_iterations,
                                total_iterations: counters.total_iterations(),
                                quality_score,
                                items_created,
                                threshold,
                                max_iterations: request.max_iterations,
                            },
                        )
                        .await;
                    info!(
                        department = %department.slug,
                        iteration = department_iterations,
                        quality_score,
                        items_created,
                        "Iteration complete"
                    );
                }
                Ok(IterationOutcome::NoCandidates) => {
                    warn!(
                        department = %department.slug,
                        iteration = department_iterations + 1,
                        "No new items generated"
                    );
                    break;
                }
                Ok(IterationOutcome::AllDuplicates) => {
                    info!(
                        department = %department.slug,
                        "All items were duplicates, stopping iteration"
                    );
                    break;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(
                        department = %department.slug,
                        iteration = department_iterations + 1,
                        error = %e,
                        "Error in iteration, skipping"
                    );
                    self.metrics.incr("iteration_errors", 1);
                }
            }
        }

        // Department finished; downstream evaluation is fire-and-forget.
        if !self.evaluation.trigger(project, department.number).await {
            warn!(
                department = %department.slug,
                "Failed to trigger department evaluation"
            );
        }

        Ok(DepartmentRunSummary {
            department: department.slug.clone(),
            name: department.name.clone(),
            number: department.number,
            quality_score,
            iterations: department_iterations,
            items_created: department_items,
            threshold,
            model,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_iteration(
        &self,
        request: &AutomationRequest,
        department: &DepartmentConfig,
        corpus: &mut Vec<GatherItem>,
        project_context: &[ContextItem],
        counters: &SessionCounters,
        quality_score: f32,
        model: &str,
        department_iterations: u32,
    ) -> Result<IterationOutcome, AutomationError> {
        let project = &request.project_id;

        // Context = current corpus + project snapshot + department snapshot;
        // the cascade of prior department summaries travels separately.
        let department_context = self
            .graph
            .department_context(project, &department.slug)
            .await;
        let mut context: Vec<ContextItem> = corpus.iter().map(ContextItem::from).collect();
        context.extend_from_slice(project_context);
        context.extend(department_context);

        let candidates = self
            .generator
            .generate(department, &context, counters.processed(), model)
            .await
            .map_err(|e| AutomationError::Generation(e.to_string()))?;
        debug!(
            department = %department.slug,
            new_items_count = candidates.len(),
            "Generated content batch"
        );

        if candidates.is_empty() {
            return Ok(IterationOutcome::NoCandidates);
        }

        self.events
            .publish(
                project,
                ProgressEvent::Deduplicating {
                    department: department.slug.clone(),
                    department_name: department.name.clone(),
                    items_to_check: candidates.len(),
                },
            )
            .await;

        let department_items = department_corpus(corpus, &department.slug);
        let survivors = self.dedup.deduplicate(candidates, &department_items).await;
        if survivors.is_empty() {
            return Ok(IterationOutcome::AllDuplicates);
        }

        let metadata = AutomationMetadata {
            task_id: request.task_id.clone(),
            department: department.slug.clone(),
            department_name: department.name.clone(),
            department_number: department.number,
            iteration: department_iterations + 1,
            quality_score,
            model: model.to_string(),
            based_on_nodes: Vec::new(),
        };

        let saved = self
            .corpus_store
            .write(project, &survivors, &metadata)
            .await
            .map_err(|e| AutomationError::Persistence(e.to_string()))?;

        // Best-effort graph indexing; a failure here never breaks the loop.
        if !self.graph.index_items(project, &saved, department).await {
            warn!(
                department = %department.slug,
                count = saved.len(),
                "Failed to index items in knowledge graph"
            );
        }

        let items_created = saved.len();
        corpus.extend(saved);

        let new_score = self
            .scorer
            .score(department, &department_corpus(corpus, &department.slug))
            .await;

        Ok(IterationOutcome::Produced {
            items_created,
            new_score,
        })
    }

    async fn publish_complete(&self, request: &AutomationRequest, outcome: &SessionOutcome) {
        self.events
            .publish(
                &request.project_id,
                ProgressEvent::AutomationComplete {
                    task_id: request.task_id.clone(),
                    total_iterations: outcome.iterations,
                    departments_processed: outcome.departments_processed,
                    items_created: outcome.items_created,
                    summary: outcome.summary.clone(),
                },
            )
            .await;
    }

    fn check_soft_timeout(&self, deadline: Option<Instant>) -> Result<(), AutomationError> {
        if let Some(token) = &self.cancellation
            && token.is_cancelled()
        {
            return Err(AutomationError::SoftTimeout);
        }
        if let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            return Err(AutomationError::SoftTimeout);
        }
        Ok(())
    }
}

#[async_trait]
impl TaskHandler for RunAutomationUseCase {
    async fn execute(&self, request: &AutomationRequest) -> Result<SessionOutcome, AutomationError> {
        RunAutomationUseCase::execute(self, request).await
    }
}

/// Clone the slice of the corpus belonging to one department.
fn department_corpus(corpus: &[GatherItem], slug: &str) -> Vec<GatherItem> {
    corpus
        .iter()
        .filter(|item| item.in_department(slug))
        .cloned()
        .collect()
}
