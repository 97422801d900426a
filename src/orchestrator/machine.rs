//! The routing state machine
//!
//! ```text
//! Start ──classify──▶ Routed(math) ──solve──────────────────────────▶ Done
//!        └──────────▶ Routed(rag)  ──Answered─────────────────────────▶ Done
//!                                  └─Insufficient─▶ FallingBack ─search▶ Done
//! ```
//!
//! No state is revisited, nothing is retried, and at most two handlers run
//! (retrieval, then search). Any capability failure ends the run with the
//! failing stage attached.

use crate::capability::{Generator, Retriever, Searcher};
use crate::error::{RunError, Stage};
use crate::handlers::{HandlerKind, MathHandler, RagHandler, RagOutcome, SearchHandler};
use crate::observability::metrics::{metrics, MetricsCollector};
use crate::orchestrator::context::{QueryContext, RunOutcome};
use crate::routing::{LlmRouter, Route, Router};
use crate::{handler_span, run_span};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

/// Settles a run's metrics exactly once; dropping it unsettled counts a cancellation
struct RunRecord {
    metrics: &'static MetricsCollector,
    started: Instant,
    settled: bool,
}

impl RunRecord {
    fn start(metrics: &'static MetricsCollector) -> Self {
        metrics.run_started();
        Self {
            metrics,
            started: Instant::now(),
            settled: false,
        }
    }

    fn completed(mut self, handler: HandlerKind) -> Duration {
        self.settled = true;
        let elapsed = self.started.elapsed();
        self.metrics.run_completed(handler, elapsed);
        elapsed
    }

    fn failed(mut self, stage: Option<Stage>) {
        self.settled = true;
        self.metrics.run_failed(stage, self.started.elapsed());
    }
}

impl Drop for RunRecord {
    fn drop(&mut self) {
        if !self.settled {
            self.metrics.run_cancelled(self.started.elapsed());
            warn!("Run cancelled before completing");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Start,
    Routed(Route),
    FallingBack,
    Done,
}

/// Routes queries to handlers and drives them to a single answer
///
/// Holds no per-run state; one instance can serve concurrent runs.
pub struct Orchestrator {
    router: Arc<dyn Router>,
    math: MathHandler,
    rag: RagHandler,
    search: SearchHandler,
    metrics: &'static MetricsCollector,
}

impl Orchestrator {
    pub fn new(
        router: Arc<dyn Router>,
        math: MathHandler,
        rag: RagHandler,
        search: SearchHandler,
    ) -> Self {
        Self {
            router,
            math,
            rag,
            search,
            metrics: metrics(),
        }
    }

    /// Wire the standard router and handlers onto three capabilities
    ///
    /// The generator serves classification, math and retrieval answering.
    pub fn from_capabilities(
        generator: Arc<dyn Generator>,
        retriever: Arc<dyn Retriever>,
        searcher: Arc<dyn Searcher>,
    ) -> Self {
        Self::new(
            Arc::new(LlmRouter::new(generator.clone())),
            MathHandler::new(generator.clone()),
            RagHandler::new(retriever, generator),
            SearchHandler::new(searcher),
        )
    }

    /// Number of excerpts retrieval asks for
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.rag = self.rag.with_top_k(top_k);
        self
    }

    /// Record into `collector` instead of the global metrics
    pub fn with_metrics(mut self, collector: &'static MetricsCollector) -> Self {
        self.metrics = collector;
        self
    }

    /// Answer `query`, reporting which handler produced the answer
    ///
    /// Blank queries fail with [`RunError::EmptyQuery`] before anything is
    /// classified.
    pub async fn run(&self, query: &str) -> Result<RunOutcome, RunError> {
        let query = query.trim();
        if query.is_empty() {
            self.metrics.empty_query_rejected();
            return Err(RunError::EmptyQuery);
        }

        let run_id = Uuid::new_v4();
        let span = run_span!(run_id = %run_id, query_len = query.len());

        async {
            let record = RunRecord::start(self.metrics);

            match self.drive(QueryContext::new(query)).await {
                Ok(outcome) => {
                    let elapsed = record.completed(outcome.handler_used);
                    info!(
                        handler_used = %outcome.handler_used,
                        answer_len = outcome.answer.len(),
                        duration_ms = elapsed.as_millis() as u64,
                        "Run completed"
                    );
                    Ok(outcome)
                }
                Err(e) => {
                    record.failed(e.stage());
                    error!(
                        stage = e.stage().map(|s| s.as_str()).unwrap_or("none"),
                        error = %e.sanitized_message(),
                        "Run failed"
                    );
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn drive(&self, mut context: QueryContext) -> Result<RunOutcome, RunError> {
        let mut state = RunState::Start;

        while state != RunState::Done {
            state = self.step(state, &mut context).await?;
        }

        context.into_outcome()
    }

    async fn step(&self, state: RunState, context: &mut QueryContext) -> Result<RunState, RunError> {
        match state {
            RunState::Start => {
                let route = self.router.classify(context.query()).await?;
                info!(route = %route, "Transition: Start -> Routed");
                Ok(RunState::Routed(route))
            }
            RunState::Routed(Route::Math) => {
                let answer = self
                    .math
                    .solve(context.query())
                    .instrument(handler_span!(handler = "math"))
                    .await?;
                context.finish(HandlerKind::Math, answer);
                info!("Transition: Routed(math) -> Done");
                Ok(RunState::Done)
            }
            RunState::Routed(Route::Rag) => {
                let outcome = self
                    .rag
                    .answer_from_context(context.query())
                    .instrument(handler_span!(handler = "rag"))
                    .await?;
                match outcome {
                    RagOutcome::Answered(answer) => {
                        context.finish(HandlerKind::Rag, answer);
                        info!("Transition: Routed(rag) -> Done");
                        Ok(RunState::Done)
                    }
                    RagOutcome::Insufficient => {
                        self.metrics.rag_fallback();
                        info!("Transition: Routed(rag) -> FallingBack");
                        Ok(RunState::FallingBack)
                    }
                }
            }
            RunState::FallingBack => {
                let answer = self
                    .search
                    .search(context.query())
                    .instrument(handler_span!(handler = "search"))
                    .await?;
                context.finish(HandlerKind::Search, answer);
                info!("Transition: FallingBack -> Done");
                Ok(RunState::Done)
            }
            RunState::Done => Ok(RunState::Done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::{MockGenerator, MockRetriever, MockSearcher};

    fn collector() -> &'static MetricsCollector {
        Box::leak(Box::new(MetricsCollector::new()))
    }

    #[tokio::test]
    async fn test_blank_query_rejected_before_routing() {
        let generator = Arc::new(MockGenerator::single_response("math_agent"));
        let metrics = collector();
        let orchestrator = Orchestrator::from_capabilities(
            generator.clone(),
            Arc::new(MockRetriever::empty()),
            Arc::new(MockSearcher::new("unused")),
        )
        .with_metrics(metrics);

        for query in ["", "   ", "\n\t"] {
            assert_eq!(orchestrator.run(query).await, Err(RunError::EmptyQuery));
        }

        assert_eq!(generator.call_count(), 0);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.runs.empty_queries_rejected, 3);
        assert_eq!(snapshot.runs.started, 0);
    }

    #[tokio::test]
    async fn test_metrics_follow_fallback_path() {
        let generator = Arc::new(MockGenerator::default().when("router agent", "rag_agent"));
        let metrics = collector();
        let orchestrator = Orchestrator::from_capabilities(
            generator,
            Arc::new(MockRetriever::empty()),
            Arc::new(MockSearcher::new("from the web")),
        )
        .with_metrics(metrics);

        let outcome = orchestrator.run("what is our refund policy").await.unwrap();

        assert_eq!(outcome.handler_used, HandlerKind::Search);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.runs.completed, 1);
        assert_eq!(snapshot.routing.rag_fallbacks, 1);
        assert_eq!(snapshot.routing.completions_by_handler["search"], 1);
    }

    #[tokio::test]
    async fn test_failure_recorded_with_stage() {
        let generator = Arc::new(MockGenerator::with_failure());
        let metrics = collector();
        let orchestrator = Orchestrator::from_capabilities(
            generator,
            Arc::new(MockRetriever::empty()),
            Arc::new(MockSearcher::new("unused")),
        )
        .with_metrics(metrics);

        let error = orchestrator.run("anything").await.unwrap_err();

        assert_eq!(error.stage(), Some(Stage::Router));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.runs.failed, 1);
        assert_eq!(snapshot.failures_by_stage["router"], 1);
    }

    #[tokio::test]
    async fn test_dropped_run_is_counted_as_cancelled() {
        let generator = Arc::new(MockGenerator::default().when("router agent", "rag_agent"));
        let metrics = collector();
        let orchestrator = Orchestrator::from_capabilities(
            generator,
            Arc::new(MockRetriever::empty()),
            Arc::new(MockSearcher::new("late").with_delay(Duration::from_secs(5))),
        )
        .with_metrics(metrics);

        let result =
            tokio::time::timeout(Duration::from_millis(50), orchestrator.run("refund policy")).await;
        assert!(result.is_err());

        let runs = metrics.snapshot().runs;
        assert_eq!(runs.started, 1);
        assert_eq!(runs.cancelled, 1);
        assert_eq!(runs.completed + runs.failed, 0);

        orchestrator.run("   ").await.unwrap_err();
        assert_eq!(metrics.snapshot().runs.cancelled, 1);
    }

    #[tokio::test]
    async fn test_query_is_trimmed_before_handlers() {
        let generator = Arc::new(MockGenerator::default().when("router agent", "rag_agent"));
        let retriever = Arc::new(MockRetriever::empty());
        let searcher = Arc::new(MockSearcher::new("answer"));
        let orchestrator = Orchestrator::from_capabilities(generator, retriever.clone(), searcher.clone())
            .with_top_k(5)
            .with_metrics(collector());

        orchestrator.run("  refund policy \n").await.unwrap();

        assert_eq!(retriever.requests().await, vec![("refund policy".to_string(), 5)]);
        assert_eq!(searcher.queries().await, vec!["refund policy"]);
    }
}
