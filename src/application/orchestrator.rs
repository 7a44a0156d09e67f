//! Composition root driving the decision loop.
//!
//! One iteration is strictly sequential:
//! heartbeat → liveness check → propose → learn → rank → choose → execute →
//! record outcome → periodic checkpoint.
//!
//! Only the diagnostic checks run concurrently, as background tasks owned by
//! the [`DiagnosticDispatcher`].

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Config, DiagnosticContext, DiagnosticResult, Heartbeat, IterationSummary, LoopState,
    OutcomeRecord, ProgressSnapshot, StateChange, StateChangeKind, TaskContext, WeightVector,
};
use crate::domain::ports::{
    CandidateSource, CheckpointRepository, DiagnosticOracle, ExecutionResult, OutcomeRepository,
    ToolExecutor,
};
use crate::infrastructure::config::ConfigLoader;
use crate::services::{Choice, DecisionEngine, DiagnosticDispatcher, ProgressTracker, WeightLearner};

/// External collaborators the loop talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub candidates: Arc<dyn CandidateSource>,
    pub executor: Arc<dyn ToolExecutor>,
    pub oracle: Arc<dyn DiagnosticOracle>,
    pub outcomes: Arc<dyn OutcomeRepository>,
    pub checkpoints: Arc<dyn CheckpointRepository>,
}

/// What one completed iteration did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationReport {
    pub iteration: u64,
    pub task_category: String,
    pub weights: WeightVector,
    pub choice: Choice,
    pub execution: ExecutionResult,
    pub record_id: Uuid,
    /// Set when a diagnostic check was started at the top of this iteration.
    pub diagnostic_started: Option<String>,
    /// A diagnostic result that became available during this iteration.
    pub diagnostic: Option<DiagnosticResult>,
    pub checkpoint_id: Option<Uuid>,
}

impl IterationReport {
    pub fn chosen_candidate(&self) -> &str {
        &self.choice.chosen.next_step().id
    }
}

/// Outcome of [`Orchestrator::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub iterations: u64,
    pub goal_reached: bool,
    pub failed_iterations: u64,
    pub reports: Vec<IterationReport>,
    pub final_checkpoint: Option<Uuid>,
}

/// Result of the liveness step at the top of an iteration.
#[derive(Default)]
struct LivenessStep {
    started: Option<String>,
    result: Option<DiagnosticResult>,
}

/// Drives the decision loop for one session.
pub struct Orchestrator {
    session_id: String,
    config: Config,
    collaborators: Collaborators,
    engine: DecisionEngine,
    learner: WeightLearner,
    tracker: ProgressTracker,
    dispatcher: DiagnosticDispatcher,
    state: LoopState,
    pending_check: Option<String>,
}

impl Orchestrator {
    /// Build a fresh session. Unusable configuration fails here, before any work.
    pub fn new(
        session_id: impl Into<String>,
        config: Config,
        collaborators: Collaborators,
    ) -> DomainResult<Self> {
        ConfigLoader::validate(&config)?;
        let engine = DecisionEngine::new(config.decision.clone())?;
        let tracker = ProgressTracker::new(config.progress.clone())?;
        let dispatcher =
            DiagnosticDispatcher::new(Arc::clone(&collaborators.oracle), config.diagnostics.clone())?;
        let learner = WeightLearner::new(Arc::clone(&collaborators.outcomes), config.learning.clone());

        Ok(Self {
            session_id: session_id.into(),
            config,
            collaborators,
            engine,
            learner,
            tracker,
            dispatcher,
            state: LoopState::default(),
            pending_check: None,
        })
    }

    /// Rebuild a session from a checkpoint, with the configuration it was saved with.
    pub async fn resume(checkpoint_id: Uuid, collaborators: Collaborators) -> DomainResult<Self> {
        let checkpoint = collaborators.checkpoints.load(checkpoint_id).await?;
        info!(
            checkpoint_id = %checkpoint_id,
            session_id = %checkpoint.session_id,
            iteration = checkpoint.state.iteration,
            "resuming from checkpoint"
        );
        let mut orchestrator = Self::new(checkpoint.session_id, checkpoint.config, collaborators)?;
        orchestrator.state = checkpoint.state;
        Ok(orchestrator)
    }

    /// Resume from the most recent checkpoint of a session, if there is one.
    pub async fn resume_latest(session_id: &str, collaborators: Collaborators) -> DomainResult<Option<Self>> {
        match collaborators.checkpoints.latest(session_id).await? {
            Some(checkpoint) => Self::resume(checkpoint.id, collaborators).await.map(Some),
            None => Ok(None),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn state(&self) -> &LoopState {
        &self.state
    }

    pub const fn learner(&self) -> &WeightLearner {
        &self.learner
    }

    pub const fn dispatcher(&self) -> &DiagnosticDispatcher {
        &self.dispatcher
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.tracker.status()
    }

    /// One full decision cycle.
    ///
    /// Errors are scoped to this iteration unless
    /// [`DomainError::is_fatal_to_session`] says otherwise. A failed outcome
    /// append is always returned: the iteration does not count as done.
    #[instrument(skip(self, task), fields(category = %task.category))]
    pub async fn run_iteration(&mut self, task: &mut TaskContext) -> DomainResult<IterationReport> {
        self.state.iteration += 1;
        let iteration = self.state.iteration;
        self.tracker.heartbeat(Heartbeat::new(iteration, "propose"));

        let liveness = self.check_liveness(iteration, task).await;

        let proposal = self.collaborators.candidates.propose(task).await?;
        let paths = proposal.into_paths()?;
        self.tracker.state_change(StateChange::new(
            StateChangeKind::PlanProduced,
            format!("{} path(s)", paths.len()),
        ));

        let weights = self.learner.learn(&task.category).await;
        let ranked = self.engine.rank(&paths, &weights)?;
        let choice = self.engine.choose(&ranked)?;
        self.tracker.state_change(StateChange::new(
            StateChangeKind::DecisionMade,
            choice.chosen.inputs.path_id.clone(),
        ));

        self.tracker.heartbeat(Heartbeat::new(iteration, "execute"));
        let step = choice.chosen.next_step();
        let execution = self.collaborators.executor.execute(step, task).await?;
        self.tracker.state_change(StateChange::new(StateChangeKind::ToolInvocation, step.id.clone()));

        let mut record = OutcomeRecord::new(
            task.category.clone(),
            step.id.clone(),
            weights,
            choice.chosen.components,
            choice.chosen.overall_score,
            execution.outcome(),
        )
        .with_execution(execution.iterations_used, execution.elapsed_ms);
        if let Some(reason) = &execution.failure_reason {
            record = record.with_failure_reason(reason.clone());
        }

        self.collaborators.outcomes.append(&record).await?;
        self.learner.invalidate(&task.category).await;
        self.tracker.state_change(StateChange::new(
            StateChangeKind::OutcomeRecorded,
            record.outcome.as_str(),
        ));

        self.state.history.push(IterationSummary {
            iteration,
            task_category: task.category.clone(),
            candidate_id: step.id.clone(),
            outcome: record.outcome,
            overall_score: record.overall_score,
            recorded_at: record.timestamp,
        });
        self.state.weights.insert(task.category.clone(), weights);

        if let Some(reason) = &execution.failure_reason {
            task.add_note(format!("iteration {iteration}: '{}' failed: {reason}", step.id));
        }

        info!(
            iteration,
            candidate = %step.id,
            outcome = record.outcome.as_str(),
            score = record.overall_score,
            goal_reached = execution.goal_reached,
            "iteration complete"
        );

        let checkpoint_id = self.maybe_checkpoint(iteration).await;
        let diagnostic = match liveness.result {
            Some(result) => Some(result),
            None => self.collect_pending_result(task).await,
        };

        Ok(IterationReport {
            iteration,
            task_category: task.category.clone(),
            weights,
            choice,
            execution,
            record_id: record.id,
            diagnostic_started: liveness.started,
            diagnostic,
            checkpoint_id,
        })
    }

    /// Loop until the executor reports the goal reached or `max_iterations` pass.
    ///
    /// Iteration-scoped errors are logged and the loop moves on; session-fatal
    /// errors end the run. A final checkpoint is written on the way out.
    pub async fn run(&mut self, mut task: TaskContext, max_iterations: u64) -> DomainResult<RunSummary> {
        let mut summary = RunSummary {
            iterations: 0,
            goal_reached: false,
            failed_iterations: 0,
            reports: Vec::new(),
            final_checkpoint: None,
        };

        while summary.iterations < max_iterations {
            summary.iterations += 1;
            match self.run_iteration(&mut task).await {
                Ok(report) => {
                    let done = report.execution.goal_reached;
                    summary.reports.push(report);
                    if done {
                        summary.goal_reached = true;
                        break;
                    }
                }
                Err(e) if e.is_fatal_to_session() => return Err(e),
                Err(e) => {
                    summary.failed_iterations += 1;
                    warn!(
                        session_id = %self.session_id,
                        iteration = self.state.iteration,
                        error = %e,
                        "iteration failed"
                    );
                    task.add_note(format!("iteration {} failed: {e}", self.state.iteration));
                }
            }
        }

        summary.final_checkpoint = match self.checkpoint().await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "final checkpoint failed");
                None
            }
        };
        info!(
            session_id = %self.session_id,
            iterations = summary.iterations,
            goal_reached = summary.goal_reached,
            failed_iterations = summary.failed_iterations,
            "run finished"
        );
        Ok(summary)
    }

    /// Save a checkpoint now.
    pub async fn checkpoint(&mut self) -> DomainResult<Uuid> {
        let id = self
            .collaborators
            .checkpoints
            .save(&self.session_id, &self.state, &self.config, None)
            .await?;
        self.tracker
            .state_change(StateChange::new(StateChangeKind::CheckpointSaved, id.to_string()));
        Ok(id)
    }

    async fn maybe_checkpoint(&mut self, iteration: u64) -> Option<Uuid> {
        let interval = self.config.checkpoint.interval_iterations;
        if interval == 0 || iteration % interval != 0 {
            return None;
        }
        match self.checkpoint().await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(session_id = %self.session_id, iteration, error = %e, "periodic checkpoint failed");
                None
            }
        }
    }

    /// Collect a finished diagnostic, or start one if the loop looks stuck.
    async fn check_liveness(&mut self, iteration: u64, task: &mut TaskContext) -> LivenessStep {
        let mut step = LivenessStep {
            result: self.collect_pending_result(task).await,
            ..Default::default()
        };
        if self.pending_check.is_some() || !self.tracker.is_stuck() {
            return step;
        }

        let check_id = format!("{}-{iteration}", self.session_id);
        let (recent_heartbeats, recent_state_changes) = self.tracker.recent(self.config.progress.stuck_threshold);
        let context = DiagnosticContext {
            session_id: self.session_id.clone(),
            iteration,
            task_description: task.description.clone(),
            recent_heartbeats,
            recent_state_changes,
        };

        warn!(
            session_id = %self.session_id,
            iteration,
            check_id = %check_id,
            stuck_threshold = self.config.progress.stuck_threshold,
            "no state change across recent heartbeats, loop appears stuck"
        );
        if self.dispatcher.start_check(&check_id, context).await {
            self.pending_check = Some(check_id.clone());
            step.started = Some(check_id);
            if step.result.is_none() {
                step.result = self.collect_pending_result(task).await;
            }
        }
        step
    }

    async fn collect_pending_result(&mut self, task: &mut TaskContext) -> Option<DiagnosticResult> {
        let check_id = self.pending_check.clone()?;
        let result = self.dispatcher.poll_result(&check_id).await?;
        self.pending_check = None;

        debug!(check_id = %check_id, verdict = result.verdict.as_str(), "diagnostic collected");
        if result.verdict.requires_intervention() {
            task.add_note(format!(
                "diagnostic {} at {}: {}{}",
                check_id,
                Utc::now().to_rfc3339(),
                result.verdict.as_str(),
                result
                    .explanation
                    .as_deref()
                    .map(|e| format!(" ({e})"))
                    .unwrap_or_default()
            ));
            // Start a fresh observation window after changing course.
            self.tracker.reset();
        }
        Some(result)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("session_id", &self.session_id)
            .field("iteration", &self.state.iteration)
            .field("pending_check", &self.pending_check)
            .finish_non_exhaustive()
    }
}
