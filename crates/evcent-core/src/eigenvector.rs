//! Eigenvector centrality via power iteration.
//!
//! # Overview
//!
//! Eigenvector centrality scores vertices on the idea that links to
//! high-scoring vertices count for more. The scores are the dominant
//! eigenvector of the adjacency matrix, approximated here by repeatedly
//! multiplying a score vector by the matrix.
//!
//! # Algorithm
//!
//! 1. Start from the all-ones vector with a previous norm of 0.
//! 2. Multiply: `r = M·v`.
//! 3. Take `norm = ‖r‖₂`. A zero norm stops the run as
//!    [`Termination::Degenerate`]; the last normalized record stays the result.
//! 4. Normalize: `v = r / norm` and emit an [`IterationRecord`].
//! 5. Stop as [`Termination::Converged`] once
//!    `|norm - previous_norm| <= CONVERGENCE_THRESHOLD`, otherwise repeat.
//!
//! Convergence tracks the normalization value (the dominant-eigenvalue
//! estimate), not the vectors. Two successive vectors may still differ when
//! the run stops; bipartite graphs such as stars do exactly that.
//!
//! There is no iteration cap unless [`EngineConfig::max_iterations`] is set.
//! A graph whose norm sequence never settles keeps the loop running.
//!
//! # Driving a run
//!
//! [`PowerIteration`] is an iterator over records, suited to streaming an
//! unbounded run. [`run`] drives one to completion and hands each record to
//! an observer closure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::EngineError;
use crate::linalg::{l2_norm, multiply, normalize};
use crate::matrix::AdjacencyMatrix;
use crate::vector::ScoreVector;

/// Largest change in normalization value that still counts as converged.
pub const CONVERGENCE_THRESHOLD: f64 = 0.005;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Cooperative cancellation flag, checked once per iteration boundary.
///
/// Clones share the same flag, so one can be handed to another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop before its next iteration.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Knobs for a single run. The default is an unbounded, uncancellable run.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Stop with [`Termination::IterationLimit`] after this many iterations.
    /// `None` never stops early.
    pub max_iterations: Option<usize>,
    /// Optional cancellation flag.
    pub cancel: Option<CancelToken>,
}

impl EngineConfig {
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// State emitted after each successful iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationRecord {
    /// 1-based iteration number.
    pub iteration: usize,
    /// Norm of `M·v` before normalization.
    pub norm: f64,
    /// Norm from the previous iteration (0 on the first).
    pub previous_norm: f64,
    /// Normalized score vector.
    pub scores: ScoreVector,
}

impl IterationRecord {
    /// `|norm - previous_norm|`.
    #[must_use]
    pub fn delta(&self) -> f64 {
        (self.norm - self.previous_norm).abs()
    }

    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.delta() <= CONVERGENCE_THRESHOLD
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Norm delta fell to the threshold.
    Converged,
    /// `M·v` was the zero vector; no further iteration is possible.
    Degenerate,
    /// [`EngineConfig::max_iterations`] was reached first.
    IterationLimit,
    /// The [`CancelToken`] was set.
    Cancelled,
}

/// Final state of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub termination: Termination,
    /// Iterations attempted, including the one that hit a zero norm.
    pub iterations: usize,
    /// Last successfully normalized record, if any.
    pub last: Option<IterationRecord>,
}

impl Outcome {
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Final scores, if any iteration succeeded.
    #[must_use]
    pub fn scores(&self) -> Option<&ScoreVector> {
        self.last.as_ref().map(|record| &record.scores)
    }
}

/// One advance of the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Record(IterationRecord),
    Done(Termination),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum State {
    Iterating,
    Finished(Termination),
    Failed(EngineError),
}

/// Power-iteration state machine over one matrix.
///
/// Yields `Ok(record)` per iteration and ends once a [`Termination`] is
/// reached, which [`PowerIteration::termination`] then reports. A kernel
/// error is yielded once and ends the iterator.
#[derive(Debug)]
pub struct PowerIteration<'m> {
    matrix: &'m AdjacencyMatrix,
    config: EngineConfig,
    scores: ScoreVector,
    previous_norm: f64,
    iteration: usize,
    last: Option<IterationRecord>,
    state: State,
}

impl<'m> PowerIteration<'m> {
    /// Start from the all-ones vector with a previous norm of 0.
    #[must_use]
    pub fn new(matrix: &'m AdjacencyMatrix, config: EngineConfig) -> Self {
        Self {
            matrix,
            config,
            scores: ScoreVector::ones(matrix.order()),
            previous_norm: 0.0,
            iteration: 0,
            last: None,
            state: State::Iterating,
        }
    }

    /// Resume from an arbitrary vector and previous norm, e.g. a converged
    /// record. Iteration numbering restarts at 1.
    ///
    /// # Errors
    ///
    /// [`EngineError::ShapeMismatch`] if `scores` does not fit the matrix.
    pub fn resume(
        matrix: &'m AdjacencyMatrix,
        config: EngineConfig,
        scores: ScoreVector,
        previous_norm: f64,
    ) -> Result<Self, EngineError> {
        if scores.len() != matrix.order() {
            return Err(EngineError::ShapeMismatch {
                expected: matrix.order(),
                found: scores.len(),
            });
        }
        Ok(Self {
            scores,
            previous_norm,
            ..Self::new(matrix, config)
        })
    }

    /// `Some` once the run has stopped.
    #[must_use]
    pub const fn termination(&self) -> Option<Termination> {
        match self.state {
            State::Finished(termination) => Some(termination),
            State::Iterating | State::Failed(_) => None,
        }
    }

    /// Most recent successfully normalized record.
    #[must_use]
    pub const fn last_record(&self) -> Option<&IterationRecord> {
        self.last.as_ref()
    }

    /// Iterations attempted so far.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iteration
    }

    /// The [`Outcome`] of a finished run; `None` while iterating or after a
    /// kernel error.
    #[must_use]
    pub fn into_outcome(self) -> Option<Outcome> {
        let termination = self.termination()?;
        Some(Outcome {
            termination,
            iterations: self.iteration,
            last: self.last,
        })
    }

    /// Advance the state machine by one iteration.
    ///
    /// After a [`Step::Done`] every further call returns the same `Done`.
    ///
    /// # Errors
    ///
    /// Propagates kernel errors; the engine then stays failed.
    pub fn advance(&mut self) -> Result<Step, EngineError> {
        match &self.state {
            State::Finished(termination) => return Ok(Step::Done(*termination)),
            State::Failed(err) => return Err(err.clone()),
            State::Iterating => {}
        }

        if let Some(termination) = self.stop_condition() {
            return Ok(self.finish(termination));
        }

        self.iteration += 1;
        let product = multiply(self.matrix, &self.scores).map_err(|err| self.fail(err))?;
        let norm = l2_norm(&product);

        if norm == 0.0 {
            warn!(iteration = self.iteration, "zero norm, cannot perform more iterations");
            return Ok(self.finish(Termination::Degenerate));
        }

        let scores = normalize(&product, norm).map_err(|err| self.fail(err))?;
        let record = IterationRecord {
            iteration: self.iteration,
            norm,
            previous_norm: self.previous_norm,
            scores: scores.clone(),
        };
        debug!(
            iteration = record.iteration,
            norm,
            delta = record.delta(),
            "power iteration step"
        );
        trace!(scores = ?record.scores.as_slice());

        self.scores = scores;
        self.previous_norm = norm;
        self.last = Some(record.clone());
        if record.is_converged() {
            self.finish(Termination::Converged);
        }

        Ok(Step::Record(record))
    }

    fn stop_condition(&self) -> Option<Termination> {
        if self
            .config
            .cancel
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
        {
            return Some(Termination::Cancelled);
        }
        match self.config.max_iterations {
            Some(max) if self.iteration >= max => Some(Termination::IterationLimit),
            _ => None,
        }
    }

    fn finish(&mut self, termination: Termination) -> Step {
        debug!(?termination, iterations = self.iteration, "power iteration stopped");
        self.state = State::Finished(termination);
        Step::Done(termination)
    }

    fn fail(&mut self, err: EngineError) -> EngineError {
        self.state = State::Failed(err.clone());
        err
    }
}

impl Iterator for PowerIteration<'_> {
    type Item = Result<IterationRecord, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, State::Failed(_)) {
            return None;
        }
        match self.advance() {
            Ok(Step::Record(record)) => Some(Ok(record)),
            Ok(Step::Done(_)) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// Run power iteration to completion, passing every record to `observer`.
///
/// With the default [`EngineConfig`] this only returns once the run converges
/// or degenerates.
///
/// # Errors
///
/// Kernel errors ([`EngineError`]); none occur for a matrix built through
/// [`AdjacencyMatrix::from_rows`].
#[instrument(skip(matrix, config, observer), fields(order = matrix.order()))]
pub fn run<F>(
    matrix: &AdjacencyMatrix,
    config: EngineConfig,
    mut observer: F,
) -> Result<Outcome, EngineError>
where
    F: FnMut(&IterationRecord),
{
    let mut engine = PowerIteration::new(matrix, config);
    loop {
        match engine.advance()? {
            Step::Record(record) => observer(&record),
            Step::Done(termination) => {
                info!(?termination, iterations = engine.iterations(), "eigenvector centrality done");
                return Ok(Outcome {
                    termination,
                    iterations: engine.iterations(),
                    last: engine.last,
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
