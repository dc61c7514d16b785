#![forbid(unsafe_code)]
//! evcent-core library.
//!
//! Eigenvector centrality for a binary adjacency matrix, computed by power
//! iteration. The crate is pure computation: it never touches files, parses
//! text, or prints. Callers hand it a validated [`AdjacencyMatrix`] and
//! consume the per-iteration [`IterationRecord`]s it produces.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums ([`MatrixError`], [`EngineError`]).
//! - **Logging**: `tracing` macros only; the caller installs a subscriber.
//!
//! ```rust
//! use evcent_core::{AdjacencyMatrix, EngineConfig, Termination, run};
//!
//! let triangle = AdjacencyMatrix::from_rows(&[[0_u8, 1, 1], [1, 0, 1], [1, 1, 0]])?;
//! let outcome = run(&triangle, EngineConfig::default(), |_| {})?;
//! assert_eq!(outcome.termination, Termination::Converged);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod eigenvector;
pub mod error;
pub mod linalg;
pub mod matrix;
pub mod vector;

pub use eigenvector::{
    CONVERGENCE_THRESHOLD, CancelToken, EngineConfig, IterationRecord, Outcome, PowerIteration,
    Step, Termination, run,
};
pub use error::{EngineError, MatrixError};
pub use linalg::{l2_norm, multiply, normalize};
pub use matrix::AdjacencyMatrix;
pub use vector::ScoreVector;
