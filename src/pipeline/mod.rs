//! Pipeline engine.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     PipelineBuilder::new(phase)
//!     → .then(action) ...   (types chained at compile time)
//!     → .build()            (phase checked)
//!     → Pipeline shared immutably via Arc
//!
//! Per request:
//!     process(initial)
//!     → action 0 → action 1 → ...
//!     → Completed(output) | Rejected(partial state + reason) | Err(fault)
//! ```
//!
//! # Design Decisions
//! - Rejection is a value, a fault is an `Err`; the two never mix
//! - Actions are stateless across requests, so concurrent `process` calls
//!   need no synchronization

pub mod action;
pub mod chain;
pub mod input;
pub mod output;

pub use action::{from_fn, Action, ActionResult, FnAction, Flow, Phase, Rejection};
pub use chain::{Pipeline, PipelineBuilder, Processed, Rejected};
pub use input::{input_pipeline, InvokeHandler, ParseBody, ParseCookies, ParsePathParams, ParseQuery};
pub use output::{output_pipeline, DefaultHeaders, EncodeBody, FormatBody};

/// Pipeline construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("action {action} belongs to the {found} phase, not {expected}")]
    PhaseMismatch {
        action: String,
        expected: Phase,
        found: Phase,
    },
}
