//! Typed processing steps.

use std::fmt;

use http::StatusCode;

use crate::http::handler::Fault;

/// Which half of request processing a pipeline belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Parsing the request up to and including the handler call.
    Input,
    /// Shaping the handler's response for the transport.
    Output,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Input => f.write_str("input"),
            Phase::Output => f.write_str("output"),
        }
    }
}

/// An explicit, expected refusal to continue processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    status: StatusCode,
    message: Option<String>,
}

impl Rejection {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.status),
            None => write!(f, "{}", self.status),
        }
    }
}

/// Outcome of one action: continue with the output, or stop and hand the
/// (possibly modified) input back with a reason.
#[derive(Debug)]
pub enum Flow<O, I> {
    Continue(O),
    Reject(I, Rejection),
}

/// Result of [`Action::execute`]. `Err` is a fault, not a rejection.
pub type ActionResult<O, I> = Result<Flow<O, I>, Fault>;

/// One named step turning an `I` into an `O`.
///
/// Actions are shared by every request, so they must not keep mutable
/// state across calls; everything they need arrives in `input`.
pub trait Action<I, O>: Send + Sync {
    /// Name used in logs and rejection reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Phase this action is restricted to, if any.
    fn phase(&self) -> Option<Phase> {
        None
    }

    fn execute(&self, input: I) -> ActionResult<O, I>;
}

/// An action made from a closure.
pub struct FnAction<F> {
    name: String,
    phase: Option<Phase>,
    f: F,
}

/// Wrap a closure as an action.
pub fn from_fn<I, O, F>(name: impl Into<String>, f: F) -> FnAction<F>
where
    F: Fn(I) -> ActionResult<O, I> + Send + Sync,
{
    FnAction {
        name: name.into(),
        phase: None,
        f,
    }
}

impl<F> FnAction<F> {
    /// Restrict the action to one phase.
    pub fn in_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }
}

impl<I, O, F> Action<I, O> for FnAction<F>
where
    F: Fn(I) -> ActionResult<O, I> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> Option<Phase> {
        self.phase
    }

    fn execute(&self, input: I) -> ActionResult<O, I> {
        (self.f)(input)
    }
}

impl<F> fmt::Debug for FnAction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
