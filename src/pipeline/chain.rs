//! Pipeline construction and execution.
//!
//! # Responsibilities
//! - Chain actions so each one's output type is the next one's input type
//! - Reject actions declared for the other phase at build time
//! - Run actions in order, stopping at the first rejection
//!
//! # Design Decisions
//! - The builder is type-state: `then` only accepts an action whose input
//!   is the current output type, so a broken chain does not compile
//! - Actions are stored type-erased; the builder guarantees every downcast
//! - Faults propagate untouched; only rejections are reported as outcomes

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;

use crate::http::handler::Fault;
use crate::pipeline::action::{Action, Flow, Phase, Rejection};
use crate::pipeline::PipelineError;

type State = Box<dyn Any + Send>;

trait ErasedAction: Send + Sync {
    fn name(&self) -> &str;
    fn phase(&self) -> Option<Phase>;
    fn execute(&self, input: State) -> Result<Flow<State, State>, Fault>;
}

struct Typed<A, I, O> {
    action: A,
    _types: PhantomData<fn(I) -> O>,
}

impl<A, I, O> ErasedAction for Typed<A, I, O>
where
    A: Action<I, O>,
    I: Send + 'static,
    O: Send + 'static,
{
    fn name(&self) -> &str {
        self.action.name()
    }

    fn phase(&self) -> Option<Phase> {
        self.action.phase()
    }

    fn execute(&self, input: State) -> Result<Flow<State, State>, Fault> {
        let input = input.downcast::<I>().map_err(|_| {
            anyhow::anyhow!(
                "action {} expected {} as input",
                self.action.name(),
                type_name::<I>()
            )
        })?;

        Ok(match self.action.execute(*input)? {
            Flow::Continue(output) => Flow::Continue(Box::new(output)),
            Flow::Reject(state, rejection) => Flow::Reject(Box::new(state), rejection),
        })
    }
}

struct Step {
    action: Box<dyn ErasedAction>,
    input: &'static str,
    output: &'static str,
}

/// An ordered, immutable chain of actions from `I` to `O`.
pub struct Pipeline<I, O> {
    phase: Phase,
    steps: Vec<Step>,
    _types: PhantomData<fn(I) -> O>,
}

/// Outcome of [`Pipeline::process`].
#[derive(Debug)]
pub enum Processed<O> {
    Completed(O),
    Rejected(Rejected),
}

/// A pipeline that stopped early.
pub struct Rejected {
    /// Name of the rejecting action.
    pub action: String,
    /// Position of the rejecting action in the pipeline.
    pub index: usize,
    pub rejection: Rejection,
    state: State,
}

impl Rejected {
    /// The state as the rejecting action left it, if it is a `T`.
    pub fn state<T: 'static>(&self) -> Option<&T> {
        self.state.downcast_ref::<T>()
    }

    pub fn into_state<T: 'static>(self) -> Option<T> {
        self.state.downcast::<T>().ok().map(|state| *state)
    }
}

impl fmt::Debug for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("action", &self.action)
            .field("index", &self.index)
            .field("rejection", &self.rejection)
            .finish_non_exhaustive()
    }
}

impl<I, O> Pipeline<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Run every action in order.
    ///
    /// Returns `Ok(Rejected)` when an action rejects; no later action runs.
    /// A fault from any action is returned as `Err` unchanged.
    pub fn process(&self, input: I) -> Result<Processed<O>, Fault> {
        let mut state: State = Box::new(input);

        for (index, step) in self.steps.iter().enumerate() {
            match step.action.execute(state)? {
                Flow::Continue(next) => state = next,
                Flow::Reject(partial, rejection) => {
                    tracing::debug!(
                        phase = %self.phase,
                        action = step.action.name(),
                        index,
                        status = %rejection.status(),
                        "Pipeline rejected"
                    );
                    return Ok(Processed::Rejected(Rejected {
                        action: step.action.name().to_string(),
                        index,
                        rejection,
                        state: partial,
                    }));
                }
            }
        }

        state
            .downcast::<O>()
            .map(|output| Processed::Completed(*output))
            .map_err(|_| anyhow::anyhow!("pipeline did not produce {}", type_name::<O>()))
    }
}

impl<I, O> Pipeline<I, O> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.action.name())
    }

    /// One line per action: `name: Input -> Output`.
    pub fn describe(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| format!("{}: {} -> {}", s.action.name(), s.input, s.output))
            .collect()
    }
}

impl<I, O> fmt::Debug for Pipeline<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("phase", &self.phase)
            .field("actions", &self.describe())
            .finish()
    }
}

/// Type-state builder for [`Pipeline`]; `O` is the current output type.
pub struct PipelineBuilder<I, O = I> {
    phase: Phase,
    steps: Vec<Step>,
    _types: PhantomData<fn(I) -> O>,
}

impl<I> PipelineBuilder<I, I> {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            steps: Vec::new(),
            _types: PhantomData,
        }
    }
}

impl<I, O> PipelineBuilder<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Append an action consuming the current output type.
    pub fn then<A, N>(mut self, action: A) -> PipelineBuilder<I, N>
    where
        A: Action<O, N> + 'static,
        N: Send + 'static,
    {
        self.steps.push(Step {
            action: Box::new(Typed {
                action,
                _types: PhantomData::<fn(O) -> N>,
            }),
            input: short_type_name::<O>(),
            output: short_type_name::<N>(),
        });
        PipelineBuilder {
            phase: self.phase,
            steps: self.steps,
            _types: PhantomData,
        }
    }

    /// Freeze the chain, checking every action belongs to this phase.
    pub fn build(self) -> Result<Pipeline<I, O>, PipelineError> {
        for step in &self.steps {
            if let Some(found) = step.action.phase() {
                if found != self.phase {
                    return Err(PipelineError::PhaseMismatch {
                        action: step.action.name().to_string(),
                        expected: self.phase,
                        found,
                    });
                }
            }
        }

        Ok(Pipeline {
            phase: self.phase,
            steps: self.steps,
            _types: PhantomData,
        })
    }
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
