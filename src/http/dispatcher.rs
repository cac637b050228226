//! Drives sessions for one controller.
//!
//! # Responsibilities
//! - Own the controller, both pipelines and the settings for its mount
//! - Run each exchange through input then output
//! - Turn every fault into a 500 so no exchange is left without a response
//! - Record request metrics

use std::sync::Arc;
use std::time::Instant;

use crate::context::{RequestContext, ResponseContext};
use crate::http::controller::Controller;
use crate::http::exchange::Exchange;
use crate::http::handler::Fault;
use crate::http::session::{reason, InputOutcome, Session};
use crate::http::settings::DispatchSettings;
use crate::observability::metrics;
use crate::pipeline::{input_pipeline, output_pipeline, Pipeline, PipelineError};

/// A controller bound to its pipelines. Immutable and shared via `Arc`.
pub struct Dispatcher {
    controller: Arc<Controller>,
    input: Pipeline<RequestContext, ResponseContext>,
    output: Pipeline<ResponseContext, ResponseContext>,
    settings: DispatchSettings,
}

impl Dispatcher {
    /// Use the default input and output pipelines.
    pub fn new(controller: Controller, settings: DispatchSettings) -> Result<Self, PipelineError> {
        let input = input_pipeline()?;
        let output = output_pipeline(&settings)?;
        Ok(Self::with_pipelines(controller, input, output, settings))
    }

    pub fn with_pipelines(
        controller: Controller,
        input: Pipeline<RequestContext, ResponseContext>,
        output: Pipeline<ResponseContext, ResponseContext>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            controller: Arc::new(controller),
            input,
            output,
            settings,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Handle one exchange to completion and hand it back.
    pub fn dispatch<E: Exchange>(&self, exchange: E) -> E {
        let start = Instant::now();
        let method = exchange.method().to_string();

        let mut session = Session::new(exchange, &self.controller, &self.settings);
        let span = session.span();
        let _entered = span.enter();

        if let Err(fault) = self.drive(&mut session) {
            if session.is_completed() {
                tracing::error!(error = %fault, "Fault after response was written");
            } else if let Err(e) = session.reject_fault(&fault) {
                tracing::error!(error = %e, "Failed to write fault response");
            }
        }

        if let Some(status) = session.status() {
            metrics::record_request(&method, status.as_u16(), start);
            tracing::debug!(
                status = status.as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            );
        }

        session.into_exchange()
    }

    fn drive<E: Exchange>(&self, session: &mut Session<'_, E>) -> Result<(), Fault> {
        match session.handle_input(&self.input)? {
            InputOutcome::Handled(response) => session.handle_output(&self.output, response),
            InputOutcome::Rejected { status, message } => {
                metrics::record_rejection(status.as_u16());
                let message = message.as_deref().unwrap_or_else(|| reason(status));
                session.reject(status, message)?;
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("controller", &self.controller.name())
            .field("mount", &self.controller.path())
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}
