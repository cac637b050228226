//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve dispatch settings from validated configuration
//! - Bind each controller to the default pipelines
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Everything built here is immutable once the server starts

use crate::config::{ServerConfig, ValidationError};
use crate::http::{Controller, DispatchSettings, Dispatcher};
use crate::pipeline::PipelineError;

/// Errors that abort startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid dispatch settings: {0}")]
    Settings(#[from] ValidationError),

    #[error("failed to build pipelines: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Build one dispatcher per controller, all sharing the configured settings.
pub fn prepare_dispatchers(
    config: &ServerConfig,
    controllers: Vec<Controller>,
) -> Result<Vec<Dispatcher>, StartupError> {
    let settings = DispatchSettings::from_config(&config.dispatch)?;
    tracing::info!(
        debug = settings.debug,
        charset = %settings.charset,
        default_headers = settings.default_headers.len(),
        "Dispatch settings resolved"
    );

    controllers
        .into_iter()
        .map(|controller| Ok(Dispatcher::new(controller, settings.clone())?))
        .collect()
}
