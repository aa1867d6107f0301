//! Builders to construct pullers from validated options.

use tracing::debug;

use crate::config::PullerOptions;
use crate::core::{Puller, PullerError};

/// Build an unstarted puller with `options` applied, validating them first.
///
/// Source and handler still have to be attached with the builder methods.
///
/// # Errors
///
/// Returns [`PullerError::InvalidConfig`] if the options do not validate.
pub fn build_puller<T>(options: &PullerOptions) -> Result<Puller<T>, PullerError>
where
    T: Send + 'static,
{
    options.validate().map_err(PullerError::InvalidConfig)?;

    let puller = Puller::new().with_options(options.clone());
    debug!(
        puller_id = %puller.id(),
        dispatch = options.dispatch.label(),
        thread_name = %options.thread_name,
        "Puller built from options"
    );
    Ok(puller)
}

/// Build an unstarted puller from `PULLER_*` environment variables.
///
/// # Errors
///
/// Returns [`PullerError::InvalidConfig`] if the environment holds invalid values.
pub fn build_puller_from_env<T>() -> Result<Puller<T>, PullerError>
where
    T: Send + 'static,
{
    let options = PullerOptions::from_env().map_err(PullerError::InvalidConfig)?;
    build_puller(&options)
}
