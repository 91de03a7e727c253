use thiserror::Error;

/// Errors from a render pass. Either way the pass did not complete and can
/// be retried.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to spawn render worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Render worker for quadrant {quadrant} panicked")]
    WorkerPanicked { quadrant: usize },
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Errors from the input channel.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("Input channel disconnected")]
    Disconnected,
}
