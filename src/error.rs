use thiserror::Error;

/// Engine failures, split so callers can tell setup-time errors from
/// steady-state ones. Initialization errors are fatal; the host loop only
/// ever recovers from surface acquisition problems.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("initialization failed: {0}")]
    Init(String),

    /// Reserved for steady-state failures that are not surface acquisition.
    #[allow(dead_code)]
    #[error("unexpected runtime error: {0}")]
    Runtime(String),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

impl EngineError {
    pub fn init(what: impl Into<String>) -> Self {
        EngineError::Init(what.into())
    }
}
