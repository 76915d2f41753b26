use crate::device::{BufferHandle, PipelineHandle};

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("no suitable GPU adapter: {0}")]
    AdapterUnavailable(String),

    #[error("GPU device request failed: {0}")]
    DeviceRequest(String),

    #[error("pipeline '{name}' failed to build: {reason}")]
    PipelineCreation { name: String, reason: String },

    #[error("unknown buffer handle {0:?}")]
    UnknownBuffer(BufferHandle),

    #[error("unknown pipeline handle {0:?}")]
    UnknownPipeline(PipelineHandle),

    #[error("draw issued outside begin_frame/end_frame")]
    NoActiveFrame,

    #[error("invalid hex color {0:?}")]
    InvalidHexColor(String),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
