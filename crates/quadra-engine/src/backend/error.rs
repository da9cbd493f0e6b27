/// Failures reported by a [`GpuBackend`](super::GpuBackend).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// Shader compilation or linking failed. Fatal for renderer setup.
    #[error("shader program `{label}` failed: {diagnostic}")]
    Shader { label: String, diagnostic: String },

    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    #[error("invalid texture {width}x{height}: {reason}")]
    InvalidTexture {
        width: u32,
        height: u32,
        reason: String,
    },

    /// Unrecoverable surface state (typically out of memory).
    #[error("surface error: {0}")]
    Surface(String),
}
