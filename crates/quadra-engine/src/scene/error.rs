/// Validation failures of scene mutations.
///
/// A call that returns one of these left the scene unchanged.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("sprite index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("expected {expected} triangle points, got {actual}")]
    InvalidPointCount { expected: usize, actual: usize },
}
