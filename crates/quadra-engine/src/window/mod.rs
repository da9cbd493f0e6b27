//! Window + event loop.
//!
//! Owns the `winit` EventLoop and the single window the backend renders into.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
