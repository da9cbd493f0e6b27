//! Contract between the window runtime and whatever renders into it.

mod app;

pub use app::{AppControl, FrameHandler};
