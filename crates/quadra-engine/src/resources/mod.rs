//! GPU resources owned by the renderer: canonical geometry, bundled programs,
//! textures and the lifecycle that creates and releases them.

mod lifecycle;
pub mod quad;
mod texture;

pub use lifecycle::GpuResources;
pub use texture::{
    fallback_texture, load_or_fallback, DecodeError, DecodedImage, ImageDecoder, TextureDecoder,
    FALLBACK_SIZE,
};

use crate::backend::{ProgramDesc, ProgramKind};

pub const TEXTURED_WGSL: &str = include_str!("shaders/textured.wgsl");
pub const SOLID_WGSL: &str = include_str!("shaders/solid.wgsl");

pub const TEXTURED_PROGRAM: ProgramDesc<'static> = ProgramDesc {
    label: "quadra textured quad",
    kind: ProgramKind::Textured,
    source: TEXTURED_WGSL,
};

pub const SOLID_PROGRAM: ProgramDesc<'static> = ProgramDesc {
    label: "quadra solid triangle",
    kind: ProgramKind::Solid,
    source: SOLID_WGSL,
};

/// Every program the renderer links at initialization.
pub fn program_descs() -> [ProgramDesc<'static>; 2] {
    [TEXTURED_PROGRAM, SOLID_PROGRAM]
}
