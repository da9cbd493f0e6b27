use std::path::Path;

use crate::backend::{
    BackendError, BufferHandle, BufferUsage, GpuBackend, GpuObject, ProgramHandle,
};
use crate::scene::TextureHandle;

use super::quad::{QUAD_INDICES, QUAD_VERTICES, TRIANGLE_INDICES};
use super::texture::{fallback_texture, load_or_fallback, DecodedImage, TextureDecoder};
use super::{SOLID_PROGRAM, TEXTURED_PROGRAM};

/// Handles to every GPU object the renderer draws with.
///
/// Objects are released in reverse creation order by [`GpuResources::dispose`],
/// including textures added later through [`GpuResources::load_texture`].
#[derive(Debug)]
pub struct GpuResources {
    pub quad_vertices: BufferHandle,
    pub quad_indices: BufferHandle,
    pub textured_program: ProgramHandle,

    pub triangle_vertices: BufferHandle,
    pub triangle_indices: BufferHandle,
    pub solid_program: ProgramHandle,

    pub default_texture: TextureHandle,

    owned: Vec<GpuObject>,
}

impl GpuResources {
    /// Creates buffers, programs and the default texture.
    ///
    /// A missing or undecodable `default_texture` falls back to the procedural
    /// image. Any backend failure releases what was already created.
    pub fn create(
        backend: &mut dyn GpuBackend,
        decoder: &dyn TextureDecoder,
        default_texture: Option<&Path>,
    ) -> Result<Self, BackendError> {
        let mut owned = Vec::new();
        match Self::build(backend, decoder, default_texture, &mut owned) {
            Ok(mut res) => {
                res.owned = owned;
                log::debug!("gpu resources created ({} objects)", res.owned.len());
                Ok(res)
            }
            Err(err) => {
                release(backend, &mut owned);
                Err(err)
            }
        }
    }

    fn build(
        backend: &mut dyn GpuBackend,
        decoder: &dyn TextureDecoder,
        default_texture: Option<&Path>,
        owned: &mut Vec<GpuObject>,
    ) -> Result<Self, BackendError> {
        let quad_vertices =
            backend.create_vertex_buffer(bytemuck::cast_slice(&QUAD_VERTICES), BufferUsage::Static)?;
        owned.push(GpuObject::Buffer(quad_vertices));
        let quad_indices = backend.create_index_buffer(&QUAD_INDICES, BufferUsage::Static)?;
        owned.push(GpuObject::Buffer(quad_indices));
        let textured_program = backend.create_program(&TEXTURED_PROGRAM)?;
        owned.push(GpuObject::Program(textured_program));

        // Filled per frame by the submitter.
        let triangle_vertices = backend.create_vertex_buffer(&[], BufferUsage::Dynamic)?;
        owned.push(GpuObject::Buffer(triangle_vertices));
        let triangle_indices = backend.create_index_buffer(&TRIANGLE_INDICES, BufferUsage::Static)?;
        owned.push(GpuObject::Buffer(triangle_indices));
        let solid_program = backend.create_program(&SOLID_PROGRAM)?;
        owned.push(GpuObject::Program(solid_program));

        let image = match default_texture {
            Some(path) => load_or_fallback(path, decoder),
            None => fallback_texture(),
        };
        let default_texture = upload(backend, &image)?;
        owned.push(GpuObject::Texture(default_texture));

        Ok(Self {
            quad_vertices,
            quad_indices,
            textured_program,
            triangle_vertices,
            triangle_indices,
            solid_program,
            default_texture,
            owned: Vec::new(),
        })
    }

    /// Loads `path` (or the fallback image) and registers it for disposal.
    pub fn load_texture(
        &mut self,
        backend: &mut dyn GpuBackend,
        decoder: &dyn TextureDecoder,
        path: &Path,
    ) -> Result<TextureHandle, BackendError> {
        let image = load_or_fallback(path, decoder);
        let handle = upload(backend, &image)?;
        self.owned.push(GpuObject::Texture(handle));
        Ok(handle)
    }

    /// Objects currently owned, in creation order.
    pub fn objects(&self) -> &[GpuObject] {
        &self.owned
    }

    /// Deletes every owned object, newest first.
    pub fn dispose(mut self, backend: &mut dyn GpuBackend) {
        log::debug!("disposing {} gpu objects", self.owned.len());
        release(backend, &mut self.owned);
    }
}

fn upload(backend: &mut dyn GpuBackend, image: &DecodedImage) -> Result<TextureHandle, BackendError> {
    backend.create_texture(image.width, image.height, &image.rgba)
}

fn release(backend: &mut dyn GpuBackend, owned: &mut Vec<GpuObject>) {
    while let Some(obj) = owned.pop() {
        obj.delete(backend);
    }
}
