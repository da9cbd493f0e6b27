//! Texture decode service and the procedural fallback image.

use std::path::Path;

/// Width and height of [`fallback_texture`].
pub const FALLBACK_SIZE: u32 = 64;

/// Tightly packed RGBA8 pixels, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    fn is_consistent(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgba.len() == self.width as usize * self.height as usize * 4
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("decoded image is {width}x{height} with {len} bytes of pixel data")]
    Malformed { width: u32, height: u32, len: usize },
}

/// Turns encoded file bytes into RGBA8 pixels.
pub trait TextureDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError>;
}

/// [`TextureDecoder`] backed by the `image` crate (PNG, JPEG, BMP, GIF, TGA).
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl TextureDecoder for ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(DecodedImage {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }
}

/// Deterministic 64x64 placeholder: a red/green gradient over constant blue,
/// opaque in the center and fading to transparent at radius 0.5.
pub fn fallback_texture() -> DecodedImage {
    let n = FALLBACK_SIZE;
    let mut rgba = Vec::with_capacity((n * n * 4) as usize);

    for y in 0..n {
        for x in 0..n {
            let u = x as f32 / n as f32;
            let v = y as f32 / n as f32;
            let dist = ((u - 0.5).powi(2) + (v - 0.5).powi(2)).sqrt();
            let alpha = (1.0 - 2.0 * dist).clamp(0.0, 1.0);

            rgba.extend_from_slice(&[
                (255.0 * u).round() as u8,
                (255.0 * v).round() as u8,
                128,
                (255.0 * alpha).round() as u8,
            ]);
        }
    }

    DecodedImage {
        width: n,
        height: n,
        rgba,
    }
}

/// Reads and decodes `path`, substituting [`fallback_texture`] on any failure.
pub fn load_or_fallback(path: &Path, decoder: &dyn TextureDecoder) -> DecodedImage {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("texture '{}' unreadable ({err}); using fallback", path.display());
            return fallback_texture();
        }
    };

    let decoded = decoder.decode(&bytes).and_then(|img| {
        if img.is_consistent() {
            Ok(img)
        } else {
            Err(DecodeError::Malformed {
                width: img.width,
                height: img.height,
                len: img.rgba.len(),
            })
        }
    });

    match decoded {
        Ok(img) => {
            log::debug!("texture '{}' decoded ({}x{})", path.display(), img.width, img.height);
            img
        }
        Err(err) => {
            log::warn!("texture '{}': {err}; using fallback", path.display());
            fallback_texture()
        }
    }
}
