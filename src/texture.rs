//! Texture resources and procedural generators.
//!
//! Textures are CPU-resident RGBA images with an explicit, idempotent
//! [`dispose`](Texture::dispose) marker. The renderer uploads them lazily
//! and drops its GPU copy once the texture is marked disposed, so page
//! teardown never has to touch wgpu directly.
//!
//! Besides file/byte decoding via the `image` crate, this module carries the
//! procedural generators the built-in pages use: hash-noise planet surfaces,
//! radial gradients for the accretion disk, and the starfield sprinkle.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identifier for a texture, used as the renderer's cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// An RGBA8 texture with disposal tracking.
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    /// Tightly packed RGBA8 pixel data, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Debug label, also used for GPU resource labels.
    pub label: String,
    disposed: Cell<bool>,
}

impl Texture {
    /// Create a texture from raw RGBA data.
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32, label: &str) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            id: TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)),
            pixels,
            width,
            height,
            label: label.to_string(),
            disposed: Cell::new(false),
        }
    }

    /// Decode a texture from an image file on disk.
    pub fn from_file(path: &str) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(img.into_raw(), width, height, path))
    }

    /// Decode a texture from embedded bytes.
    pub fn from_bytes(bytes: &[u8], label: &str) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(img.into_raw(), width, height, label))
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Mark the texture released. Idempotent; the renderer reclaims the GPU
    /// copy on the next frame.
    pub fn dispose(&self) {
        self.disposed.set(true);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Generate a noisy planet-surface texture from a small colour palette.
    ///
    /// Rust-red dusty tones by default, per-pixel hash variation for grain.
    pub fn planet_surface(size: u32, seed: u32) -> Self {
        let palette: &[[u8; 3]] = &[
            [183, 94, 49],  // rust orange
            [156, 74, 40],  // darker rust
            [201, 115, 62], // dusty light
            [130, 60, 35],  // shadowed rock
            [170, 90, 55],  // mid tone
            [110, 52, 32],  // basalt dark
        ];

        let mut data = vec![0u8; (size * size * 4) as usize];
        for y in 0..size {
            for x in 0..size {
                let idx = ((y * size + x) * 4) as usize;
                // Coarse blotches from a downsampled hash, fine grain on top.
                let blotch = hash(x / 8, y / 8, seed);
                let base = palette[(blotch % palette.len() as u32) as usize];
                let variation = ((hash(x, y, seed ^ 0x9e37) % 28) as i32) - 14;

                data[idx] = (base[0] as i32 + variation).clamp(0, 255) as u8;
                data[idx + 1] = (base[1] as i32 + variation).clamp(0, 255) as u8;
                data[idx + 2] = (base[2] as i32 + variation).clamp(0, 255) as u8;
                data[idx + 3] = 255;
            }
        }
        Self::from_rgba(data, size, size, "Planet Surface")
    }

    /// Generate a horizontal gradient strip between two colours.
    ///
    /// Used as the accretion-disk colour ramp: `u = 0` is the inner edge,
    /// `u = 1` the outer.
    pub fn gradient(width: u32, inner: [u8; 3], outer: [u8; 3]) -> Self {
        let mut data = vec![0u8; (width * 4) as usize];
        for x in 0..width {
            let t = x as f32 / (width.max(2) - 1) as f32;
            let idx = (x * 4) as usize;
            for c in 0..3 {
                data[idx + c] =
                    (inner[c] as f32 + (outer[c] as f32 - inner[c] as f32) * t).round() as u8;
            }
            data[idx + 3] = 255;
        }
        Self::from_rgba(data, width, 1, "Gradient Ramp")
    }

    /// Generate a mostly-black texture sprinkled with stars.
    pub fn starfield(size: u32, seed: u32) -> Self {
        let mut data = vec![0u8; (size * size * 4) as usize];
        for y in 0..size {
            for x in 0..size {
                let idx = ((y * size + x) * 4) as usize;
                let h = hash(x, y, seed);
                // Roughly 1 in 600 pixels becomes a star.
                let v = if h % 600 == 0 {
                    160 + (h >> 9) as u8 % 96
                } else {
                    0
                };
                data[idx] = v;
                data[idx + 1] = v;
                data[idx + 2] = v;
                data[idx + 3] = 255;
            }
        }
        Self::from_rgba(data, size, size, "Starfield")
    }
}

/// Simple integer hash for procedural generation.
pub(crate) fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374761393));
    h = h.wrapping_add(y.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = Texture::from_rgba(vec![0; 4], 1, 1, "a");
        let b = Texture::from_rgba(vec![0; 4], 1, 1, "b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn dispose_is_idempotent() {
        let t = Texture::from_rgba(vec![0; 4], 1, 1, "t");
        assert!(!t.is_disposed());
        t.dispose();
        t.dispose();
        assert!(t.is_disposed());
    }

    #[test]
    fn planet_surface_is_deterministic() {
        let a = Texture::planet_surface(16, 7);
        let b = Texture::planet_surface(16, 7);
        assert_eq!(a.pixels, b.pixels);
        assert_eq!(a.pixels.len(), 16 * 16 * 4);
    }

    #[test]
    fn gradient_endpoints() {
        let g = Texture::gradient(8, [255, 0, 0], [0, 0, 255]);
        assert_eq!(&g.pixels[0..3], &[255, 0, 0]);
        let last = (7 * 4) as usize;
        assert_eq!(&g.pixels[last..last + 3], &[0, 0, 255]);
    }
}
