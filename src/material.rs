//! Material resources: colour, blending, and texture slots.

use crate::texture::Texture;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// RGBA colour with components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build a colour from a packed 0xRRGGBB value.
    pub fn hex(rgb: u32) -> Self {
        Self::rgb(
            ((rgb >> 16) & 0xff) as f32 / 255.0,
            ((rgb >> 8) & 0xff) as f32 / 255.0,
            (rgb & 0xff) as f32 / 255.0,
        )
    }

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }
}

/// Blending mode for a material's render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blend {
    /// Standard alpha-blended, depth-written pass.
    Opaque,
    /// Additive, depth-read-only pass (glows, particles, rings).
    Additive,
}

/// Process-unique identifier for a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u64);

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Surface description for a mesh, with the texture slots the deep-dispose
/// pass walks.
///
/// Materials are shared via `Rc` so a page updater can animate one while the
/// scene node holds it; disposal is a marker the renderer observes.
#[derive(Debug)]
pub struct Material {
    pub(crate) id: MaterialId,
    /// Base colour multiplier (also the particle colour for point clouds).
    pub color: Color,
    /// Emissive contribution added after lighting.
    pub emissive: Color,
    /// Set for materials that skip lighting entirely (e.g. the event horizon).
    pub unlit: bool,
    pub blend: Blend,
    /// Base colour texture.
    pub color_map: Option<Rc<Texture>>,
    /// Tangent-space normal map.
    pub normal_map: Option<Rc<Texture>>,
    /// Roughness texture.
    pub roughness_map: Option<Rc<Texture>>,
    /// Metalness texture.
    pub metalness_map: Option<Rc<Texture>>,
    /// Emissive texture.
    pub emissive_map: Option<Rc<Texture>>,
    /// Displacement texture.
    pub displacement_map: Option<Rc<Texture>>,
    /// Alpha mask texture.
    pub alpha_map: Option<Rc<Texture>>,
    /// Environment reflection texture.
    pub env_map: Option<Rc<Texture>>,
    pub(crate) disposed: Cell<bool>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            id: MaterialId(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed)),
            color: Color::WHITE,
            emissive: Color::BLACK,
            unlit: false,
            blend: Blend::Opaque,
            color_map: None,
            normal_map: None,
            roughness_map: None,
            metalness_map: None,
            emissive_map: None,
            displacement_map: None,
            alpha_map: None,
            env_map: None,
            disposed: Cell::new(false),
        }
    }
}

impl Material {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn colored(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn textured(map: Rc<Texture>) -> Self {
        Self {
            color_map: Some(map),
            ..Self::default()
        }
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Every occupied texture slot, in a fixed order.
    ///
    /// The deep-dispose traversal iterates this to release textures without
    /// knowing which slots a given material populates.
    pub fn texture_slots(&self) -> impl Iterator<Item = &Rc<Texture>> {
        [
            self.color_map.as_ref(),
            self.normal_map.as_ref(),
            self.roughness_map.as_ref(),
            self.metalness_map.as_ref(),
            self.emissive_map.as_ref(),
            self.displacement_map.as_ref(),
            self.alpha_map.as_ref(),
            self.env_map.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    /// Mark the material released. Idempotent.
    pub fn dispose(&self) {
        self.disposed.set(true);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_unpacks_channels() {
        let c = Color::hex(0xffc36b);
        assert!((c.r - 1.0).abs() < 1e-3);
        assert!((c.g - 0xc3 as f32 / 255.0).abs() < 1e-3);
        assert!((c.b - 0x6b as f32 / 255.0).abs() < 1e-3);
    }

    #[test]
    fn texture_slots_skip_empty() {
        let tex = Rc::new(Texture::from_rgba(vec![0; 4], 1, 1, "t"));
        let mut mat = Material::new();
        assert_eq!(mat.texture_slots().count(), 0);
        mat.color_map = Some(Rc::clone(&tex));
        mat.env_map = Some(tex);
        assert_eq!(mat.texture_slots().count(), 2);
    }
}
