//! Draw ordering keys
//!
//! Every packet gets a 64-bit [`Bucket`]. Sorting packets by bucket,
//! largest first, yields the draw order for the whole frame:
//!
//! ```text
//!  63      56 55      48 47              32 31                      0
//! +----------+----------+------------------+-------------------------+
//! | 255-pass | drawtype |    shader id     | camera distance (f32)   |
//! +----------+----------+------------------+-------------------------+
//! ```
//!
//! Earlier passes carry a larger pass byte so they submit first. Within a
//! pass sky draws before opaque, opaque before transparent. Packets sharing
//! a shader stay together, and within a shader the farthest packet draws
//! first. Non-negative IEEE-754 floats order the same as their bit
//! patterns, so the distance can be packed directly.

use super::pass::RenderPass;

/// How a packet blends with what is already drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawType {
    /// Background drawn before everything else in its pass
    Sky,
    /// Depth-tested opaque geometry
    #[default]
    Opaque,
    /// Alpha-blended geometry drawn after opaque
    Transparent,
}

impl DrawType {
    /// Sort priority, larger draws earlier
    pub const fn priority(self) -> u8 {
        match self {
            DrawType::Sky => 8,
            DrawType::Opaque => 4,
            DrawType::Transparent => 2,
        }
    }

    fn from_priority(priority: u8) -> Option<Self> {
        match priority {
            8 => Some(DrawType::Sky),
            4 => Some(DrawType::Opaque),
            2 => Some(DrawType::Transparent),
            _ => None,
        }
    }
}

/// 64-bit sort key for a render packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Bucket(u64);

impl Bucket {
    /// Key for a packet in `pass` with no draw type, shader or distance yet
    pub fn new(pass: RenderPass) -> Self {
        Self(u64::from(255 - pass.id()) << 56)
    }

    /// Set the draw type byte
    pub fn with_draw_type(self, draw_type: DrawType) -> Self {
        Self((self.0 & !(0xFF << 48)) | (u64::from(draw_type.priority()) << 48))
    }

    /// Set the shader field
    pub fn with_shader(self, shader_id: u16) -> Self {
        Self((self.0 & !(0xFFFF << 32)) | (u64::from(shader_id) << 32))
    }

    /// Set the camera distance field. Negative and NaN distances count as 0.
    pub fn with_distance(self, distance: f32) -> Self {
        let distance = if distance > 0.0 { distance } else { 0.0 };
        Self((self.0 & !0xFFFF_FFFF) | u64::from(distance.to_bits()))
    }

    /// Raw key value
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Pass this key sorts into
    pub fn pass(self) -> Option<RenderPass> {
        let id = 255 - (self.0 >> 56) as u8;
        RenderPass::ALL.into_iter().find(|pass| pass.id() == id)
    }

    /// Draw type encoded in this key
    pub fn draw_type(self) -> Option<DrawType> {
        DrawType::from_priority((self.0 >> 48) as u8)
    }

    /// Shader id encoded in this key
    pub const fn shader(self) -> u16 {
        (self.0 >> 32) as u16
    }

    /// Camera distance encoded in this key
    pub fn distance(self) -> f32 {
        f32::from_bits(self.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(pass: RenderPass, draw_type: DrawType, shader: u16, distance: f32) -> Bucket {
        Bucket::new(pass)
            .with_draw_type(draw_type)
            .with_shader(shader)
            .with_distance(distance)
    }

    #[test]
    fn test_fields_decode() {
        let bucket = key(RenderPass::TwoD, DrawType::Transparent, 0xBEEF, 12.5);

        assert_eq!(bucket.pass(), Some(RenderPass::TwoD));
        assert_eq!(bucket.draw_type(), Some(DrawType::Transparent));
        assert_eq!(bucket.shader(), 0xBEEF);
        assert_eq!(bucket.distance(), 12.5);
    }

    #[test]
    fn test_three_d_sorts_before_two_d() {
        let world = key(RenderPass::ThreeD, DrawType::Transparent, 0, 0.0);
        let overlay = key(RenderPass::TwoD, DrawType::Sky, u16::MAX, f32::MAX);
        assert!(world > overlay);
    }

    #[test]
    fn test_draw_type_order_within_pass() {
        let sky = key(RenderPass::ThreeD, DrawType::Sky, 0, 1.0);
        let opaque = key(RenderPass::ThreeD, DrawType::Opaque, 9, 500.0);
        let transparent = key(RenderPass::ThreeD, DrawType::Transparent, 9, 900.0);
        assert!(sky > opaque);
        assert!(opaque > transparent);
    }

    #[test]
    fn test_farther_sorts_first() {
        let near = key(RenderPass::ThreeD, DrawType::Transparent, 3, 1.5);
        let far = key(RenderPass::ThreeD, DrawType::Transparent, 3, 40.0);
        assert!(far > near);
    }

    #[test]
    fn test_negative_and_nan_distance_clamp() {
        let base = key(RenderPass::ThreeD, DrawType::Opaque, 1, 0.0);
        assert_eq!(key(RenderPass::ThreeD, DrawType::Opaque, 1, -3.0), base);
        assert_eq!(key(RenderPass::ThreeD, DrawType::Opaque, 1, f32::NAN), base);
    }

    #[test]
    fn test_setters_overwrite_fields() {
        let bucket = key(RenderPass::ThreeD, DrawType::Sky, 7, 2.0)
            .with_draw_type(DrawType::Opaque)
            .with_shader(3)
            .with_distance(1.0);
        assert_eq!(bucket, key(RenderPass::ThreeD, DrawType::Opaque, 3, 1.0));
    }
}
