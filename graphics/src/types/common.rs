//! Common types shared across the graphics system.

/// Size of a texture in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3d {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth in texels (or array layer count).
    pub depth: u32,
}

impl Extent3d {
    /// Create a 2D extent (depth = 1).
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 1,
        }
    }

    /// Create a 3D extent.
    pub fn new_3d(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Total number of texels.
    pub fn texel_count(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.depth as u64
    }
}

impl Default for Extent3d {
    fn default() -> Self {
        Self::new_2d(1, 1)
    }
}
