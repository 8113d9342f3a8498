//! Device-owned GPU resources.
//!
//! These are the long-lived textures and buffers the application creates
//! through [`crate::GraphicsDevice`] and imports into render graphs. They
//! are distinct from transient graph resources, which exist only for the
//! duration of one frame and live in the transient pool.

mod buffer;
mod texture;

pub use buffer::Buffer;
pub use texture::Texture;
