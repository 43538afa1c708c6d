//! Drawing-context hook.

use crate::buffer::PixelBuffer;

/// Creates drawing contexts for pixel buffers.
///
/// The buffer owns no drawing logic; hosts plug a renderer in here.
pub trait GraphicsFactory {
    /// The context handed back to callers.
    type Context;

    /// A context that draws into `image`.
    fn create_graphics(&self, image: &PixelBuffer) -> Self::Context;
}
