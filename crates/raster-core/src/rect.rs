//! Rectangles in raster coordinate space.
//!
//! Raster coordinates are signed: a region may sit anywhere on the plane,
//! including at negative origins after translation.
//!
//! ```text
//! (min_x, min_y) ────────► X
//!   │
//!   │   ┌──────────┐
//!   │   │  Region  │
//!   │   └──────────┘
//!   ▼
//!   Y
//! ```
//!
//! # Usage
//!
//! ```rust
//! use raster_core::Rect;
//!
//! let rect = Rect::new(-10, 20, 100, 50);
//! assert!(rect.contains(-10, 20));
//! assert!(!rect.contains(90, 20));
//!
//! let other = Rect::new(50, 40, 100, 50);
//! let overlap = rect.intersect(&other).unwrap();
//! assert_eq!((overlap.width, overlap.height), (40, 30));
//! ```

/// A rectangle defined by origin (x, y) and dimensions (width, height).
///
/// Edges are computed in `i64` so that rectangles near `i32::MAX` never
/// wrap around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the left edge (inclusive)
    pub x: i32,
    /// Y coordinate of the top edge (inclusive)
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle with the given origin and dimensions.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle at the origin.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Number of pixels covered, zero when empty.
    #[inline]
    pub const fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    /// Returns `true` if width or height is not positive.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns `true` if the point lies inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && (x as i64) < self.right() && (y as i64) < self.bottom()
    }

    /// Returns `true` if `other` lies entirely inside this rectangle.
    ///
    /// An empty `other` is contained when its origin is inside.
    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.width >= 0
            && other.height >= 0
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns the overlap of two rectangles, or `None` if they are disjoint.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 as i64 || y1 <= y0 as i64 {
            return None;
        }
        Some(Rect::new(x0, y0, (x1 - x0 as i64) as i32, (y1 - y0 as i64) as i32))
    }

    /// Moves the rectangle by `(dx, dy)`.
    #[inline]
    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}) {}x{}", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let r = Rect::new(-5, 10, 20, 30);
        assert_eq!(r.right(), 15);
        assert_eq!(r.bottom(), 40);
        assert_eq!(r.area(), 600);
    }

    #[test]
    fn test_contains_negative_origin() {
        let r = Rect::new(-5, -5, 10, 10);
        assert!(r.contains(-5, -5));
        assert!(r.contains(4, 4));
        assert!(!r.contains(5, 0));
        assert!(!r.contains(0, -6));
    }

    #[test]
    fn test_contains_rect_near_max() {
        let r = Rect::new(i32::MAX - 10, 0, 10, 10);
        assert!(r.contains_rect(&Rect::new(i32::MAX - 10, 0, 10, 10)));
        assert!(!r.contains_rect(&Rect::new(i32::MAX - 5, 0, 10, 10)));
    }

    #[test]
    fn test_intersect() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 60, 100, 100);
        assert_eq!(a.intersect(&b), Some(Rect::new(50, 60, 50, 40)));
        assert_eq!(a.intersect(&Rect::new(100, 0, 5, 5)), None);
    }

    #[test]
    fn test_empty() {
        assert!(Rect::new(0, 0, 0, 5).is_empty());
        assert_eq!(Rect::new(0, 0, -1, 5).area(), 0);
    }
}
