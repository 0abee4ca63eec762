/// Axis-aligned rectangle in image pixel coordinates.
///
/// The rectangle covers columns `x..x + width` and rows `y..y + height`
/// (right and bottom edges are exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from inclusive-exclusive corner coordinates.
    pub fn from_corners(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            x: left,
            y: top,
            width: right.saturating_sub(left),
            height: bottom.saturating_sub(top),
        }
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &PixelRect) -> PixelRect {
        PixelRect::from_corners(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Grows the rectangle by `horizontal` pixels on the left and right and
    /// `vertical` pixels on the top and bottom, clamped to a
    /// `bounds_width x bounds_height` image.
    pub fn expand(
        &self,
        horizontal: u32,
        vertical: u32,
        bounds_width: u32,
        bounds_height: u32,
    ) -> PixelRect {
        let left = self.x.saturating_sub(horizontal).min(bounds_width);
        let top = self.y.saturating_sub(vertical).min(bounds_height);
        let right = self.right().saturating_add(horizontal).min(bounds_width);
        let bottom = self.bottom().saturating_add(vertical).min(bounds_height);
        PixelRect::from_corners(left, top, right.max(left), bottom.max(top))
    }

    /// Clamps the rectangle to a `bounds_width x bounds_height` image.
    pub fn clamp_to(&self, bounds_width: u32, bounds_height: u32) -> PixelRect {
        self.expand(0, 0, bounds_width, bounds_height)
    }

    pub fn contains_rect(&self, other: &PixelRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Chebyshev gap between two rectangles: 0 when they touch or overlap,
    /// otherwise the larger of the horizontal and vertical distances.
    pub fn gap_to(&self, other: &PixelRect) -> u32 {
        let horizontal = if self.right() < other.x {
            other.x - self.right()
        } else if other.right() < self.x {
            self.x - other.right()
        } else {
            0
        };
        let vertical = if self.bottom() < other.y {
            other.y - self.bottom()
        } else if other.bottom() < self.y {
            self.y - other.bottom()
        } else {
            0
        };
        horizontal.max(vertical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_spans_both_rects() {
        let a = PixelRect::new(10, 10, 20, 5);
        let b = PixelRect::new(40, 8, 10, 10);
        assert_eq!(a.union(&b), PixelRect::new(10, 8, 40, 10));
    }

    #[test]
    fn expand_clamps_to_bounds() {
        let rect = PixelRect::new(2, 3, 10, 10);
        let grown = rect.expand(5, 5, 14, 100);
        assert_eq!(grown, PixelRect::new(0, 0, 14, 18));
        assert!(grown.contains_rect(&rect));
    }

    #[test]
    fn zero_expand_is_identity_inside_bounds() {
        let rect = PixelRect::new(4, 4, 6, 6);
        assert_eq!(rect.expand(0, 0, 100, 100), rect);
    }

    #[test]
    fn gap_is_zero_for_touching_rects() {
        let a = PixelRect::new(0, 0, 10, 10);
        let b = PixelRect::new(10, 0, 5, 5);
        assert_eq!(a.gap_to(&b), 0);
        let c = PixelRect::new(25, 40, 5, 5);
        assert_eq!(a.gap_to(&c), 30);
        assert_eq!(c.gap_to(&a), 30);
    }
}
