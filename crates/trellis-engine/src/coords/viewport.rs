/// Viewport size in physical pixels.
///
/// The picking target is allocated at exactly this size; window coordinates
/// passed to readback are interpreted against it (origin top-left).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns a copy with both dimensions raised to at least one pixel.
    #[inline]
    pub fn clamped(self) -> Self {
        Self::new(self.width.max(1), self.height.max(1))
    }

    #[inline]
    pub fn contains(self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_raises_zero_sizes() {
        assert_eq!(Viewport::new(0, 0).clamped(), Viewport::new(1, 1));
        assert_eq!(Viewport::new(640, 0).clamped(), Viewport::new(640, 1));
    }

    #[test]
    fn contains_is_half_open() {
        let v = Viewport::new(4, 3);
        assert!(v.contains(0, 0));
        assert!(v.contains(3, 2));
        assert!(!v.contains(4, 2));
        assert!(!v.contains(3, 3));
    }
}
