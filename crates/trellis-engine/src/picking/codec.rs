//! Picking index <-> RGB packing.
//!
//! Index bits are sliced little-endian across the channels: red holds bits
//! 0–7, green bits 8–15, blue bits 16–23. With 8 bits per channel the mapping
//! is exact for every index in `0..=MAX_PICK_INDEX`; index 0 is the clear
//! color and means "nothing".

/// Largest index representable in an RGB8 id-buffer.
pub const MAX_PICK_INDEX: u32 = (1 << 24) - 1;

/// Index written by the clear pass.
pub const BACKGROUND_INDEX: u32 = 0;

/// # Panics
/// Panics if `index` exceeds [`MAX_PICK_INDEX`].
#[inline]
pub fn index_to_rgb(index: u32) -> [u8; 3] {
    assert!(index <= MAX_PICK_INDEX, "pick index {index} does not fit in 24 bits");
    [
        (index & 0xFF) as u8,
        ((index >> 8) & 0xFF) as u8,
        ((index >> 16) & 0xFF) as u8,
    ]
}

#[inline]
pub fn rgb_to_index(rgb: [u8; 3]) -> u32 {
    u32::from(rgb[0]) | (u32::from(rgb[1]) << 8) | (u32::from(rgb[2]) << 16)
}

/// Flat shader color for `index` as normalized floats (opaque).
///
/// `k / 255.0` written to a `Rgba8Unorm` target stores exactly `k`.
#[inline]
pub fn index_to_color(index: u32) -> [f32; 4] {
    let [r, g, b] = index_to_rgb(index);
    [
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        1.0,
    ]
}
