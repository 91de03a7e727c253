//! Packed 24-bit colors (0xRRGGBB, 8 bits per channel).

pub const BLACK: u32 = 0x000000;
pub const WHITE: u32 = 0xffffff;

/// Pack three 8-bit channels into 0xRRGGBB.
#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Split a packed color into channels normalized to [0, 1].
#[inline]
pub fn channels(color: u32) -> [f64; 3] {
    [
        ((color >> 16) & 0xff) as f64 / 255.0,
        ((color >> 8) & 0xff) as f64 / 255.0,
        (color & 0xff) as f64 / 255.0,
    ]
}

/// Convert linear intensities to a packed color.
///
/// Each channel is scaled by 256, truncated and clamped to [0, 255].
pub fn intensity_to_rgb(intensity: [f64; 3]) -> u32 {
    let channel = |i: f64| (i * 256.0).clamp(0.0, 255.0) as u8;
    pack_rgb(
        channel(intensity[0]),
        channel(intensity[1]),
        channel(intensity[2]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_rgb() {
        assert_eq!(pack_rgb(0x12, 0x34, 0x56), 0x123456);
        assert_eq!(pack_rgb(255, 255, 255), WHITE);
    }

    #[test]
    fn test_channels() {
        assert_eq!(channels(WHITE), [1.0, 1.0, 1.0]);
        assert_eq!(channels(BLACK), [0.0, 0.0, 0.0]);
        let [r, g, b] = channels(0xff8000);
        assert_eq!(r, 1.0);
        assert!((g - 128.0 / 255.0).abs() < 1e-12);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_intensity_to_rgb_clamps() {
        assert_eq!(intensity_to_rgb([2.0, -1.0, 0.5]), 0xff0080);
        // Ambient floor: 0.05 * 256 = 12.8, truncated to 12.
        assert_eq!(intensity_to_rgb([0.05, 0.05, 0.05]), 0x0c0c0c);
    }
}
