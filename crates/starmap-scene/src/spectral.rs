//! Spectral class to display color lookup.
//!
//! Colors are stored as sRGB hex triplets exactly as they appear in the
//! palette; conversion to linear light happens only when uploading to the GPU.

/// A packed `0xRRGGBB` sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StarColor(pub u32);

/// Color used when a spectral class is missing or not in the palette.
pub const FALLBACK_COLOR: StarColor = StarColor(0xffffff);

/// Harvard spectral classes (plus white dwarfs, `d`) and their display colors.
pub const SPECTRAL_PALETTE: [(char, StarColor); 8] = [
    ('o', StarColor(0x9bb0ff)),
    ('b', StarColor(0xaabfff)),
    ('a', StarColor(0xcad7ff)),
    ('f', StarColor(0xf8f7ff)),
    ('g', StarColor(0xfff4ea)),
    ('k', StarColor(0xffd2a1)),
    ('m', StarColor(0xffcc6f)),
    ('d', StarColor(0xffcc6f)),
];

impl StarColor {
    /// Red, green and blue bytes.
    pub fn to_bytes(self) -> [u8; 3] {
        [
            ((self.0 >> 16) & 0xff) as u8,
            ((self.0 >> 8) & 0xff) as u8,
            (self.0 & 0xff) as u8,
        ]
    }

    /// sRGB-encoded channels in `[0, 1]`.
    pub fn to_srgb(self) -> [f32; 3] {
        self.to_bytes().map(|b| f32::from(b) / 255.0)
    }

    /// Linear-light channels in `[0, 1]`, suitable for HDR render targets.
    pub fn to_linear(self) -> [f32; 3] {
        self.to_srgb().map(srgb_to_linear)
    }
}

/// Look up the palette color for a spectral class code.
///
/// Only the first character matters and the match is case-insensitive, so
/// `"G2V"`, `"g"` and `"G"` all resolve to the same entry. Leading whitespace
/// is not skipped. Returns `None` for empty or unknown codes; callers
/// substitute [`FALLBACK_COLOR`].
pub fn resolve_spectral_color(code: &str) -> Option<StarColor> {
    let first = code.chars().next()?.to_ascii_lowercase();
    SPECTRAL_PALETTE
        .iter()
        .find(|(class, _)| *class == first)
        .map(|(_, color)| *color)
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
