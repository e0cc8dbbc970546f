//! Built-in 5x5 pictures.

use crate::{Image, MAX_BRIGHTNESS};

/// An immutable 5x5 monochrome image, one bit per pixel.
///
/// Lit pixels read as full brightness. These cannot be drawn on; convert
/// with [`Image::from`] to get an editable copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstImage {
    // bit (y * 5 + x)
    bits: u32,
}

impl ConstImage {
    pub const WIDTH: usize = 5;
    pub const HEIGHT: usize = 5;

    /// Each row is five ASCII `'0'`/`'1'` bytes.
    pub const fn from_rows(rows: [&[u8; 5]; 5]) -> Self {
        let mut bits = 0u32;
        let mut y = 0;
        while y < 5 {
            let mut x = 0;
            while x < 5 {
                if rows[y][x] != b'0' {
                    bits |= 1 << (y * 5 + x);
                }
                x += 1;
            }
            y += 1;
        }
        Self { bits }
    }

    /// Brightness at `(x, y)`, or `None` outside the 5x5 grid.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= Self::WIDTH || y >= Self::HEIGHT {
            return None;
        }
        let lit = self.bits >> (y * Self::WIDTH + x) & 1 == 1;
        Some(if lit { MAX_BRIGHTNESS } else { 0 })
    }

    /// Look a built-in up by its upper-case name, e.g. `"HEART_SMALL"`.
    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, image)| *image)
    }

    pub const HEART: Self = Self::from_rows([b"01010", b"11111", b"11111", b"01110", b"00100"]);
    pub const HEART_SMALL: Self = Self::from_rows([b"00000", b"01010", b"01110", b"00100", b"00000"]);
    pub const HAPPY: Self = Self::from_rows([b"00000", b"01010", b"00000", b"10001", b"01110"]);
    pub const SAD: Self = Self::from_rows([b"00000", b"01010", b"00000", b"01110", b"10001"]);
    pub const CONFUSED: Self = Self::from_rows([b"00000", b"01010", b"00000", b"01010", b"10101"]);
    pub const ANGRY: Self = Self::from_rows([b"10001", b"01010", b"00000", b"11111", b"10101"]);
    pub const ASLEEP: Self = Self::from_rows([b"00000", b"11011", b"00000", b"01110", b"00000"]);
    pub const SURPRISED: Self = Self::from_rows([b"01010", b"00000", b"00100", b"01010", b"00100"]);
    pub const YES: Self = Self::from_rows([b"00000", b"00001", b"00010", b"10100", b"01000"]);
    pub const NO: Self = Self::from_rows([b"10001", b"01010", b"00100", b"01010", b"10001"]);

    pub const CLOCK12: Self = Self::from_rows([b"00100", b"00100", b"00100", b"00000", b"00000"]);
    pub const CLOCK1: Self = Self::from_rows([b"00010", b"00010", b"00100", b"00000", b"00000"]);
    pub const CLOCK2: Self = Self::from_rows([b"00000", b"00011", b"00100", b"00000", b"00000"]);
    pub const CLOCK3: Self = Self::from_rows([b"00000", b"00000", b"00111", b"00000", b"00000"]);
    pub const CLOCK4: Self = Self::from_rows([b"00000", b"00000", b"00100", b"00011", b"00000"]);
    pub const CLOCK5: Self = Self::from_rows([b"00000", b"00000", b"00100", b"00010", b"00010"]);
    pub const CLOCK6: Self = Self::from_rows([b"00000", b"00000", b"00100", b"00100", b"00100"]);
    pub const CLOCK7: Self = Self::from_rows([b"00000", b"00000", b"00100", b"01000", b"01000"]);
    pub const CLOCK8: Self = Self::from_rows([b"00000", b"00000", b"00100", b"11000", b"00000"]);
    pub const CLOCK9: Self = Self::from_rows([b"00000", b"00000", b"11100", b"00000", b"00000"]);
    pub const CLOCK10: Self = Self::from_rows([b"00000", b"11000", b"00100", b"00000", b"00000"]);
    pub const CLOCK11: Self = Self::from_rows([b"01000", b"01000", b"00100", b"00000", b"00000"]);
    pub const ARROW_N: Self = Self::from_rows([b"00100", b"01110", b"10101", b"00100", b"00100"]);
    pub const ARROW_NE: Self = Self::from_rows([b"00111", b"00011", b"00101", b"01000", b"10000"]);
    pub const ARROW_E: Self = Self::from_rows([b"00100", b"00010", b"11111", b"00010", b"00100"]);
    pub const ARROW_SE: Self = Self::from_rows([b"10000", b"01000", b"00101", b"00011", b"00111"]);
    pub const ARROW_S: Self = Self::from_rows([b"00100", b"00100", b"10101", b"01110", b"00100"]);
    pub const ARROW_SW: Self = Self::from_rows([b"00001", b"00010", b"10100", b"11000", b"11100"]);
    pub const ARROW_W: Self = Self::from_rows([b"00100", b"01000", b"11111", b"01000", b"00100"]);
    pub const ARROW_NW: Self = Self::from_rows([b"11100", b"11000", b"10100", b"00010", b"00001"]);

    /// Clock faces from twelve o'clock round to eleven, for animating.
    pub const ALL_CLOCKS: [Self; 12] = [
        Self::CLOCK12,
        Self::CLOCK1,
        Self::CLOCK2,
        Self::CLOCK3,
        Self::CLOCK4,
        Self::CLOCK5,
        Self::CLOCK6,
        Self::CLOCK7,
        Self::CLOCK8,
        Self::CLOCK9,
        Self::CLOCK10,
        Self::CLOCK11,
    ];

    /// Arrows clockwise from north.
    pub const ALL_ARROWS: [Self; 8] = [
        Self::ARROW_N,
        Self::ARROW_NE,
        Self::ARROW_E,
        Self::ARROW_SE,
        Self::ARROW_S,
        Self::ARROW_SW,
        Self::ARROW_W,
        Self::ARROW_NW,
    ];

    pub const ALL: [(&'static str, Self); 30] = [
        ("HEART", Self::HEART),
        ("HEART_SMALL", Self::HEART_SMALL),
        ("HAPPY", Self::HAPPY),
        ("SAD", Self::SAD),
        ("CONFUSED", Self::CONFUSED),
        ("ANGRY", Self::ANGRY),
        ("ASLEEP", Self::ASLEEP),
        ("SURPRISED", Self::SURPRISED),
        ("YES", Self::YES),
        ("NO", Self::NO),
        ("CLOCK12", Self::CLOCK12),
        ("CLOCK1", Self::CLOCK1),
        ("CLOCK2", Self::CLOCK2),
        ("CLOCK3", Self::CLOCK3),
        ("CLOCK4", Self::CLOCK4),
        ("CLOCK5", Self::CLOCK5),
        ("CLOCK6", Self::CLOCK6),
        ("CLOCK7", Self::CLOCK7),
        ("CLOCK8", Self::CLOCK8),
        ("CLOCK9", Self::CLOCK9),
        ("CLOCK10", Self::CLOCK10),
        ("CLOCK11", Self::CLOCK11),
        ("ARROW_N", Self::ARROW_N),
        ("ARROW_NE", Self::ARROW_NE),
        ("ARROW_E", Self::ARROW_E),
        ("ARROW_SE", Self::ARROW_SE),
        ("ARROW_S", Self::ARROW_S),
        ("ARROW_SW", Self::ARROW_SW),
        ("ARROW_W", Self::ARROW_W),
        ("ARROW_NW", Self::ARROW_NW),
    ];
}

impl From<ConstImage> for Image {
    fn from(c: ConstImage) -> Self {
        let mut data = [0u8; 25];
        for (i, px) in data.iter_mut().enumerate() {
            if c.bits >> i & 1 == 1 {
                *px = MAX_BRIGHTNESS;
            }
        }
        // 25 values, all in range
        Image::from_buffer(ConstImage::WIDTH, ConstImage::HEIGHT, &data).unwrap_or_default()
    }
}
