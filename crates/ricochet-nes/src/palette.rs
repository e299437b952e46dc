//! Default PPU color table.
//!
//! The PPU maps 6-bit color indices through a 0x600-byte table: 64 colors
//! by 8 emphasis combinations by 3 RGB bytes. Hosts can replace the whole
//! table from a `.pal` file; this module provides the power-on default,
//! expanding a base 64-entry palette with the standard per-channel
//! attenuation for each emphasis combination.

/// Size of a full color table: 64 colors x 8 emphasis variants x RGB.
pub const COLOR_TABLE_LEN: usize = 0x600;

/// Base 2C02 palette (no emphasis), RGB.
#[rustfmt::skip]
const BASE: [(u8, u8, u8); 64] = [
    ( 84,  84,  84), (  0,  30, 116), (  8,  16, 144), ( 48,   0, 136),
    ( 68,   0, 100), ( 92,   0,  48), ( 84,   4,   0), ( 60,  24,   0),
    ( 32,  42,   0), (  8,  58,   0), (  0,  64,   0), (  0,  60,   0),
    (  0,  50,  60), (  0,   0,   0), (  0,   0,   0), (  0,   0,   0),
    (152, 150, 152), (  8,  76, 196), ( 48,  50, 236), ( 92,  30, 228),
    (136,  20, 176), (160,  20, 100), (152,  34,  32), (120,  60,   0),
    ( 84,  90,   0), ( 40, 114,   0), (  8, 124,   0), (  0, 118,  40),
    (  0, 102, 120), (  0,   0,   0), (  0,   0,   0), (  0,   0,   0),
    (236, 238, 236), ( 76, 154, 236), (120, 124, 236), (176,  98, 236),
    (228,  84, 236), (236,  88, 180), (236, 106, 100), (212, 136,  32),
    (160, 170,   0), (116, 196,   0), ( 76, 208,  32), ( 56, 204, 108),
    ( 56, 180, 204), ( 60,  60,  60), (  0,   0,   0), (  0,   0,   0),
    (236, 238, 236), (168, 204, 236), (188, 188, 236), (212, 178, 236),
    (236, 174, 236), (236, 174, 212), (236, 180, 176), (228, 196, 144),
    (204, 210, 120), (180, 222, 120), (168, 226, 144), (152, 226, 180),
    (160, 214, 228), (160, 162, 160), (  0,   0,   0), (  0,   0,   0),
];

/// Build the default 0x600-byte color table.
///
/// Each emphasis bit attenuates the *other* two channels to 13/16 of
/// their value: emphasise-red dims green and blue, and so on.
#[must_use]
pub fn default_color_table() -> [u8; COLOR_TABLE_LEN] {
    let mut table = [0u8; COLOR_TABLE_LEN];
    for emphasis in 0..8usize {
        for (color, &(r, g, b)) in BASE.iter().enumerate() {
            let (mut r, mut g, mut b) = (u32::from(r), u32::from(g), u32::from(b));
            if emphasis & 0x01 != 0 {
                g = g * 13 / 16;
                b = b * 13 / 16;
            }
            if emphasis & 0x02 != 0 {
                r = r * 13 / 16;
                b = b * 13 / 16;
            }
            if emphasis & 0x04 != 0 {
                r = r * 13 / 16;
                g = g * 13 / 16;
            }
            let offset = (emphasis * 64 + color) * 3;
            table[offset] = r as u8;
            table[offset + 1] = g as u8;
            table[offset + 2] = b as u8;
        }
    }
    table
}
