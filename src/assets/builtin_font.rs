//! Minimal 5x7 bitmap face used when no font file resolves.
//!
//! Lowercase letters render as uppercase; characters without a glyph render as a hollow box.

use crate::assets::decode::PreparedImage;

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
const ADVANCE: u32 = GLYPH_W + 1;

const UNKNOWN: [u8; 7] = [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F];

fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0; 7],
        '.' => [0, 0, 0, 0, 0, 0x0C, 0x0C],
        ',' => [0, 0, 0, 0, 0x0C, 0x04, 0x08],
        ':' => [0, 0x0C, 0x0C, 0, 0x0C, 0x0C, 0],
        ';' => [0, 0x0C, 0x0C, 0, 0x0C, 0x04, 0x08],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0, 0x04],
        '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0, 0x04],
        '\'' | '\u{2019}' => [0x04, 0x04, 0x08, 0, 0, 0, 0],
        '"' => [0x0A, 0x0A, 0, 0, 0, 0, 0],
        '-' | '\u{2013}' | '\u{2014}' => [0, 0, 0, 0x1F, 0, 0, 0],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '/' => [0, 0x01, 0x02, 0x04, 0x08, 0x10, 0],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        '+' => [0, 0x04, 0x04, 0x1F, 0x04, 0x04, 0],
        _ => UNKNOWN,
    }
}

/// Side of one bitmap cell in pixels for a nominal font size.
pub(crate) fn cell_px(size_px: f32) -> u32 {
    ((size_px / 8.0).floor() as u32).max(1)
}

/// Rendered `(width, height)` of `text` at `size_px`.
pub(crate) fn measure(text: &str, size_px: f32) -> (u32, u32) {
    let n = text.chars().count() as u32;
    if n == 0 {
        return (0, 0);
    }
    let cell = cell_px(size_px);
    (n * ADVANCE * cell - cell, GLYPH_H * cell)
}

/// Rasterize `text` with premultiplied colour `rgba`, with its top-left at `(x, y)` of `dst`.
pub(crate) fn draw(
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    text: &str,
    size_px: f32,
    rgba: [u8; 4],
    x: i64,
    y: i64,
) {
    let cell = i64::from(cell_px(size_px));
    for (i, ch) in text.chars().enumerate() {
        let rows = glyph(ch);
        let gx = x + (i as i64) * i64::from(ADVANCE) * cell;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                let px0 = gx + i64::from(col) * cell;
                let py0 = y + (row as i64) * cell;
                fill_cell(dst, dst_w, dst_h, px0, py0, cell, rgba);
            }
        }
    }
}

fn fill_cell(dst: &mut [u8], dst_w: u32, dst_h: u32, x: i64, y: i64, cell: i64, rgba: [u8; 4]) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + cell).min(i64::from(dst_w));
    let y1 = (y + cell).min(i64::from(dst_h));
    for py in y0..y1 {
        for px in x0..x1 {
            let idx = ((py as usize) * (dst_w as usize) + (px as usize)) * 4;
            let d = [dst[idx], dst[idx + 1], dst[idx + 2], dst[idx + 3]];
            dst[idx..idx + 4].copy_from_slice(&crate::assets::raster::over_px(d, rgba));
        }
    }
}

/// Tight layer with an optional drop shadow at `(shadow_offset, shadow_offset)`.
pub(crate) fn render_layer(
    text: &str,
    size_px: f32,
    rgba: [u8; 4],
    shadow: Option<(u32, [u8; 4])>,
) -> PreparedImage {
    let (tw, th) = measure(text, size_px);
    let off = shadow.map(|(o, _)| o).unwrap_or(0);
    let w = (tw + off).max(1);
    let h = (th + off).max(1);
    let mut buf = vec![0u8; (w as usize) * (h as usize) * 4];
    if let Some((o, shadow_rgba)) = shadow {
        draw(&mut buf, w, h, text, size_px, shadow_rgba, i64::from(o), i64::from(o));
    }
    draw(&mut buf, w, h, text, size_px, rgba, 0, 0);
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: std::sync::Arc::new(buf),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/builtin_font.rs"]
mod tests;
