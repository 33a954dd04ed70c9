use super::primitive::Color;
use super::transform::Viewport;
use crate::app::{HudState, LoopMetricsSnapshot};

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
const GLYPH_ADVANCE: i32 = GLYPH_WIDTH + 1;
const LINE_ADVANCE: i32 = GLYPH_HEIGHT + 2;
const MARGIN: i32 = 4;
const TEXT_COLOR: Color = [244, 248, 252, 255];
const DIM_TEXT_COLOR: Color = [176, 198, 220, 255];
const BANNER_COLOR: Color = [255, 214, 92, 255];
const PANEL_COLOR: Color = [10, 12, 16, 255];
const PANEL_BORDER_COLOR: Color = [92, 106, 126, 255];
const SELECTED_BORDER_COLOR: Color = [255, 214, 92, 255];
const METER_FILL_COLOR: Color = [236, 88, 120, 255];
const SLOT_WIDTH: i32 = 34;
const SLOT_HEIGHT: i32 = 17;

#[derive(Debug, Clone, Copy)]
pub(crate) struct OverlayData {
    pub(crate) metrics: LoopMetricsSnapshot,
    pub(crate) render_fps_cap: Option<u32>,
    pub(crate) primitive_count: usize,
}

pub(crate) fn draw_hud(frame: &mut [u8], viewport: Viewport, hud: &HudState) {
    let mut canvas = Canvas::new(frame, viewport);

    let mut cursor_y = MARGIN;
    if let Some((fraction, label)) = &hud.meter {
        canvas.text(MARGIN, cursor_y, label, TEXT_COLOR, 1);
        let bar_x = MARGIN + text_width(label, 1) + 3;
        canvas.outline(bar_x, cursor_y - 1, 42, GLYPH_HEIGHT + 2, PANEL_BORDER_COLOR);
        let filled = (40.0 * fraction.clamp(0.0, 1.0)).round() as i32;
        canvas.fill(bar_x + 1, cursor_y, filled, GLYPH_HEIGHT, METER_FILL_COLOR);
        cursor_y += LINE_ADVANCE + 1;
    }
    if let Some(status) = &hud.status {
        canvas.text(MARGIN, cursor_y, status, TEXT_COLOR, 1);
    }

    if let Some(banner) = &hud.banner {
        let scale = 2;
        let x = (viewport.width as i32 - text_width(banner, scale)) / 2;
        canvas.text(x, MARGIN + 10, banner, BANNER_COLOR, scale);
    }

    if hud.crosshair {
        let cx = viewport.width as i32 / 2;
        let cy = viewport.height as i32 / 2;
        canvas.fill(cx - 2, cy, 5, 1, TEXT_COLOR);
        canvas.fill(cx, cy - 2, 1, 5, TEXT_COLOR);
    }

    draw_slots(&mut canvas, viewport, hud);

    if let Some(hint) = &hud.hint {
        let y = viewport.height as i32 - MARGIN - GLYPH_HEIGHT;
        canvas.text(MARGIN, y, hint, DIM_TEXT_COLOR, 1);
    }
}

fn draw_slots(canvas: &mut Canvas<'_>, viewport: Viewport, hud: &HudState) {
    if hud.slots.is_empty() {
        return;
    }

    let count = hud.slots.len() as i32;
    let total_width = count * SLOT_WIDTH + (count - 1) * 2;
    let mut x = (viewport.width as i32 - total_width) / 2;
    let y = viewport.height as i32 - MARGIN - SLOT_HEIGHT - LINE_ADVANCE;

    for (index, slot) in hud.slots.iter().enumerate() {
        let border = if slot.selected {
            SELECTED_BORDER_COLOR
        } else {
            PANEL_BORDER_COLOR
        };
        let text_color = if slot.count == 0 {
            DIM_TEXT_COLOR
        } else {
            TEXT_COLOR
        };
        canvas.fill(x, y, SLOT_WIDTH, SLOT_HEIGHT, PANEL_COLOR);
        canvas.outline(x, y, SLOT_WIDTH, SLOT_HEIGHT, border);
        canvas.text(x + 2, y + 2, &format!("{} {}", index + 1, slot.label), text_color, 1);
        canvas.text(x + 2, y + 2 + LINE_ADVANCE, &format!("X{}", slot.count), text_color, 1);
        x += SLOT_WIDTH + 2;
    }
}

pub(crate) fn draw_overlay(frame: &mut [u8], viewport: Viewport, data: &OverlayData) {
    let lines = overlay_lines(data);
    let mut canvas = Canvas::new(frame, viewport);
    let widest = lines
        .iter()
        .map(|line| text_width(line, 1))
        .max()
        .unwrap_or(0);
    let panel_width = widest + 4;
    let panel_height = lines.len() as i32 * LINE_ADVANCE + 2;
    let x = viewport.width as i32 - panel_width - MARGIN;
    let y = MARGIN;

    canvas.fill(x, y, panel_width, panel_height, PANEL_COLOR);
    canvas.outline(x, y, panel_width, panel_height, PANEL_BORDER_COLOR);
    for (index, line) in lines.iter().enumerate() {
        canvas.text(x + 2, y + 2 + index as i32 * LINE_ADVANCE, line, DIM_TEXT_COLOR, 1);
    }
}

fn overlay_lines(data: &OverlayData) -> Vec<String> {
    let cap = match data.render_fps_cap {
        Some(value) => value.to_string(),
        None => "OFF".to_string(),
    };
    vec![
        format!("FPS {:.0} CAP {}", data.metrics.fps, cap),
        format!("TPS {:.0}", data.metrics.tps),
        format!(
            "FRAME {:.1}MS MAX {:.1}",
            data.metrics.frame_time_ms, data.metrics.worst_frame_ms
        ),
        format!(
            "PRIMS {} PEAK {}",
            data.primitive_count, data.metrics.peak_primitives
        ),
        format!("CLAMPS {}", data.metrics.sim_clamps),
    ]
}

fn text_width(text: &str, scale: i32) -> i32 {
    let chars = text.chars().count() as i32;
    if chars == 0 {
        return 0;
    }
    (chars * GLYPH_ADVANCE - 1) * scale
}

/// Bounds-checked RGBA writer over a frame buffer.
struct Canvas<'a> {
    frame: &'a mut [u8],
    width: i32,
    height: i32,
}

impl<'a> Canvas<'a> {
    fn new(frame: &'a mut [u8], viewport: Viewport) -> Self {
        Self {
            frame,
            width: viewport.width as i32,
            height: viewport.height as i32,
        }
    }

    fn put(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        if let Some(pixel) = self.frame.get_mut(offset..offset + 4) {
            pixel.copy_from_slice(&color);
        }
    }

    fn fill(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = (x + width).min(self.width);
        let end_y = (y + height).min(self.height);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.put(px, py, color);
            }
        }
    }

    fn outline(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        if width <= 1 || height <= 1 {
            return;
        }
        self.fill(x, y, width, 1, color);
        self.fill(x, y + height - 1, width, 1, color);
        self.fill(x, y, 1, height, color);
        self.fill(x + width - 1, y, 1, height, color);
    }

    fn text(&mut self, mut x: i32, y: i32, text: &str, color: Color, scale: i32) {
        for ch in text.chars() {
            let rows = glyph_rows(ch);
            for (row_index, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if (*bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                        continue;
                    }
                    let px = x + col * scale;
                    let py = y + row_index as i32 * scale;
                    self.fill(px, py, scale, scale, color);
                }
            }
            x += GLYPH_ADVANCE * scale;
        }
    }
}

/// 3x5 glyph rows, most significant bit on the left. Lowercase folds to uppercase.
fn glyph_rows(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        'A' => [2, 5, 7, 5, 5],
        'B' => [6, 5, 6, 5, 6],
        'C' => [7, 4, 4, 4, 7],
        'D' => [6, 5, 5, 5, 6],
        'E' => [7, 4, 6, 4, 7],
        'F' => [7, 4, 6, 4, 4],
        'G' => [7, 4, 5, 5, 7],
        'H' => [5, 5, 7, 5, 5],
        'I' => [7, 2, 2, 2, 7],
        'J' => [7, 1, 1, 5, 7],
        'K' => [5, 5, 6, 5, 5],
        'L' => [4, 4, 4, 4, 7],
        'M' => [5, 7, 7, 5, 5],
        'N' => [5, 7, 7, 7, 5],
        'O' => [7, 5, 5, 5, 7],
        'P' => [6, 5, 6, 4, 4],
        'Q' => [7, 5, 5, 7, 1],
        'R' => [6, 5, 6, 5, 5],
        'S' => [7, 4, 7, 1, 7],
        'T' => [7, 2, 2, 2, 2],
        'U' => [5, 5, 5, 5, 7],
        'V' => [5, 5, 5, 5, 2],
        'W' => [5, 5, 7, 7, 5],
        'X' => [5, 5, 2, 5, 5],
        'Y' => [5, 5, 2, 2, 2],
        'Z' => [7, 1, 2, 4, 7],
        '0' => [7, 5, 5, 5, 7],
        '1' => [2, 6, 2, 2, 7],
        '2' => [7, 1, 7, 4, 7],
        '3' => [7, 1, 7, 1, 7],
        '4' => [5, 5, 7, 1, 1],
        '5' => [7, 4, 7, 1, 7],
        '6' => [7, 4, 7, 5, 7],
        '7' => [7, 1, 2, 2, 2],
        '8' => [7, 5, 7, 5, 7],
        '9' => [7, 5, 7, 1, 7],
        '.' => [0, 0, 0, 0, 2],
        ',' => [0, 0, 0, 2, 4],
        ':' => [0, 2, 0, 2, 0],
        '!' => [2, 2, 2, 0, 2],
        '?' => [7, 1, 3, 0, 2],
        '-' => [0, 0, 7, 0, 0],
        '+' => [0, 2, 7, 2, 0],
        '/' => [1, 1, 2, 4, 4],
        '(' => [1, 2, 2, 2, 1],
        ')' => [4, 2, 2, 2, 4],
        '%' => [5, 1, 2, 4, 5],
        '=' => [0, 7, 0, 7, 0],
        _ => [0; 5],
    }
}
