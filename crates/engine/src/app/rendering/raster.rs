use super::primitive::Color;
use super::transform::Viewport;

pub(crate) fn clear(frame: &mut [u8], color: Color) {
    for pixel in frame.chunks_exact_mut(4) {
        pixel.copy_from_slice(&color);
    }
}

fn blend_pixel(frame: &mut [u8], viewport: Viewport, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 || x >= viewport.width as i32 || y >= viewport.height as i32 {
        return;
    }
    let offset = (y as usize * viewport.width as usize + x as usize) * 4;
    let Some(pixel) = frame.get_mut(offset..offset + 4) else {
        return;
    };
    if color[3] == 255 {
        pixel.copy_from_slice(&color);
        return;
    }
    let alpha = color[3] as u16;
    for channel in 0..3 {
        let blended = (color[channel] as u16 * alpha + pixel[channel] as u16 * (255 - alpha)) / 255;
        pixel[channel] = blended as u8;
    }
}

fn fill_span(frame: &mut [u8], viewport: Viewport, y: i32, x_start: i32, x_end: i32, color: Color) {
    let start = x_start.max(0);
    let end = x_end.min(viewport.width as i32 - 1);
    for x in start..=end {
        blend_pixel(frame, viewport, x, y, color);
    }
}

/// Scanline fill for convex polygons in screen space.
pub(crate) fn fill_convex_polygon(
    frame: &mut [u8],
    viewport: Viewport,
    points: &[(f32, f32)],
    color: Color,
) {
    if points.len() < 3 || viewport.width == 0 || viewport.height == 0 {
        return;
    }

    let min_y = points.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
    let max_y = points.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);
    let first_row = (min_y.ceil() as i32).max(0);
    let last_row = (max_y.ceil() as i32 - 1).min(viewport.height as i32 - 1);

    for row in first_row..=last_row {
        let scan_y = row as f32 + 0.5;
        let mut span_min = f32::INFINITY;
        let mut span_max = f32::NEG_INFINITY;
        for (index, start) in points.iter().enumerate() {
            let end = points[(index + 1) % points.len()];
            let (low, high) = if start.1 <= end.1 {
                (*start, end)
            } else {
                (end, *start)
            };
            if scan_y < low.1 || scan_y >= high.1 || (high.1 - low.1).abs() < f32::EPSILON {
                continue;
            }
            let t = (scan_y - low.1) / (high.1 - low.1);
            let x = low.0 + (high.0 - low.0) * t;
            span_min = span_min.min(x);
            span_max = span_max.max(x);
        }
        if span_min <= span_max {
            fill_span(
                frame,
                viewport,
                row,
                span_min.round() as i32,
                span_max.round() as i32 - 1,
                color,
            );
        }
    }
}

pub(crate) fn fill_square(
    frame: &mut [u8],
    viewport: Viewport,
    center_x: f32,
    center_y: f32,
    half_size: f32,
    color: Color,
) {
    let half = half_size.max(0.5);
    let x_start = (center_x - half).round() as i32;
    let x_end = (center_x + half).round() as i32 - 1;
    let y_start = (center_y - half).round() as i32;
    let y_end = (center_y + half).round() as i32 - 1;
    for y in y_start.max(0)..=y_end.min(viewport.height as i32 - 1) {
        fill_span(frame, viewport, y, x_start, x_end.max(x_start), color);
    }
}

/// Darkens the frame towards its edges; `strength` 1 leaves only a small lit center.
pub(crate) fn apply_vignette(frame: &mut [u8], viewport: Viewport, strength: f32) {
    let strength = strength.clamp(0.0, 1.0);
    if strength <= 0.0 || viewport.width == 0 || viewport.height == 0 {
        return;
    }

    let half_width = viewport.width as f32 * 0.5;
    let half_height = viewport.height as f32 * 0.5;
    let inner = 0.75 - 0.55 * strength;
    for (index, pixel) in frame.chunks_exact_mut(4).enumerate() {
        let x = (index % viewport.width as usize) as f32 + 0.5;
        let y = (index / viewport.width as usize) as f32 + 0.5;
        let dx = (x - half_width) / half_width;
        let dy = (y - half_height) / half_height;
        let distance = (dx * dx + dy * dy).sqrt() / std::f32::consts::SQRT_2;
        let edge = ((distance - inner) / (1.0 - inner)).clamp(0.0, 1.0);
        let keep = 1.0 - edge * (0.35 + 0.65 * strength);
        for channel in pixel.iter_mut().take(3) {
            *channel = (*channel as f32 * keep) as u8;
        }
    }
}
