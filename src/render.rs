use rayon::prelude::*;

use crate::config::Params;
use crate::cull::ViewBounds;
use crate::geom::{Point, Viewport};
use crate::item::Item;
use crate::store::Positions;

// Severity ramp from the product canvas
const INVALID_GRAY: [u8; 4] = [156, 163, 175, 255];
const SEVERITY_BLUE: [u8; 4] = [30, 150, 255, 255];
const SEVERITY_PURPLE: [u8; 4] = [180, 60, 255, 255];
const SEVERITY_RED: [u8; 4] = [255, 30, 100, 255];

const BACKGROUND: [u8; 4] = [250, 250, 252, 255];
const SCREEN_EDGE: [u8; 4] = [120, 120, 130, 255];

#[inline]
fn lerp_color(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t).round() as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t).round() as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t).round() as u8,
        255,
    ]
}

/// Bubble fill for a severity score: gray for 0, blue to purple over 1..=127,
/// purple to red over 128..=255.
pub fn severity_color(severity: u8) -> [u8; 4] {
    match severity {
        0 => INVALID_GRAY,
        1..=127 => lerp_color(SEVERITY_BLUE, SEVERITY_PURPLE, (severity - 1) as f32 / 126.0),
        _ => lerp_color(SEVERITY_PURPLE, SEVERITY_RED, (severity - 128) as f32 / 127.0),
    }
}

struct Disc {
    cx: f32,
    cy: f32,
    r: f32,
    color: [u8; 4],
}

/// Pixel dimensions of the preview for a pan and viewport at `scale`.
pub fn preview_size(
    offset: Point,
    viewport: Viewport,
    params: &Params,
    scale: f64,
) -> (usize, usize) {
    let bounds = ViewBounds::new(offset, viewport, params.cull_buffer);
    let w = (bounds.width() * scale).ceil().max(1.0) as usize;
    let h = (bounds.height() * scale).ceil().max(1.0) as usize;
    (w, h)
}

/// Rasterize the culled region of a layout.
///
/// The image covers `bounds` at `scale` pixels per world unit; the on-screen
/// part (`offset` + `viewport`) is outlined. Items are drawn oldest first so
/// newer bubbles sit on top. Returns `(rgba, width, height)`.
pub fn render_layout(
    items: &[&Item],
    positions: &Positions,
    offset: Point,
    viewport: Viewport,
    params: &Params,
    scale: f64,
) -> (Vec<u8>, usize, usize) {
    let bounds = ViewBounds::new(offset, viewport, params.cull_buffer);
    let (w, h) = preview_size(offset, viewport, params, scale);
    let to_px = |p: Point| {
        (
            ((p.x - bounds.left) * scale) as f32,
            ((p.y - bounds.top) * scale) as f32,
        )
    };

    let r = (params.bubble_radius() * scale) as f32;
    let discs: Vec<Disc> = items
        .iter()
        .rev()
        .filter_map(|item| {
            let (cx, cy) = to_px(*positions.get(&item.id)?);
            Some(Disc {
                cx,
                cy,
                r,
                color: severity_color(item.severity()),
            })
        })
        .collect();

    let (sx0, sy0) = to_px(Point::new(-offset.x, -offset.y));
    let (sx1, sy1) = to_px(Point::new(-offset.x + viewport.width, -offset.y + viewport.height));
    let on_edge = |v: f32, edge: f32| (v - edge).abs() < 1.0;

    let mut rgba = vec![0u8; w * h * 4];
    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        let py = y as f32 + 0.5;
        let row_discs: Vec<&Disc> = discs
            .iter()
            .filter(|d| (py - d.cy).abs() <= d.r)
            .collect();

        for x in 0..w {
            let px = x as f32 + 0.5;
            let mut color = BACKGROUND;
            for d in &row_discs {
                let dx = px - d.cx;
                let dy = py - d.cy;
                if dx * dx + dy * dy <= d.r * d.r {
                    color = d.color;
                }
            }
            let inside_x = px >= sx0 && px <= sx1;
            let inside_y = py >= sy0 && py <= sy1;
            if (inside_y && (on_edge(px, sx0) || on_edge(px, sx1)))
                || (inside_x && (on_edge(py, sy0) || on_edge(py, sy1)))
            {
                color = SCREEN_EDGE;
            }
            row[x * 4..x * 4 + 4].copy_from_slice(&color);
        }
    });

    (rgba, w, h)
}
