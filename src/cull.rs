use serde::Serialize;

use crate::config::Params;
use crate::geom::{Point, Viewport};
use crate::item::Item;
use crate::store::Positions;

/// Viewport rectangle in world space, grown by a buffer margin so bubbles
/// drifting in from the edge are already mounted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewBounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl ViewBounds {
    pub fn new(offset: Point, viewport: Viewport, buffer: f64) -> Self {
        Self {
            left: -offset.x - buffer,
            right: -offset.x + viewport.width + buffer,
            top: -offset.y - buffer,
            bottom: -offset.y + viewport.height + buffer,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Bounding box of the circle at `center` overlaps the rectangle on both axes.
    #[inline]
    pub fn overlaps_bubble(&self, center: Point, radius: f64) -> bool {
        center.x + radius > self.left
            && center.x - radius < self.right
            && center.y + radius > self.top
            && center.y - radius < self.bottom
    }
}

/// Items to render for the current pan, in input order. Items without a
/// position are skipped.
pub fn visible_items<'a>(
    items: &'a [Item],
    positions: &Positions,
    offset: Point,
    viewport: Viewport,
    params: &Params,
) -> Vec<&'a Item> {
    let bounds = ViewBounds::new(offset, viewport, params.cull_buffer);
    let radius = params.bubble_radius();
    items
        .iter()
        .filter(|item| {
            positions
                .get(&item.id)
                .is_some_and(|p| bounds.overlaps_bubble(*p, radius))
        })
        .collect()
}
