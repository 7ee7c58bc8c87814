//! Layout core for the confession canvas: seeded spiral placement, pinned
//! collision relaxation, viewport culling and the per-viewer position store.

pub mod collide;
pub mod config;
pub mod cull;
pub mod error;
pub mod geom;
pub mod identity;
pub mod item;
pub mod logging;
pub mod placement;
pub mod render;
pub mod rng;
pub mod sample;
pub mod store;

use std::time::Instant;

pub use collide::{GridResolver, PairwiseResolver, Resolution, Resolver};
pub use config::Params;
pub use cull::{ViewBounds, visible_items};
pub use error::{Error, Result};
pub use geom::{Point, Viewport};
pub use item::{Item, ItemId};
pub use placement::NewItem;
pub use store::{LayoutStore, Positions, UpdateReport};

#[derive(Clone, Debug)]
pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

impl Timing {
    pub fn since(name: &'static str, start: Instant) -> Self {
        Self {
            name,
            ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    }
}
