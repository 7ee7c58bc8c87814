use std::collections::HashSet;
use std::time::Instant;

use indexmap::IndexMap;
use serde::Serialize;

use crate::Timing;
use crate::collide::{PairwiseResolver, Resolution, Resolver};
use crate::config::Params;
use crate::cull::visible_items;
use crate::geom::{Point, Viewport};
use crate::identity::viewer_seed;
use crate::item::{Item, ItemId};
use crate::placement::{NewItem, detect_new_item, place_unpositioned};
use crate::rng::Mulberry32;

/// Item id -> world position. Iteration follows first-placement order, which
/// fixes the pair order the resolver walks.
pub type Positions = IndexMap<ItemId, Point>;

/// What one [`LayoutStore::update`] did.
#[derive(Debug, Default, Serialize)]
pub struct UpdateReport {
    pub placed: usize,
    pub pinned: Option<ItemId>,
    pub passes: usize,
    pub converged: bool,
    pub repairs: usize,
    pub pruned: usize,
    #[serde(skip)]
    pub timings: Vec<Timing>,
}

impl UpdateReport {
    fn resolution(&mut self, res: Resolution) {
        self.passes = res.passes;
        self.converged = res.converged;
        self.repairs = res.repairs;
    }
}

/// Owns the long-lived position map for one viewer.
///
/// Callers push new item sets / pan offsets through [`update`](Self::update)
/// and read positions back; nothing else mutates the map.
pub struct LayoutStore<R: Resolver = PairwiseResolver> {
    params: Params,
    seed: u32,
    positions: Positions,
    resolver: R,
}

impl LayoutStore<PairwiseResolver> {
    pub fn new(viewer: Option<&str>, params: Params) -> Self {
        Self::with_resolver(viewer, params, PairwiseResolver)
    }
}

impl<R: Resolver> LayoutStore<R> {
    pub fn with_resolver(viewer: Option<&str>, params: Params, resolver: R) -> Self {
        let seed = viewer_seed(viewer, params.fallback_seed);
        Self {
            params,
            seed,
            positions: Positions::default(),
            resolver,
        }
    }

    /// Resume from positions published by an earlier cycle.
    pub fn with_positions(mut self, positions: Positions) -> Self {
        self.positions = positions;
        self
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn positions(&self) -> &Positions {
        &self.positions
    }

    pub fn position(&self, id: ItemId) -> Option<Point> {
        self.positions.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Recompute after the item set or the pan offset changed.
    ///
    /// Places items lacking a position, resolves overlaps over the whole set,
    /// then drops entries whose id is no longer in `items`. The random stream
    /// restarts from the viewer seed every cycle, so identical inputs give
    /// identical output.
    pub fn update(
        &mut self,
        items: &[Item],
        offset: Point,
        viewport: Viewport,
        new_item: NewItem,
    ) -> UpdateReport {
        let mut report = UpdateReport::default();
        let deduped;
        let items = match first_occurrences(items) {
            Some(kept) => {
                deduped = kept;
                deduped.as_slice()
            }
            None => items,
        };

        let mut rng = Mulberry32::new(self.seed);
        let mut next = self.positions.clone();

        // 1. Initial placement
        let t = Instant::now();
        let pinned = detect_new_item(items, &next, new_item);
        let placement = place_unpositioned(
            items,
            &mut next,
            pinned,
            offset,
            viewport,
            &self.params,
            &mut rng,
        );
        report.placed = placement.placed;
        report.pinned = placement.pinned;
        report.timings.push(Timing::since("placement", t));

        // 2. Collision resolution over every stored bubble
        let t = Instant::now();
        let res = self.resolver.resolve(
            &mut next,
            placement.pinned,
            self.params.min_distance(),
            self.params.max_passes,
            &mut rng,
        );
        report.resolution(res);
        report.timings.push(Timing::since("collision", t));

        // 3. Prune ids that left the authoritative set
        let t = Instant::now();
        let live: HashSet<ItemId> = items.iter().map(|item| item.id).collect();
        let before = next.len();
        next.retain(|id, _| live.contains(id));
        report.pruned = before - next.len();
        report.timings.push(Timing::since("prune", t));

        // 4. Publish
        self.positions = next;

        tracing::debug!(
            items = items.len(),
            placed = report.placed,
            pinned = ?report.pinned,
            passes = report.passes,
            converged = report.converged,
            pruned = report.pruned,
            "layout updated"
        );
        report
    }

    /// Items to render for the current pan, in input order.
    pub fn visible<'a>(&self, items: &'a [Item], offset: Point, viewport: Viewport) -> Vec<&'a Item> {
        visible_items(items, &self.positions, offset, viewport, &self.params)
    }
}

/// `None` when ids are already unique; otherwise the set with later
/// duplicates dropped.
fn first_occurrences(items: &[Item]) -> Option<Vec<Item>> {
    let mut seen = HashSet::with_capacity(items.len());
    if items.iter().all(|item| seen.insert(item.id)) {
        return None;
    }
    tracing::warn!(items = items.len(), "duplicate item ids in input; keeping first occurrence");
    let mut seen = HashSet::with_capacity(items.len());
    Some(
        items
            .iter()
            .filter(|item| seen.insert(item.id))
            .cloned()
            .collect(),
    )
}
