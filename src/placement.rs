use std::f64::consts::PI;

use crate::config::Params;
use crate::geom::{Point, Viewport};
use crate::item::{Item, ItemId, priority_order};
use crate::rng::Mulberry32;
use crate::store::Positions;

/// How the caller identifies the item created in this cycle, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NewItem {
    /// The write path reported the inserted id (or that nothing was inserted).
    Tagged(Option<ItemId>),
    /// No tag available: treat the head of the most-recent-first list as new
    /// when it has no position yet and the set grew past the stored count.
    /// Misfires if two items land between refreshes.
    #[default]
    FirstUnplaced,
}

/// Resolve the pinned item for this cycle. Only an item without a stored
/// position can be new.
pub fn detect_new_item(items: &[Item], positions: &Positions, new_item: NewItem) -> Option<ItemId> {
    match new_item {
        NewItem::Tagged(Some(id)) => {
            let known = items.iter().any(|item| item.id == id);
            (known && !positions.contains_key(&id)).then_some(id)
        }
        NewItem::Tagged(None) => None,
        NewItem::FirstUnplaced => {
            let head = items.first()?;
            let grew = items.len() > positions.len();
            (grew && !positions.contains_key(&head.id)).then_some(head.id)
        }
    }
}

/// Golden-angle spiral slot `index` around `center`, with seeded jitter.
/// Consumes exactly two draws: angle, then radius.
pub fn spiral_point(index: usize, center: Point, params: &Params, rng: &mut Mulberry32) -> Point {
    let base_angle = index as f64 * params.golden_angle_deg * PI / 180.0;
    let base_radius = (index as f64).sqrt() * params.spiral_spacing;

    let angle = base_angle + rng.spread(PI * params.angle_jitter);
    let radius = base_radius + rng.spread(params.spiral_spacing * params.radius_jitter);

    center.polar(angle, radius)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Placement {
    /// Items that received a position this cycle (pinned one included).
    pub placed: usize,
    pub pinned: Option<ItemId>,
}

/// Give every item without a stored position its initial coordinate.
///
/// The pinned item goes to the viewport center in world space so a fresh
/// submission appears in front of its author wherever they have panned.
/// Everything else takes its priority-order slot on a spiral centered on the
/// unpanned viewport center. Existing entries are never touched.
pub fn place_unpositioned(
    items: &[Item],
    positions: &mut Positions,
    pinned: Option<ItemId>,
    offset: Point,
    viewport: Viewport,
    params: &Params,
    rng: &mut Mulberry32,
) -> Placement {
    let spiral_center = viewport.center();
    let mut placement = Placement::default();

    for (index, item) in priority_order(items).into_iter().enumerate() {
        if positions.contains_key(&item.id) {
            continue;
        }
        let pos = if pinned == Some(item.id) {
            placement.pinned = Some(item.id);
            viewport.world_center(offset)
        } else {
            spiral_point(index, spiral_center, params, rng)
        };
        positions.insert(item.id, pos);
        placement.placed += 1;
    }

    placement
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: ItemId, severity: u8) -> Item {
        Item {
            id,
            created_at: id * 1000,
            severity: Some(severity),
            content: String::new(),
        }
    }

    fn at(positions: &Positions, id: ItemId) -> Point {
        positions[&id]
    }

    fn no_jitter() -> Params {
        Params {
            angle_jitter: 0.0,
            radius_jitter: 0.0,
            ..Params::default()
        }
    }

    #[test]
    fn spiral_without_jitter_follows_golden_angle() {
        let params = no_jitter();
        let mut rng = Mulberry32::new(1);
        let c = Point::new(800.0, 600.0);
        assert_eq!(spiral_point(0, c, &params, &mut rng), c);

        let p = spiral_point(4, c, &params, &mut rng);
        assert!((p.distance(c) - 300.0).abs() < 1e-9);
        let angle = (p.y - c.y).atan2(p.x - c.x);
        let expected = (4.0 * 137.5f64).to_radians();
        assert!((angle - expected.sin().atan2(expected.cos())).abs() < 1e-9);
    }

    #[test]
    fn jitter_is_bounded() {
        let params = Params::default();
        let c = Point::ZERO;
        let mut rng = Mulberry32::new(2024);
        for index in 1..200usize {
            let p = spiral_point(index, c, &params, &mut rng);
            let base = (index as f64).sqrt() * params.spiral_spacing;
            assert!((p.distance(c) - base).abs() <= 0.2 * params.spiral_spacing + 1e-9);
        }
    }

    #[test]
    fn heuristic_flags_head_only_when_set_grew() {
        let items = vec![item(3, 10), item(2, 10), item(1, 10)];
        let mut positions = Positions::default();
        positions.insert(2, Point::ZERO);
        positions.insert(1, Point::ZERO);
        assert_eq!(detect_new_item(&items, &positions, NewItem::FirstUnplaced), Some(3));

        // Same count as the store: not new.
        positions.insert(99, Point::ZERO);
        assert_eq!(detect_new_item(&items, &positions, NewItem::FirstUnplaced), None);
    }

    #[test]
    fn tag_must_name_an_unplaced_member() {
        let items = vec![item(3, 10), item(2, 10)];
        let mut positions = Positions::default();
        positions.insert(2, Point::ZERO);
        assert_eq!(detect_new_item(&items, &positions, NewItem::Tagged(Some(3))), Some(3));
        assert_eq!(detect_new_item(&items, &positions, NewItem::Tagged(Some(2))), None);
        assert_eq!(detect_new_item(&items, &positions, NewItem::Tagged(Some(8))), None);
        assert_eq!(detect_new_item(&items, &positions, NewItem::Tagged(None)), None);
    }

    #[test]
    fn pinned_item_lands_at_world_center() {
        let items = vec![item(3, 0), item(2, 10), item(1, 10)];
        let mut positions = Positions::default();
        let offset = Point::new(-250.0, 75.0);
        let vp = Viewport::new(1000.0, 800.0);
        let mut rng = Mulberry32::new(5);
        let placement = place_unpositioned(
            &items,
            &mut positions,
            Some(3),
            offset,
            vp,
            &Params::default(),
            &mut rng,
        );
        assert_eq!(placement.placed, 3);
        assert_eq!(placement.pinned, Some(3));
        assert_eq!(at(&positions, 3), Point::new(750.0, 325.0));
    }

    #[test]
    fn existing_entries_are_left_alone() {
        let items = vec![item(2, 10), item(1, 10)];
        let mut positions = Positions::default();
        positions.insert(1, Point::new(-5000.0, 42.0));
        let mut rng = Mulberry32::new(5);
        let placement = place_unpositioned(
            &items,
            &mut positions,
            None,
            Point::ZERO,
            Viewport::new(1000.0, 800.0),
            &Params::default(),
            &mut rng,
        );
        assert_eq!(placement.placed, 1);
        assert_eq!(at(&positions, 1), Point::new(-5000.0, 42.0));
    }
}
