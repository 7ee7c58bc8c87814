use crate::item::{Item, ItemId};
use crate::rng::Rng;

const SALT_SAMPLE: u64 = 0x5EED_B0B1_E000_0001;

const PHRASES: [&str; 8] = [
    "I ate my roommate's leftovers and blamed the cat",
    "I never read the terms and conditions",
    "I pretend to know wines at dinner parties",
    "I re-gifted a present to the person who gave it",
    "I told my boss the build was green",
    "asdfghjkl",
    "I still have a library book from 2009",
    "buy cheap followers now",
];

/// Synthetic most-recent-first item set: ids `count..=1`, newest first,
/// roughly a fifth of them scored 0 and a few never scored.
pub fn sample_items(count: usize, seed: u64) -> Vec<Item> {
    let mut rng = Rng::new(seed ^ SALT_SAMPLE);
    let now_ms: i64 = 1_760_000_000_000;
    let mut created_at = now_ms;

    (0..count)
        .map(|i| {
            let id = (count - i) as ItemId;
            created_at -= 1_000 + rng.range_usize(600_000) as i64;
            let roll = rng.range_f32(0.0, 1.0);
            let severity = if roll < 0.05 {
                None
            } else if roll < 0.2 {
                Some(0)
            } else {
                Some(1 + (rng.next_u32() % 255) as u8)
            };
            Item {
                id,
                created_at,
                severity,
                content: PHRASES[rng.range_usize(PHRASES.len())].to_string(),
            }
        })
        .collect()
}

/// Item that would appear at the head of the next refresh.
pub fn next_submission(items: &[Item], severity: u8, created_at: i64) -> Item {
    let id = items.iter().map(|item| item.id).max().unwrap_or(0) + 1;
    Item {
        id,
        created_at,
        severity: Some(severity),
        content: PHRASES[id as usize % PHRASES.len()].to_string(),
    }
}
