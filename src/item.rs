use serde::{Deserialize, Serialize};

pub type ItemId = i64;

/// A confession as seen by the layout. Item sets arrive most-recent-first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Unix milliseconds.
    pub created_at: i64,
    /// 0 or missing means the scorer rejected the text.
    #[serde(default)]
    pub severity: Option<u8>,
    #[serde(default)]
    pub content: String,
}

impl Item {
    #[inline]
    pub fn severity(&self) -> u8 {
        self.severity.unwrap_or(0)
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.severity() >= 1
    }
}

/// Valid items first, then invalid ones, each group in input order.
/// Position in the returned vector is the item's spiral index.
pub fn priority_order(items: &[Item]) -> Vec<&Item> {
    let (mut valid, invalid): (Vec<&Item>, Vec<&Item>) =
        items.iter().partition(|item| item.is_valid());
    valid.extend(invalid);
    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: ItemId, severity: Option<u8>) -> Item {
        Item {
            id,
            created_at: 1_700_000_000_000 - id,
            severity,
            content: String::new(),
        }
    }

    #[test]
    fn missing_severity_counts_as_invalid() {
        assert!(!item(1, None).is_valid());
        assert!(!item(1, Some(0)).is_valid());
        assert!(item(1, Some(1)).is_valid());
    }

    #[test]
    fn priority_is_stable_within_groups() {
        let items = vec![
            item(5, Some(0)),
            item(4, Some(200)),
            item(3, None),
            item(2, Some(1)),
            item(1, Some(90)),
        ];
        let ids: Vec<ItemId> = priority_order(&items).iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![4, 2, 1, 5, 3]);
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let item: Item = serde_json::from_str(r#"{"id": 7, "created_at": 10}"#).unwrap();
        assert_eq!(item.severity(), 0);
        assert!(item.content.is_empty());
    }
}
