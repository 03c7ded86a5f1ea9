//! Grouped results.

use ahash::AHashMap;

use crate::property::{PropertyValue, ResultProperty};

/// Results partitioned by a property's key, in first-seen group order.
///
/// Groups may store only a capped number of results while still recording
/// the true group size, so counts stay accurate when item storage is
/// bounded.
pub struct ResultGroups<T> {
    grouped_by: &'static str,
    groups: Vec<ResultGroup<T>>,
    index: AHashMap<PropertyValue, usize>,
    total_results: usize,
}

/// One group of results sharing a key.
pub struct ResultGroup<T> {
    key: PropertyValue,
    items: Vec<T>,
    total_size: usize,
}

impl<T> ResultGroup<T> {
    pub fn key(&self) -> &PropertyValue {
        &self.key
    }

    /// The stored results (possibly fewer than [`total_size`](Self::total_size)).
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The true number of results in this group.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn is_truncated(&self) -> bool {
        self.items.len() < self.total_size
    }
}

impl<T: Clone> ResultGroups<T> {
    pub(crate) fn build<P>(
        criteria: &P,
        items: &[T],
        max_per_group: Option<usize>,
    ) -> ResultGroups<T>
    where
        P: ResultProperty<T> + ?Sized,
    {
        let mut index: AHashMap<PropertyValue, usize> = AHashMap::new();
        let mut groups: Vec<ResultGroup<T>> = Vec::new();
        for item in items {
            let key = criteria.get(item);
            let slot = match index.get(&key) {
                Some(&slot) => slot,
                None => {
                    let slot = groups.len();
                    index.insert(key.clone(), slot);
                    groups.push(ResultGroup {
                        key,
                        items: Vec::new(),
                        total_size: 0,
                    });
                    slot
                }
            };
            let group = &mut groups[slot];
            group.total_size += 1;
            if max_per_group.is_none_or(|max| group.items.len() < max) {
                group.items.push(item.clone());
            }
        }
        ResultGroups {
            grouped_by: criteria.name(),
            groups,
            index,
            total_results: items.len(),
        }
    }
}

impl<T> ResultGroups<T> {
    /// Name of the property the results were grouped by.
    pub fn grouped_by(&self) -> &'static str {
        self.grouped_by
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of results across all groups, before any per-group cap.
    pub fn total_results(&self) -> usize {
        self.total_results
    }

    pub fn get(&self, key: &PropertyValue) -> Option<&ResultGroup<T>> {
        self.index.get(key).map(|&slot| &self.groups[slot])
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &ResultGroup<T>> {
        self.groups.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::Hit;
    use crate::property::HitProperty;

    fn items() -> Vec<Hit> {
        vec![
            Hit::new(2, 0, 1),
            Hit::new(1, 3, 4),
            Hit::new(2, 7, 8),
            Hit::new(1, 9, 10),
            Hit::new(2, 12, 13),
        ]
    }

    #[test]
    fn groups_preserve_first_seen_order() {
        let groups = ResultGroups::build(&HitProperty::Doc, &items(), None);
        assert_eq!(groups.grouped_by(), "doc");
        assert_eq!(groups.len(), 2);
        let keys: Vec<PropertyValue> = groups.iter().map(|g| g.key().clone()).collect();
        assert_eq!(keys, vec![PropertyValue::Int(2), PropertyValue::Int(1)]);
        assert_eq!(groups.total_results(), 5);
    }

    #[test]
    fn per_group_cap_keeps_true_sizes() {
        let groups = ResultGroups::build(&HitProperty::Doc, &items(), Some(1));
        let doc2 = groups.get(&PropertyValue::Int(2)).expect("group");
        assert_eq!(doc2.items().len(), 1);
        assert_eq!(doc2.total_size(), 3);
        assert!(doc2.is_truncated());

        let doc1 = groups.get(&PropertyValue::Int(1)).expect("group");
        assert_eq!(doc1.total_size(), 2);
    }

    #[test]
    fn unknown_key_is_absent() {
        let groups = ResultGroups::build(&HitProperty::Doc, &items(), None);
        assert!(groups.get(&PropertyValue::Int(9)).is_none());
    }
}
