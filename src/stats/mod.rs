// src/stats/mod.rs
use serde::Serialize;
use std::{cmp::Ordering, collections::BTreeMap, fmt};

/// How a group's values are folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Sum,
}

/// One output row of a group-by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group<K> {
    pub key: K,
    pub value: f64,
    pub count: usize,
}

/// Group `rows` by `key`, folding `value` with `agg`. Output is ordered by key.
pub fn group_by<'a, T, K, FK, FV, I>(rows: I, key: FK, value: FV, agg: Aggregate) -> Vec<Group<K>>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    K: Ord,
    FK: Fn(&T) -> K,
    FV: Fn(&T) -> f64,
{
    // (sum, count)
    let mut acc: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = acc.entry(key(row)).or_insert((0.0, 0));
        entry.0 += value(row);
        entry.1 += 1;
    }

    acc.into_iter()
        .map(|(key, (sum, count))| {
            let value = match agg {
                Aggregate::Sum => sum,
                Aggregate::Mean => sum / count as f64,
            };
            Group { key, value, count }
        })
        .collect()
}

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Month label that sorts by calendar position. Labels that are not month names
/// sort after December, alphabetically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthKey {
    label: String,
    index: Option<usize>,
}

impl MonthKey {
    pub fn new(label: &str) -> Self {
        let lower = label.trim().to_ascii_lowercase();
        let index = if lower.len() >= 3 {
            MONTHS
                .iter()
                .position(|m| lower.starts_with(m))
                .filter(|&i| is_month_name(&lower, i))
        } else {
            None
        };
        Self {
            label: label.trim().to_string(),
            index,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// 1-based calendar month, when recognised.
    pub fn month_number(&self) -> Option<u32> {
        self.index.map(|i| i as u32 + 1)
    }
}

// "mar" and "march" are months, "marble" is not.
fn is_month_name(lower: &str, idx: usize) -> bool {
    const FULL: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    lower == MONTHS[idx] || lower == FULL[idx] || (idx == 8 && lower == "sept")
}

impl Ord for MonthKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.index, other.index) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.label.cmp(&other.label)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.label.cmp(&other.label),
        }
    }
}

impl PartialOrd for MonthKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
