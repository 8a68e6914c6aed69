use std::collections::BTreeMap;

use crate::Sequenced;

/// Evidence that a sibling set's orders are not exactly `1..=N`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DensityViolation {
    pub len: usize,
    /// Positions in `1..=N` that no sibling holds.
    pub missing: Vec<i32>,
    /// Positions held by more than one sibling.
    pub duplicates: Vec<i32>,
    /// Orders outside `1..=N`.
    pub out_of_range: Vec<i32>,
}

impl std::fmt::Display for DensityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ORDER_NOT_DENSE (n={}): missing={:?} duplicates={:?} out_of_range={:?}",
            self.len, self.missing, self.duplicates, self.out_of_range
        )
    }
}

impl std::error::Error for DensityViolation {}

/// Verify that `orders` is a permutation of `1..=N`.
pub fn check_dense<I>(orders: I) -> Result<(), DensityViolation>
where
    I: IntoIterator<Item = i32>,
{
    let mut seen: BTreeMap<i32, usize> = BTreeMap::new();
    let mut len = 0usize;
    for o in orders {
        *seen.entry(o).or_default() += 1;
        len += 1;
    }

    let upper = i32::try_from(len).unwrap_or(i32::MAX);
    let mut v = DensityViolation {
        len,
        ..Default::default()
    };

    for (&o, &count) in &seen {
        if o < 1 || o > upper {
            v.out_of_range.push(o);
        }
        if count > 1 {
            v.duplicates.push(o);
        }
    }
    for p in 1..=upper {
        if !seen.contains_key(&p) {
            v.missing.push(p);
        }
    }

    if v.missing.is_empty() && v.duplicates.is_empty() && v.out_of_range.is_empty() {
        Ok(())
    } else {
        Err(v)
    }
}

/// [`check_dense`] over a sibling slice.
pub fn check_siblings<T: Sequenced>(siblings: &[T]) -> Result<(), DensityViolation> {
    check_dense(siblings.iter().map(Sequenced::seq_order))
}
