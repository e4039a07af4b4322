//! Per-sightline sample arrays and the selections applied to them

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

/// One value per sightline (or per qualifying pixel)
pub type SampleArray = Vec<f64>;

/// A selection over the sightline index space
///
/// Selecting always produces a new owned array; the input is never touched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FilterIndex {
    /// Every entry
    All,
    /// Boolean mask, one flag per entry
    Mask(Vec<bool>),
    /// Explicit integer indices, in output order
    Indices(Vec<usize>),
}

impl FilterIndex {
    /// Mask of the entries satisfying `predicate`
    pub fn from_predicate<F>(values: &[f64], predicate: F) -> Self
    where
        F: Fn(f64) -> bool,
    {
        FilterIndex::Mask(values.iter().map(|&v| predicate(v)).collect())
    }

    /// Resolve to explicit indices over a domain of `domain` entries
    pub fn indices(&self, domain: usize) -> StatsResult<Vec<usize>> {
        match self {
            FilterIndex::All => Ok((0..domain).collect()),
            FilterIndex::Mask(mask) => {
                if mask.len() != domain {
                    return Err(StatsError::length_mismatch(
                        "filter mask",
                        mask.len(),
                        "sample",
                        domain,
                    ));
                }
                Ok(mask
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &keep)| keep.then_some(i))
                    .collect())
            }
            FilterIndex::Indices(indices) => {
                if let Some(&index) = indices.iter().find(|&&i| i >= domain) {
                    return Err(StatsError::IndexOutOfBounds {
                        index,
                        size: domain,
                    });
                }
                Ok(indices.clone())
            }
        }
    }

    /// Copy out the selected entries of `values`
    pub fn select<T: Copy>(&self, values: &[T]) -> StatsResult<Vec<T>> {
        match self {
            FilterIndex::All => Ok(values.to_vec()),
            _ => Ok(self
                .indices(values.len())?
                .into_iter()
                .map(|i| values[i])
                .collect()),
        }
    }

    /// Number of entries selected from a domain of `domain` entries
    pub fn count(&self, domain: usize) -> StatsResult<usize> {
        Ok(self.indices(domain)?.len())
    }

    /// Entries selected by both `self` and `other`, as a mask
    pub fn and(&self, other: &FilterIndex, domain: usize) -> StatsResult<FilterIndex> {
        let mut mask = vec![false; domain];
        for i in self.indices(domain)? {
            mask[i] = true;
        }
        let mut both = vec![false; domain];
        for i in other.indices(domain)? {
            both[i] = mask[i];
        }
        Ok(FilterIndex::Mask(both))
    }
}

impl Default for FilterIndex {
    fn default() -> Self {
        FilterIndex::All
    }
}

impl From<Vec<bool>> for FilterIndex {
    fn from(mask: Vec<bool>) -> Self {
        FilterIndex::Mask(mask)
    }
}

impl From<Vec<usize>> for FilterIndex {
    fn from(indices: Vec<usize>) -> Self {
        FilterIndex::Indices(indices)
    }
}

/// Restrict several same-domain arrays with one filter
pub fn select_columns(
    filter: &FilterIndex,
    columns: &[(&str, &[f64])],
) -> StatsResult<Vec<SampleArray>> {
    let Some((first_name, first)) = columns.first() else {
        return Ok(Vec::new());
    };
    for (name, column) in &columns[1..] {
        if column.len() != first.len() {
            return Err(StatsError::length_mismatch(
                first_name,
                first.len(),
                name,
                column.len(),
            ));
        }
    }
    let indices = filter.indices(first.len())?;
    Ok(columns
        .iter()
        .map(|(_, column)| indices.iter().map(|&i| column[i]).collect())
        .collect())
}
