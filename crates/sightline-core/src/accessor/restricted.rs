//! Restriction of a population to halo-associated sightlines

use sightline_stats::{FilterIndex, SampleArray};
use tracing::debug;

use super::{NearestHalo, SightlineFeature, SpectraAccessor};
use crate::error::AnalysisResult;
use crate::species::Species;

/// A view over the sightlines of `A` that have a nearest halo.
///
/// Rows with `halo < 0` are dropped, and so are rows farther than
/// `max_distance` when one is given (a NaN distance never passes the cut).
/// Every per-sightline array and filter is re-indexed to the kept rows.
/// Halo lookups and per-pixel features pass through unchanged.
#[derive(Clone, Debug)]
pub struct HaloRestrictedAccessor<A> {
    inner: A,
    rows: Vec<usize>,
    max_distance: Option<f64>,
}

impl<A: SpectraAccessor> HaloRestrictedAccessor<A> {
    /// Keep every sightline with an associated halo
    pub fn new(inner: A) -> AnalysisResult<Self> {
        Self::build(inner, None)
    }

    /// Keep sightlines whose nearest halo lies within `max_distance`
    pub fn within(inner: A, max_distance: f64) -> AnalysisResult<Self> {
        Self::build(inner, Some(max_distance))
    }

    fn build(inner: A, max_distance: Option<f64>) -> AnalysisResult<Self> {
        let nearest = inner.nearest_halo()?;
        let rows: Vec<usize> = nearest
            .halo
            .iter()
            .zip(&nearest.distance)
            .enumerate()
            .filter(|(_, (halo, distance))| {
                **halo >= 0 && max_distance.map_or(true, |max| **distance <= max)
            })
            .map(|(i, _)| i)
            .collect();
        debug!(
            total = inner.num_sightlines(),
            kept = rows.len(),
            max_distance = ?max_distance,
            "restricted population to halo-associated sightlines"
        );
        Ok(Self {
            inner,
            rows,
            max_distance,
        })
    }

    /// Indices of the kept sightlines in the wrapped population
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn max_distance(&self) -> Option<f64> {
        self.max_distance
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }

    fn take<T: Copy>(&self, values: &[T]) -> AnalysisResult<Vec<T>> {
        Ok(FilterIndex::Indices(self.rows.clone()).select(values)?)
    }
}

impl<A: SpectraAccessor> SpectraAccessor for HaloRestrictedAccessor<A> {
    fn num_sightlines(&self) -> usize {
        self.rows.len()
    }

    fn scalar(&self, feature: &SightlineFeature) -> AnalysisResult<SampleArray> {
        let values = self.inner.scalar(feature)?;
        if feature.is_per_pixel() {
            return Ok(values);
        }
        self.take(&values)
    }

    fn filter(&self, species: &Species) -> AnalysisResult<FilterIndex> {
        let domain = self.inner.num_sightlines();
        let mut mask = vec![false; domain];
        for i in self.inner.filter(species)?.indices(domain)? {
            mask[i] = true;
        }
        Ok(FilterIndex::Mask(self.take(&mask)?))
    }

    fn nearest_halo(&self) -> AnalysisResult<NearestHalo> {
        let nearest = self.inner.nearest_halo()?;
        Ok(NearestHalo {
            halo: self.take(&nearest.halo)?,
            distance: self.take(&nearest.distance)?,
        })
    }

    fn virial_velocity(&self, halos: &[i64]) -> AnalysisResult<SampleArray> {
        self.inner.virial_velocity(halos)
    }

    fn halo_mass(&self, halos: &[i64]) -> AnalysisResult<SampleArray> {
        self.inner.halo_mass(halos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{FullPopulationAccessor, HaloCatalog};
    use sightline_io::DataTable;

    fn population() -> FullPopulationAccessor {
        let table = DataTable::from_columns(vec![
            ("halo", vec![-1.0, 0.0, 1.0, -1.0, 1.0]),
            ("halo_distance", vec![0.0, 5.0, 50.0, 1.0, 10.0]),
            ("vel_width_Si2", vec![10.0, 20.0, 30.0, 40.0, 50.0]),
            ("filter_Si2", vec![1.0, 1.0, 0.0, 1.0, 1.0]),
        ])
        .unwrap();
        let halos = HaloCatalog::new(vec![40.0, 90.0], vec![1e10, 1e11]).unwrap();
        FullPopulationAccessor::new(table, halos)
    }

    #[test]
    fn test_drops_unassociated_rows() {
        let restricted = HaloRestrictedAccessor::new(population()).unwrap();
        assert_eq!(restricted.rows(), &[1, 2, 4]);
        assert_eq!(restricted.num_sightlines(), 3);

        let vels = restricted
            .scalar(&SightlineFeature::VelocityWidth(Species::silicon_ii()))
            .unwrap();
        assert_eq!(vels, vec![20.0, 30.0, 50.0]);
        assert_eq!(restricted.nearest_halo().unwrap().halo, vec![0, 1, 1]);
    }

    #[test]
    fn test_filter_reindexed() {
        let restricted = HaloRestrictedAccessor::new(population()).unwrap();
        assert_eq!(
            restricted.filter(&Species::silicon_ii()).unwrap(),
            FilterIndex::Mask(vec![true, false, true])
        );
    }

    #[test]
    fn test_distance_cut() {
        let restricted = HaloRestrictedAccessor::within(population(), 20.0).unwrap();
        assert_eq!(restricted.rows(), &[1, 4]);
        assert_eq!(
            restricted.virial_velocity_per_sightline().unwrap(),
            vec![40.0, 90.0]
        );
    }
}
