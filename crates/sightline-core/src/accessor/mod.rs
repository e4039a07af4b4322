//! Access to per-sightline quantities of a simulated population.
//!
//! The analysis layer never reads files or halo catalogues directly. It asks a
//! [`SpectraAccessor`] for scalar arrays, species filters and halo
//! associations, so the same analysis runs over the full population or over a
//! restricted view of it.
//!
//! # Key Components
//!
//! - [`SpectraAccessor`]: The capability trait every population implements
//! - [`SightlineFeature`]: The scalar quantities an accessor can provide
//! - [`NearestHalo`]: Halo association per sightline (`halo < 0` = none)
//! - [`FullPopulationAccessor`]: Table-backed population with a halo catalogue
//! - [`HaloRestrictedAccessor`]: Only the sightlines with an associated halo

pub mod full;
pub mod restricted;

pub use full::{FullPopulationAccessor, HaloCatalog};
pub use restricted::HaloRestrictedAccessor;

use serde::{Deserialize, Serialize};
use sightline_stats::{FilterIndex, SampleArray};

use crate::error::AnalysisResult;
use crate::species::Species;

/// Column holding the nearest halo index of each sightline
pub const HALO_COLUMN: &str = "halo";

/// Column holding the distance to the nearest halo
pub const HALO_DISTANCE_COLUMN: &str = "halo_distance";

/// A scalar quantity available per sightline (or per qualifying pixel)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SightlineFeature {
    /// 90% optical depth velocity width (km/s)
    VelocityWidth(Species),
    /// Equivalent width of one transition, identified by its wavelength
    EquivalentWidth(Species, u32),
    /// Peak-offset edge statistic
    PeakFraction(Species),
    /// Mean-median edge statistic
    MeanMedianFraction(Species),
    /// 1 where the absorber splits into separated components, else 0
    Separated(Species),
    /// Number of distinct halos near the sightline
    NearbyHaloCount,
    /// Gas metallicity (solar units)
    Metallicity,
    /// Metallicity inferred from a single ion
    IonMetallicity(Species),
    /// Column density (cm^-2)
    ColumnDensity(Species),
    /// Density-weighted temperature (K)
    DensityWeightedTemperature(Species),
    /// Density summed along the sightline (cm^-3)
    TotalDensity(Species),
    /// Velocity amplitude over the virial angular velocity, one per
    /// qualifying pixel rather than per sightline
    VelocityAmplitude(Species),
}

impl SightlineFeature {
    /// Stable column name, e.g. `vel_width_Si2`
    pub fn column_name(&self) -> String {
        match self {
            SightlineFeature::VelocityWidth(s) => format!("vel_width_{}", s.label()),
            SightlineFeature::EquivalentWidth(s, line) => {
                format!("eq_width_{}_{}", s.label(), line)
            }
            SightlineFeature::PeakFraction(s) => format!("f_peak_{}", s.label()),
            SightlineFeature::MeanMedianFraction(s) => format!("f_meanmedian_{}", s.label()),
            SightlineFeature::Separated(s) => format!("separated_{}", s.label()),
            SightlineFeature::NearbyHaloCount => "nearby_halos".to_string(),
            SightlineFeature::Metallicity => "metallicity".to_string(),
            SightlineFeature::IonMetallicity(s) => format!("metallicity_{}", s.label()),
            SightlineFeature::ColumnDensity(s) => format!("col_density_{}", s.label()),
            SightlineFeature::DensityWeightedTemperature(s) => {
                format!("temperature_{}", s.label())
            }
            SightlineFeature::TotalDensity(s) => format!("density_{}", s.label()),
            SightlineFeature::VelocityAmplitude(s) => format!("vel_amplitude_{}", s.label()),
        }
    }

    /// Whether values are indexed by pixel instead of by sightline
    pub fn is_per_pixel(&self) -> bool {
        matches!(self, SightlineFeature::VelocityAmplitude(_))
    }
}

/// Nearest halo of every sightline
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NearestHalo {
    /// Halo index, negative when the sightline has no associated halo
    pub halo: Vec<i64>,
    /// Distance to that halo
    pub distance: Vec<f64>,
}

impl NearestHalo {
    pub fn len(&self) -> usize {
        self.halo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.halo.is_empty()
    }

    /// Mask of sightlines with an associated halo
    pub fn associated(&self) -> FilterIndex {
        FilterIndex::Mask(self.halo.iter().map(|&h| h >= 0).collect())
    }
}

/// Capability interface over a population of sightlines
///
/// Every per-sightline array shares one index space of
/// [`num_sightlines`](Self::num_sightlines) entries. Per-pixel features
/// (see [`SightlineFeature::is_per_pixel`]) have their own length.
pub trait SpectraAccessor {
    /// Number of sightlines in the population
    fn num_sightlines(&self) -> usize;

    /// One value per sightline for `feature`
    fn scalar(&self, feature: &SightlineFeature) -> AnalysisResult<SampleArray>;

    /// Sightlines that show absorption in `species`
    fn filter(&self, species: &Species) -> AnalysisResult<FilterIndex>;

    /// Nearest halo of every sightline
    fn nearest_halo(&self) -> AnalysisResult<NearestHalo>;

    /// Virial velocity of each halo; negative indices give 0
    fn virial_velocity(&self, halos: &[i64]) -> AnalysisResult<SampleArray>;

    /// Mass of each halo; negative indices give 0
    fn halo_mass(&self, halos: &[i64]) -> AnalysisResult<SampleArray>;

    /// Virial velocity of each sightline's nearest halo, 0 where there is none
    fn virial_velocity_per_sightline(&self) -> AnalysisResult<SampleArray> {
        let nearest = self.nearest_halo()?;
        self.virial_velocity(&nearest.halo)
    }
}
