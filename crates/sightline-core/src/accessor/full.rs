//! Table-backed population covering every sightline

use serde::{Deserialize, Serialize};
use sightline_io::{open_file, DataTable};
use sightline_stats::{FilterIndex, SampleArray};
use tracing::debug;

use super::{NearestHalo, SightlineFeature, SpectraAccessor, HALO_COLUMN, HALO_DISTANCE_COLUMN};
use crate::error::{AnalysisError, AnalysisResult};
use crate::species::Species;

/// Per-halo properties, indexed by halo number
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HaloCatalog {
    virial_velocity: Vec<f64>,
    mass: Vec<f64>,
}

impl HaloCatalog {
    pub const VIRIAL_VELOCITY_COLUMN: &'static str = "virial_velocity";
    pub const MASS_COLUMN: &'static str = "mass";

    pub fn new(virial_velocity: Vec<f64>, mass: Vec<f64>) -> AnalysisResult<Self> {
        if virial_velocity.len() != mass.len() {
            return Err(AnalysisError::Config(format!(
                "halo catalogue has {} virial velocities but {} masses",
                virial_velocity.len(),
                mass.len()
            )));
        }
        Ok(Self {
            virial_velocity,
            mass,
        })
    }

    /// Build from a table with `virial_velocity` and `mass` columns
    pub fn from_table(table: &DataTable) -> AnalysisResult<Self> {
        Self::new(
            table.column(Self::VIRIAL_VELOCITY_COLUMN)?.to_vec(),
            table.column(Self::MASS_COLUMN)?.to_vec(),
        )
    }

    /// Load from a CSV/TSV file; row `i` describes halo `i`
    pub fn load(path: &str) -> AnalysisResult<Self> {
        let table = open_file(path)?.read_table()?;
        Self::from_table(&table)
    }

    /// Number of halos
    pub fn len(&self) -> usize {
        self.virial_velocity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.virial_velocity.is_empty()
    }

    pub fn virial_velocity(&self, halos: &[i64]) -> AnalysisResult<SampleArray> {
        self.lookup(&self.virial_velocity, halos)
    }

    pub fn mass(&self, halos: &[i64]) -> AnalysisResult<SampleArray> {
        self.lookup(&self.mass, halos)
    }

    fn lookup(&self, column: &[f64], halos: &[i64]) -> AnalysisResult<SampleArray> {
        halos
            .iter()
            .map(|&halo| {
                if halo < 0 {
                    return Ok(0.0);
                }
                usize::try_from(halo)
                    .ok()
                    .and_then(|i| column.get(i).copied())
                    .ok_or(AnalysisError::MissingHalo {
                        halo,
                        size: column.len(),
                    })
            })
            .collect()
    }
}

/// Every sightline of a run, read from a per-sightline table
///
/// Column conventions:
/// - `halo`, `halo_distance`: nearest halo (negative or empty = none)
/// - `filter_<species>`: non-zero where the species is detected
/// - one column per [`SightlineFeature`], named by
///   [`SightlineFeature::column_name`]
///
/// Per-pixel features live in a separate table.
#[derive(Clone, Debug, Default)]
pub struct FullPopulationAccessor {
    sightlines: DataTable,
    pixels: DataTable,
    halos: HaloCatalog,
}

impl FullPopulationAccessor {
    pub fn new(sightlines: DataTable, halos: HaloCatalog) -> Self {
        Self {
            sightlines,
            pixels: DataTable::default(),
            halos,
        }
    }

    /// Attach the per-pixel table
    pub fn with_pixels(mut self, pixels: DataTable) -> Self {
        self.pixels = pixels;
        self
    }

    /// Load the sightline table and halo catalogue from files
    pub fn load(sightlines_path: &str, halos_path: &str) -> AnalysisResult<Self> {
        let sightlines = open_file(sightlines_path)?.read_table()?;
        let halos = HaloCatalog::load(halos_path)?;
        debug!(
            sightlines = sightlines.num_rows(),
            columns = sightlines.num_columns(),
            halos = halos.len(),
            "loaded population"
        );
        Ok(Self::new(sightlines, halos))
    }

    pub fn sightlines(&self) -> &DataTable {
        &self.sightlines
    }

    pub fn halos(&self) -> &HaloCatalog {
        &self.halos
    }

    fn column(&self, name: &str) -> AnalysisResult<&[f64]> {
        self.sightlines
            .get(name)
            .ok_or_else(|| AnalysisError::missing_column(name))
    }
}

impl SpectraAccessor for FullPopulationAccessor {
    fn num_sightlines(&self) -> usize {
        self.sightlines.num_rows()
    }

    fn scalar(&self, feature: &SightlineFeature) -> AnalysisResult<SampleArray> {
        let name = feature.column_name();
        let values = if feature.is_per_pixel() {
            self.pixels
                .get(&name)
                .ok_or_else(|| AnalysisError::missing_column(name.as_str()))?
        } else {
            self.column(&name)?
        };
        Ok(values.to_vec())
    }

    fn filter(&self, species: &Species) -> AnalysisResult<FilterIndex> {
        let name = format!("filter_{}", species.label());
        if let Some(flags) = self.sightlines.get(&name) {
            return Ok(FilterIndex::from_predicate(flags, |f| f != 0.0 && !f.is_nan()));
        }
        // Without explicit flags, any sightline with a measured column density counts
        let fallback = SightlineFeature::ColumnDensity(species.clone()).column_name();
        match self.sightlines.get(&fallback) {
            Some(density) => Ok(FilterIndex::from_predicate(density, f64::is_finite)),
            None => Err(AnalysisError::missing_column(name)),
        }
    }

    fn nearest_halo(&self) -> AnalysisResult<NearestHalo> {
        let halo = self
            .column(HALO_COLUMN)?
            .iter()
            .map(|&h| if h.is_finite() && h >= 0.0 { h.round() as i64 } else { -1 })
            .collect::<Vec<_>>();
        let distance = match self.sightlines.get(HALO_DISTANCE_COLUMN) {
            Some(d) => d.to_vec(),
            None => vec![f64::NAN; halo.len()],
        };
        Ok(NearestHalo { halo, distance })
    }

    fn virial_velocity(&self, halos: &[i64]) -> AnalysisResult<SampleArray> {
        self.halos.virial_velocity(halos)
    }

    fn halo_mass(&self, halos: &[i64]) -> AnalysisResult<SampleArray> {
        self.halos.mass(halos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population() -> FullPopulationAccessor {
        let table = DataTable::from_columns(vec![
            ("halo", vec![-1.0, 0.0, 1.0, f64::NAN]),
            ("vel_width_Si2", vec![20.0, 40.0, 80.0, 160.0]),
            ("col_density_Si2", vec![1e14, f64::NAN, 1e15, 1e13]),
        ])
        .unwrap();
        let halos = HaloCatalog::new(vec![50.0, 150.0], vec![1e10, 1e11]).unwrap();
        FullPopulationAccessor::new(table, halos)
    }

    #[test]
    fn test_scalar() {
        let pop = population();
        let vels = pop
            .scalar(&SightlineFeature::VelocityWidth(Species::silicon_ii()))
            .unwrap();
        assert_eq!(vels, vec![20.0, 40.0, 80.0, 160.0]);
        assert!(matches!(
            pop.scalar(&SightlineFeature::Metallicity),
            Err(AnalysisError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_filter_falls_back_to_column_density() {
        let pop = population();
        let filter = pop.filter(&Species::silicon_ii()).unwrap();
        assert_eq!(filter, FilterIndex::Mask(vec![true, false, true, true]));
        assert!(pop.filter(&Species::hydrogen()).is_err());
    }

    #[test]
    fn test_explicit_filter_column() {
        let table = DataTable::from_columns(vec![("filter_Si2", vec![1.0, 0.0, f64::NAN])]).unwrap();
        let pop = FullPopulationAccessor::new(table, HaloCatalog::default());
        assert_eq!(
            pop.filter(&Species::silicon_ii()).unwrap(),
            FilterIndex::Mask(vec![true, false, false])
        );
    }

    #[test]
    fn test_nearest_halo() {
        let nearest = population().nearest_halo().unwrap();
        assert_eq!(nearest.halo, vec![-1, 0, 1, -1]);
        assert!(nearest.distance.iter().all(|d| d.is_nan()));
    }

    #[test]
    fn test_virial_velocity_per_sightline() {
        let vvir = population().virial_velocity_per_sightline().unwrap();
        assert_eq!(vvir, vec![0.0, 50.0, 150.0, 0.0]);
    }

    #[test]
    fn test_unknown_halo() {
        let pop = population();
        assert!(matches!(
            pop.halo_mass(&[5]),
            Err(AnalysisError::MissingHalo { halo: 5, size: 2 })
        ));
    }

    #[test]
    fn test_per_pixel_feature() {
        let pixels = DataTable::from_columns(vec![("vel_amplitude_Si2", vec![0.5, 1.5, 2.5])]).unwrap();
        let pop = population().with_pixels(pixels);
        let amp = pop
            .scalar(&SightlineFeature::VelocityAmplitude(Species::silicon_ii()))
            .unwrap();
        assert_eq!(amp.len(), 3);
    }
}
