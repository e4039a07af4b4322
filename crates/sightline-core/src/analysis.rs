//! Population-level analyses over a [`SpectraAccessor`].
//!
//! Each operation pulls the arrays it needs from the accessor, applies the
//! species filter and halo association, and hands the result to the
//! statistics engine. Results are plain data (`BinnedSeries`, `Breakdown`,
//! `CorrelationMap`, `KsResult`) ready for a presentation layer.

use sightline_io::ReferenceSample;
use sightline_stats::{
    breakdown, correlate, histogram, ks_2d_2sample, log10_checked, median, BinEdges, BinScale,
    BinnedSeries, Breakdown, BreakdownSpec, ContourScale, CorrelationMap, CorrelationOptions,
    FilterIndex, Histogram, KsResult, PointSet2D, SampleArray, StatsError, SummaryStats,
};
use tracing::{debug, info, warn};

use crate::accessor::{SightlineFeature, SpectraAccessor};
use crate::config::AnalysisConfig;
use crate::error::AnalysisResult;
use crate::species::Species;

/// Fixed edge table for the velocity amplitude distribution: `arange(0, 10, 0.2)`
const VELOCITY_AMPLITUDE_TABLE: (f64, f64, f64) = (0.0, 10.0, 0.2);

/// log10 span of the separated-fraction table: `10 ** arange(1, 3, dv)` km/s
const SEPARATED_LOG_SPAN: (f64, f64) = (1.0, 3.0);

/// log10 metallicity span of the metallicity distributions
const METALLICITY_LOG_SPAN: (f64, f64) = (-3.0, 0.0);

/// log10 span of the ionisation correction distribution
const IONISATION_LOG_SPAN: (f64, f64) = (-1.0, 1.0);

/// Analyses of one population under one configuration
pub struct PopulationAnalysis<'a, A: SpectraAccessor + ?Sized> {
    accessor: &'a A,
    config: &'a AnalysisConfig,
}

impl<'a, A: SpectraAccessor + ?Sized> PopulationAnalysis<'a, A> {
    pub fn new(accessor: &'a A, config: &'a AnalysisConfig) -> Self {
        Self { accessor, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.config
    }

    /// Velocity width distribution of the sightlines detected in `species`
    pub fn velocity_width_distribution(&self, species: &Species) -> AnalysisResult<BinnedSeries> {
        let vels = self.filtered(SightlineFeature::VelocityWidth(species.clone()), species)?;
        self.data_binned(&vels, self.config.bin_width, self.config.scale, "velocity width")
    }

    /// Equivalent width distribution above `eq_cut` (the configured cut when `None`)
    pub fn equivalent_width_distribution(
        &self,
        species: &Species,
        line: u32,
        eq_cut: Option<f64>,
    ) -> AnalysisResult<BinnedSeries> {
        let cut = eq_cut.unwrap_or(self.config.equivalent_width_cut);
        let mut widths =
            self.filtered(SightlineFeature::EquivalentWidth(species.clone(), line), species)?;
        widths.retain(|&w| w > cut);
        self.data_binned(&widths, self.config.bin_width, BinScale::Log10, "equivalent width")
    }

    /// Distribution of the peak-offset edge statistic
    pub fn peak_fraction_distribution(&self, species: &Species) -> AnalysisResult<BinnedSeries> {
        let values = self.filtered(SightlineFeature::PeakFraction(species.clone()), species)?;
        self.data_binned(&values, self.config.edge_bin_width, BinScale::Linear, "peak fraction")
    }

    /// Distribution of the mean-median edge statistic
    pub fn mean_median_distribution(&self, species: &Species) -> AnalysisResult<BinnedSeries> {
        let values =
            self.filtered(SightlineFeature::MeanMedianFraction(species.clone()), species)?;
        self.data_binned(
            &values,
            self.config.edge_bin_width,
            BinScale::Linear,
            "mean-median fraction",
        )
    }

    /// Distribution of per-pixel velocity amplitudes over a fixed table
    pub fn velocity_amplitude_distribution(
        &self,
        species: &Species,
    ) -> AnalysisResult<BinnedSeries> {
        let amplitudes = self
            .accessor
            .scalar(&SightlineFeature::VelocityAmplitude(species.clone()))?;
        require_population(&amplitudes, "velocity amplitude")?;
        let (lo, hi, width) = VELOCITY_AMPLITUDE_TABLE;
        let edges = BinEdges::linear_range(lo, hi, width)?;
        Ok(histogram(&amplitudes, &edges, self.config.density)?)
    }

    /// Fraction of sightlines in each velocity width bin whose absorption
    /// splits into separated components
    pub fn separated_fraction(&self, species: &Species) -> AnalysisResult<BinnedSeries> {
        let filter = self.accessor.filter(species)?;
        let vels =
            filter.select(&self.scalar(SightlineFeature::VelocityWidth(species.clone()))?)?;
        let separated =
            filter.select(&self.scalar(SightlineFeature::Separated(species.clone()))?)?;

        let (lo, hi) = SEPARATED_LOG_SPAN;
        let edges = BinEdges::log_range(lo, hi, self.config.fraction_bin_width)?;
        let split: Vec<f64> = vels
            .iter()
            .zip(&separated)
            .filter(|(_, flag)| **flag != 0.0 && !flag.is_nan())
            .map(|(v, _)| *v)
            .collect();
        fraction_series(&split, &vels, &edges, "separated")
    }

    /// Velocity width histogram split by the virial velocity of the host halo
    pub fn velocity_width_breakdown(&self, species: &Species) -> AnalysisResult<Breakdown> {
        self.virial_breakdown(
            SightlineFeature::VelocityWidth(species.clone()),
            species,
            self.config.bin_width,
            BinScale::Log10,
            &self.config.velocity_breakdown,
        )
    }

    /// Peak fraction histogram split by the virial velocity of the host halo
    pub fn peak_fraction_breakdown(&self, species: &Species) -> AnalysisResult<Breakdown> {
        self.virial_breakdown(
            SightlineFeature::PeakFraction(species.clone()),
            species,
            self.config.peak_breakdown_bin_width,
            BinScale::Linear,
            &self.config.peak_breakdown,
        )
    }

    /// Fraction of halo-associated sightlines, per velocity width bin, that
    /// lie near more than one halo
    pub fn multiple_halo_fraction(&self, species: &Species) -> AnalysisResult<BinnedSeries> {
        let selection = self.halo_selection(species)?;
        let vels =
            selection.select(&self.scalar(SightlineFeature::VelocityWidth(species.clone()))?)?;
        let nearby = selection.select(&self.scalar(SightlineFeature::NearbyHaloCount)?)?;
        require_population(&vels, "multiple halo fraction")?;

        let edges = BinEdges::from_values(&vels, self.config.fraction_bin_width, BinScale::Log10)?;
        let multiple: Vec<f64> = vels
            .iter()
            .zip(&nearby)
            .filter(|(_, count)| **count > 1.0)
            .map(|(v, _)| *v)
            .collect();
        fraction_series(&multiple, &vels, &edges, "multiple halo")
    }

    /// Distribution of log10 gas metallicity
    pub fn metallicity_distribution(&self) -> AnalysisResult<BinnedSeries> {
        let metallicity = self.scalar(SightlineFeature::Metallicity)?;
        self.metallicity_series(&metallicity, "metallicity")
    }

    /// Distribution of log10 metallicity inferred from one ion
    pub fn ion_metallicity_distribution(&self, species: &Species) -> AnalysisResult<BinnedSeries> {
        let metallicity = self.scalar(SightlineFeature::IonMetallicity(species.clone()))?;
        self.metallicity_series(&metallicity, "ion metallicity")
    }

    /// Distribution of `log10(Z_ion / Z)`
    pub fn ionisation_correction_distribution(
        &self,
        species: &Species,
    ) -> AnalysisResult<BinnedSeries> {
        let metallicity = self.scalar(SightlineFeature::Metallicity)?;
        let ion_metallicity = self.scalar(SightlineFeature::IonMetallicity(species.clone()))?;
        if metallicity.len() != ion_metallicity.len() {
            return Err(StatsError::LengthMismatch {
                left: "metallicity".to_string(),
                left_len: metallicity.len(),
                right: "ion metallicity".to_string(),
                right_len: ion_metallicity.len(),
            }
            .into());
        }
        require_population(&metallicity, "ionisation correction")?;

        let log_z = log10_checked(&metallicity, "metallicity")?;
        let log_ion = log10_checked(&ion_metallicity, "ion metallicity")?;
        let correction: Vec<f64> = log_ion.iter().zip(&log_z).map(|(i, z)| i - z).collect();

        let ratio: Vec<f64> = correction.iter().map(|c| 10f64.powf(*c)).collect();
        let stats = SummaryStats::from_data(&ratio);
        info!(
            species = %species,
            count = stats.count,
            missing = stats.missing,
            min = stats.min,
            max = stats.max,
            median = stats.median,
            "ionisation correction Z_ion / Z"
        );

        let (lo, hi) = IONISATION_LOG_SPAN;
        let edges = BinEdges::linspace(lo, hi, self.config.ionisation_bins)?;
        Ok(histogram(&correction, &edges, self.config.density)?)
    }

    /// Metallicity against velocity width for every observable sightline,
    /// with a power-law fit
    pub fn metallicity_vs_velocity_width(&self, species: &Species) -> AnalysisResult<CorrelationMap> {
        let vels = self.scalar(SightlineFeature::VelocityWidth(species.clone()))?;
        let metallicity = self.scalar(SightlineFeature::Metallicity)?;
        let min = self.config.min_metallicity;
        let (x, y): (Vec<f64>, Vec<f64>) = vels
            .iter()
            .zip(&metallicity)
            .filter(|(_, z)| **z > min)
            .map(|(v, z)| (*v, *z))
            .unzip();

        let options = self
            .correlation_options(self.config.correlation_bins, self.config.sample_scale)
            .with_fit(true);
        Ok(correlate(&x, &y, &options)?)
    }

    /// Metallicity against host halo mass
    pub fn metallicity_vs_mass(&self) -> AnalysisResult<CorrelationMap> {
        let nearest = self.accessor.nearest_halo()?;
        let selection = nearest.associated();
        let metallicity = selection.select(&self.scalar(SightlineFeature::Metallicity)?)?;
        let halos = selection.select(&nearest.halo)?;
        let mass = self.accessor.halo_mass(&halos)?;

        let (min, offset) = (self.config.min_metallicity, self.config.virial_offset);
        let (x, y): (Vec<f64>, Vec<f64>) = mass
            .iter()
            .zip(&metallicity)
            .filter(|(_, z)| **z > min)
            .map(|(m, z)| (m + offset, *z))
            .unzip();

        let options =
            self.correlation_options(self.config.correlation_bins, self.config.sample_scale);
        Ok(correlate(&x, &y, &options)?)
    }

    /// Velocity width against the virial velocity of the host halo
    pub fn velocity_width_vs_virial_velocity(
        &self,
        species: &Species,
    ) -> AnalysisResult<CorrelationMap> {
        let (vels, virial) = self.velocity_and_virial(species)?;
        let offset = self.config.virial_offset;
        let x: Vec<f64> = virial.iter().map(|v| v + offset).collect();

        let options =
            self.correlation_options(self.config.correlation_bins, self.config.sample_scale);
        Ok(correlate(&x, &vels, &options)?)
    }

    /// Density-weighted temperature against total density, for gas below
    /// the temperature cut
    pub fn temperature_vs_density(&self, species: &Species) -> AnalysisResult<CorrelationMap> {
        let temperature =
            self.scalar(SightlineFeature::DensityWeightedTemperature(species.clone()))?;
        let density = self.scalar(SightlineFeature::TotalDensity(species.clone()))?;
        let cut = self.config.temperature_cut;
        let (x, y): (Vec<f64>, Vec<f64>) = density
            .iter()
            .zip(&temperature)
            .filter(|(_, t)| **t < cut)
            .map(|(n, t)| (*n, *t))
            .unzip();
        info!(
            species = %species,
            median = ?median(&temperature),
            median_below_cut = ?median(&y),
            "density-weighted temperature"
        );

        let options = self
            .correlation_options(
                self.config.temperature_bins,
                self.config.temperature_sample_scale,
            )
            .with_log(true, false);
        Ok(correlate(&x, &y, &options)?)
    }

    /// PDF of `v90 / v_vir` in log10, with re-exponentiated bin centers
    pub fn velocity_width_virial_ratio_pdf(
        &self,
        species: &Species,
    ) -> AnalysisResult<BinnedSeries> {
        let (vels, virial) = self.velocity_and_virial(species)?;
        let offset = self.config.virial_offset;
        let ratio: Vec<f64> = vels
            .iter()
            .zip(&virial)
            .map(|(v, vir)| v / (vir + offset))
            .collect();
        require_population(&ratio, "v90 / v_vir")?;

        let edges = BinEdges::from_values(&ratio, self.config.ratio_bin_width, BinScale::Log10)?;
        let log_ratio = log10_checked(&ratio, "v90 / v_vir")?;
        let pdf = Histogram::new(&log_ratio, &edges.log_domain()).density()?;
        info!(species = %species, median = ?median(&ratio), "median v90 / v_vir");
        Ok(BinnedSeries::new(edges.centers(), pdf))
    }

    /// 2D KS test of `(log Z, log v90)` against an observed sample
    pub fn ks_test(&self, reference: &ReferenceSample, species: &Species) -> AnalysisResult<KsResult> {
        let filter = self.accessor.filter(species)?;
        let metallicity = filter.select(&self.scalar(SightlineFeature::Metallicity)?)?;
        let vels =
            filter.select(&self.scalar(SightlineFeature::VelocityWidth(species.clone()))?)?;

        let simulated = PointSet2D::log_pairs(&metallicity, &vels)?;
        let observed = PointSet2D::log_pairs(&reference.metallicity, &reference.velocity_width)?;
        let result = ks_2d_2sample(&observed, &simulated)?;
        info!(
            species = %species,
            statistic = result.statistic,
            p_value = result.p_value,
            "2D KS test against reference sample"
        );
        Ok(result)
    }

    fn scalar(&self, feature: SightlineFeature) -> AnalysisResult<SampleArray> {
        self.accessor.scalar(&feature)
    }

    fn filtered(&self, feature: SightlineFeature, species: &Species) -> AnalysisResult<SampleArray> {
        let values = self.accessor.scalar(&feature)?;
        Ok(self.accessor.filter(species)?.select(&values)?)
    }

    /// Sightlines detected in `species` that also have a nearest halo
    fn halo_selection(&self, species: &Species) -> AnalysisResult<FilterIndex> {
        let nearest = self.accessor.nearest_halo()?;
        let filter = self.accessor.filter(species)?;
        Ok(filter.and(&nearest.associated(), self.accessor.num_sightlines())?)
    }

    /// Velocity widths and host virial velocities over [`halo_selection`](Self::halo_selection)
    fn velocity_and_virial(&self, species: &Species) -> AnalysisResult<(SampleArray, SampleArray)> {
        let selection = self.halo_selection(species)?;
        let vels =
            selection.select(&self.scalar(SightlineFeature::VelocityWidth(species.clone()))?)?;
        let halos = selection.select(&self.accessor.nearest_halo()?.halo)?;
        let virial = self.accessor.virial_velocity(&halos)?;
        Ok((vels, virial))
    }

    fn virial_breakdown(
        &self,
        feature: SightlineFeature,
        species: &Species,
        bin_width: f64,
        scale: BinScale,
        spec: &BreakdownSpec,
    ) -> AnalysisResult<Breakdown> {
        let values = self.accessor.scalar(&feature)?;
        let filter = self.accessor.filter(species)?;
        let virial = self.accessor.virial_velocity_per_sightline()?;
        Ok(breakdown(&values, &filter, &virial, spec, bin_width, scale)?)
    }

    fn data_binned(
        &self,
        values: &[f64],
        bin_width: f64,
        scale: BinScale,
        context: &str,
    ) -> AnalysisResult<BinnedSeries> {
        require_population(values, context)?;
        let edges = BinEdges::from_values(values, bin_width, scale)?;
        debug!(
            quantity = context,
            population = values.len(),
            bins = edges.num_bins(),
            "binned distribution"
        );
        Ok(histogram(values, &edges, self.config.density)?)
    }

    fn metallicity_series(&self, metallicity: &[f64], axis: &str) -> AnalysisResult<BinnedSeries> {
        require_population(metallicity, axis)?;
        let log_z = log10_checked(metallicity, axis)?;
        let (lo, hi) = METALLICITY_LOG_SPAN;
        let edges = BinEdges::linspace(lo, hi, self.config.metallicity_bins)?;
        Ok(histogram(&log_z, &edges, self.config.density)?)
    }

    fn correlation_options(&self, n_bins: usize, sample_scale: f64) -> CorrelationOptions {
        let contours = ContourScale::new(self.accessor.num_sightlines(), sample_scale)
            .with_multipliers(self.config.contour_multipliers);
        CorrelationOptions::new(n_bins).with_contours(contours)
    }
}

fn require_population(values: &[f64], context: &str) -> AnalysisResult<()> {
    if values.is_empty() {
        return Err(StatsError::EmptyPopulation {
            context: format!("no {} samples selected", context),
        }
        .into());
    }
    Ok(())
}

/// `hist(subset) / max(hist(all), 1)` over `edges`
fn fraction_series(
    subset: &[f64],
    all: &[f64],
    edges: &BinEdges,
    label: &str,
) -> AnalysisResult<BinnedSeries> {
    let total = Histogram::new(all, edges);
    let part = Histogram::new(subset, edges);
    let empty_bins = total.counts().iter().filter(|&&c| c == 0).count();
    if empty_bins > 0 {
        warn!(
            fraction = label,
            empty_bins, "empty denominator bins substituted with 1"
        );
    }
    Ok(BinnedSeries::new(total.centers(), part.fraction_of(&total)?))
}
