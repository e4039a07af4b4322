//! Configuration for population analysis
//!
//! Every tunable constant of the analysis lives here with its default.
//! Missing TOML keys fall back to the defaults.

use serde::{Deserialize, Serialize};
use sightline_io::IoError;
use sightline_stats::{BinScale, BreakdownSpec, DEFAULT_CONTOUR_MULTIPLIERS};

use crate::error::{AnalysisError, AnalysisResult};

/// Analysis-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Bin width for data-derived bins (in log10 for log scale)
    pub bin_width: f64,
    /// Scale of data-derived bins for velocity widths
    pub scale: BinScale,
    /// Report distributions as probability density
    pub density: bool,
    /// Population divisor for contour levels
    pub sample_scale: f64,
    /// Contour tier multipliers
    pub contour_multipliers: [f64; 3],
    /// Bins per axis for correlation maps
    pub correlation_bins: usize,
    /// Metallicities at or below this are treated as unobservable
    pub min_metallicity: f64,
    /// Added to virial velocities and masses before taking logs (km/s)
    pub virial_offset: f64,
    /// Bin width for edge-statistic distributions (f_peak, f_mm)
    pub edge_bin_width: f64,
    /// Number of metallicity bin edges over [-3, 0]
    pub metallicity_bins: usize,
    /// Number of ionisation-correction bin edges over [-1, 1]
    pub ionisation_bins: usize,
    /// Equivalent widths at or below this are dropped
    pub equivalent_width_cut: f64,
    /// log10 bin width for separated and multiple-halo fractions
    pub fraction_bin_width: f64,
    /// Bin width for the peak fraction breakdown
    pub peak_breakdown_bin_width: f64,
    /// log10 bin width for the v90 / v_vir PDF
    pub ratio_bin_width: f64,
    /// Sightlines at or above this temperature are dropped (K)
    pub temperature_cut: f64,
    /// Bins per axis for the temperature-density map
    pub temperature_bins: usize,
    /// Population divisor for the temperature-density contours
    pub temperature_sample_scale: f64,
    /// Virial velocity ranges for the velocity width breakdown
    pub velocity_breakdown: BreakdownSpec,
    /// Virial velocity ranges for the peak fraction breakdown
    pub peak_breakdown: BreakdownSpec,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bin_width: 0.1,
            scale: BinScale::Log10,
            density: true,
            sample_scale: 40.0,
            contour_multipliers: DEFAULT_CONTOUR_MULTIPLIERS,
            correlation_bins: 10,
            min_metallicity: 1e-4,
            virial_offset: 0.1,
            edge_bin_width: 0.03,
            metallicity_bins: 20,
            ionisation_bins: 80,
            equivalent_width_cut: 0.002,
            fraction_bin_width: 0.2,
            peak_breakdown_bin_width: 0.05,
            ratio_bin_width: 0.1,
            temperature_cut: 1e5,
            temperature_bins: 40,
            temperature_sample_scale: 300.0,
            velocity_breakdown: velocity_breakdown_preset(),
            peak_breakdown: peak_breakdown_preset(),
        }
    }
}

/// Virial velocity ranges `< 60`, `60-120`, `> 120` km/s
pub fn velocity_breakdown_preset() -> BreakdownSpec {
    BreakdownSpec::default()
        .with_range(0.0, 60.0, "< 60")
        .with_range(60.0, 120.0, "60-120")
        .with_range(120.0, 900.0, "> 120")
}

/// Virial velocity ranges `< 50`, `> 50` km/s
pub fn peak_breakdown_preset() -> BreakdownSpec {
    BreakdownSpec::default()
        .with_range(0.0, 50.0, "< 50")
        .with_range(50.0, 900.0, "> 50")
}

impl AnalysisConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> AnalysisResult<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file
    pub fn from_file(path: &str) -> AnalysisResult<Self> {
        let content = std::fs::read_to_string(path).map_err(IoError::from)?;
        Self::from_toml_str(&content)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> AnalysisResult<String> {
        toml::to_string_pretty(self).map_err(|e| AnalysisError::Config(e.to_string()))
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_bin_width(mut self, bin_width: f64) -> Self {
        self.bin_width = bin_width;
        self
    }

    pub fn with_scale(mut self, scale: BinScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_density(mut self, density: bool) -> Self {
        self.density = density;
        self
    }

    pub fn with_sample_scale(mut self, sample_scale: f64) -> Self {
        self.sample_scale = sample_scale;
        self
    }

    pub fn with_correlation_bins(mut self, bins: usize) -> Self {
        self.correlation_bins = bins;
        self
    }

    pub fn with_min_metallicity(mut self, min_metallicity: f64) -> Self {
        self.min_metallicity = min_metallicity;
        self
    }

    pub fn with_virial_offset(mut self, offset: f64) -> Self {
        self.virial_offset = offset;
        self
    }

    pub fn with_velocity_breakdown(mut self, spec: BreakdownSpec) -> Self {
        self.velocity_breakdown = spec;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> AnalysisResult<()> {
        let widths = [
            ("bin_width", self.bin_width),
            ("edge_bin_width", self.edge_bin_width),
            ("fraction_bin_width", self.fraction_bin_width),
            ("peak_breakdown_bin_width", self.peak_breakdown_bin_width),
            ("ratio_bin_width", self.ratio_bin_width),
        ];
        for (name, width) in widths {
            if !(width.is_finite() && width > 0.0) {
                return Err(AnalysisError::Config(format!(
                    "{} must be positive, got {}",
                    name, width
                )));
            }
        }

        if !(self.sample_scale > 0.0 && self.temperature_sample_scale > 0.0) {
            return Err(AnalysisError::Config(
                "sample scales must be positive".to_string(),
            ));
        }

        if self.correlation_bins == 0 || self.temperature_bins == 0 {
            return Err(AnalysisError::Config(
                "correlation maps need at least one bin per axis".to_string(),
            ));
        }

        if self.metallicity_bins < 2 || self.ionisation_bins < 2 {
            return Err(AnalysisError::Config(
                "fixed tables need at least two edges".to_string(),
            ));
        }

        if !(self.virial_offset.is_finite() && self.virial_offset >= 0.0) {
            return Err(AnalysisError::Config(format!(
                "virial_offset must be non-negative, got {}",
                self.virial_offset
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.bin_width, 0.1);
        assert_eq!(config.scale, BinScale::Log10);
        assert!(config.density);
        assert_eq!(config.sample_scale, 40.0);
        assert_eq!(config.contour_multipliers, [0.15, 1.0, 10.0]);
        assert_eq!(config.correlation_bins, 10);
        assert_eq!(config.min_metallicity, 1e-4);
        assert_eq!(config.virial_offset, 0.1);
        assert_eq!(config.edge_bin_width, 0.03);
        assert_eq!(config.metallicity_bins, 20);
        assert_eq!(config.velocity_breakdown.ranges().len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml_str("bin_width = 0.2\nscale = \"Linear\"\n").unwrap();
        assert_eq!(config.bin_width, 0.2);
        assert_eq!(config.scale, BinScale::Linear);
        assert_eq!(config.sample_scale, 40.0);
        assert_eq!(config.peak_breakdown, peak_breakdown_preset());
    }

    #[test]
    fn test_toml_breakdown_override() {
        let toml = r#"
[[velocity_breakdown]]
low = 0.0
high = 100.0
label = "small"

[[velocity_breakdown]]
low = 100.0
high = 900.0
label = "large"
"#;
        let config = AnalysisConfig::from_toml_str(toml).unwrap();
        let labels: Vec<&str> = config
            .velocity_breakdown
            .ranges()
            .iter()
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(labels, vec!["small", "large"]);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AnalysisConfig::default().with_virial_offset(0.5);
        let parsed = AnalysisConfig::from_toml_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects() {
        assert!(AnalysisConfig::default().with_bin_width(0.0).validate().is_err());
        assert!(AnalysisConfig::default().with_sample_scale(-1.0).validate().is_err());
        assert!(AnalysisConfig::default().with_correlation_bins(0).validate().is_err());
        assert!(AnalysisConfig::default().with_virial_offset(-0.1).validate().is_err());
        assert!(matches!(
            AnalysisConfig::from_toml_str("bin_width = -1.0"),
            Err(AnalysisError::Config(_))
        ));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("bin_width = \"wide\""),
            Err(AnalysisError::Config(_))
        ));
    }
}
