//! End-to-end scenarios for the statistics engine

use rstest::rstest;
use sightline_stats::{
    breakdown, correlate, histogram, make_bins, BinEdges, BinScale, BreakdownSpec,
    CorrelationOptions, FilterIndex, Histogram, StatsError,
};

#[test]
fn test_linear_counts_over_unit_bins() {
    let values = [1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 3.0];
    let edges = make_bins(&values, 1.0, BinScale::Linear).unwrap();
    assert_eq!(edges.as_slice(), &[1.0, 2.0, 3.0, 4.0]);

    let series = histogram(&values, &edges, false).unwrap();
    assert_eq!(series.values, vec![2.0, 2.0, 3.0]);
    assert_eq!(series.centers, vec![1.5, 2.5, 3.5]);
}

#[test]
fn test_breakdown_excludes_sightlines_without_halo() {
    let values = [10.0, 20.0, 30.0, 40.0];
    let halo = [-1.0, 50.0, 150.0, 80.0];
    let spec = BreakdownSpec::default()
        .with_range(0.0, 100.0, "low")
        .with_range(100.0, 900.0, "high");

    let result = breakdown(&values, &FilterIndex::All, &halo, &spec, 10.0, BinScale::Linear)
        .unwrap();

    let low = result.curve("low").unwrap();
    let high = result.curve("high").unwrap();
    assert_eq!(low.count, 2);
    assert_eq!(high.count, 1);

    // Index 0 (no halo) is in the total but in no range
    let selected: Vec<usize> = (0..result.total.len())
        .filter(|&bin| low.fractions[bin] > 0.0)
        .collect();
    assert_eq!(selected, vec![1, 3]);
    assert_eq!(result.total[0], 1);
    assert_eq!(low.fractions[0] + high.fractions[0], 0.0);
    assert_eq!(high.fractions[2], 1.0);
}

#[test]
fn test_power_law_correlation() {
    let x = [1.0, 10.0, 100.0];
    let options = CorrelationOptions::new(3).with_log(true, true).with_fit(true);
    let map = correlate(&x, &x, &options).unwrap();
    let fit = map.fit.unwrap();
    assert!((fit.slope() - 1.0).abs() < 1e-9);
    assert!(fit.intercept().abs() < 1e-9);
}

#[rstest]
#[case(1.0, 0)]
#[case(2.0, 1)]
#[case(3.0, 2)]
#[case(2.5, 1)]
fn test_edge_value_belongs_to_upper_bin(#[case] value: f64, #[case] bin: usize) {
    let edges = BinEdges::from_edges(vec![1.0, 2.0, 3.0, 4.0], BinScale::Linear).unwrap();
    let hist = Histogram::new(&[value], &edges);
    assert_eq!(hist.counts()[bin], 1);
    assert_eq!(hist.total(), 1);
}

#[rstest]
#[case(&[], BinScale::Linear)]
#[case(&[5.0, 5.0], BinScale::Linear)]
#[case(&[5.0, 5.0], BinScale::Log10)]
fn test_degenerate_inputs(#[case] values: &[f64], #[case] scale: BinScale) {
    assert!(matches!(
        make_bins(values, 0.1, scale),
        Err(StatsError::DegenerateRange { .. })
    ));
}

#[test]
fn test_zero_substitution_leaves_inputs_untouched() {
    let values = vec![1.5, 3.5];
    let edges = BinEdges::from_edges(vec![1.0, 2.0, 3.0, 4.0], BinScale::Linear).unwrap();
    let before = (values.clone(), edges.clone());

    let total = Histogram::new(&values, &edges);
    let subset = Histogram::new(&values[..1], &edges);
    let fractions = subset.fraction_of(&total).unwrap();

    assert_eq!(fractions, vec![1.0, 0.0, 0.0]);
    assert_eq!(total.counts(), &[1, 0, 1]);
    assert_eq!((values, edges), before);
}
