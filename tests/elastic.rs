mod common;

use approx::assert_relative_eq;
use bivariate::grid::{Correlated, CumulativePoints, GridPolicy, UnitBase, UnitBaseCorrelated};
use bivariate::interpolation::{LinLinLin, LogLogCosLog, LogNudgedLogCosLin};
use bivariate::{
    BasicBivariateDistribution, ElasticBasicBivariateDistribution, FullyTabularBasicBivariateDistribution,
    Tolerances,
};
use common::{elastic_secondaries, test_rng};

const CUTOFF: f64 = 0.999999;

fn elastic<G: GridPolicy>() -> ElasticBasicBivariateDistribution<G, f64> {
    ElasticBasicBivariateDistribution::new(vec![1.0, 2.0], elastic_secondaries(), CUTOFF, Tolerances::default())
        .unwrap()
}

#[test]
fn unit_base_fixture() {
    let dist = elastic::<UnitBase<LogLogCosLog>>();

    assert_relative_eq!(dist.evaluate(1.5, -1.0), 3.84558575793691015399e-01, max_relative = 1e-14);
}

#[test]
fn correlated_fixture() {
    let dist = elastic::<Correlated<LogLogCosLog>>();

    assert_relative_eq!(dist.evaluate(1.5, -1.0), 2.1117818980603434e-01, max_relative = 1e-14);
}

#[test]
fn grid_points() {
    let dist = elastic::<Correlated<LogLogCosLog>>();

    assert_relative_eq!(dist.evaluate(1.0, -1.0), 0.1, max_relative = 1e-15);
    assert_relative_eq!(dist.evaluate(1.0, 0.0), 0.5, max_relative = 1e-15);
    assert_relative_eq!(dist.evaluate(2.0, 0.0), 5.0, max_relative = 1e-15);
    assert_relative_eq!(dist.evaluate(2.0, CUTOFF), 10.0, max_relative = 1e-15);
    assert_eq!(dist.evaluate(0.5, 0.0), 0.0);
    assert_eq!(dist.evaluate(2.5, 0.0), 0.0);
}

#[test]
fn bounds() {
    let mut dist = elastic::<UnitBaseCorrelated<LogLogCosLog>>();

    for &x in &[1.0, 1.3, 2.0] {
        assert_eq!(dist.lower_bound_of_secondary_conditional_indep_var(x), -1.0);
        assert_eq!(dist.upper_bound_of_secondary_conditional_indep_var(x), CUTOFF);
    }
    assert_eq!(dist.lower_bound_of_secondary_conditional_indep_var(0.5), 0.0);
    assert_eq!(dist.upper_bound_of_secondary_conditional_indep_var(2.5), 0.0);

    dist.extend_beyond_primary_indep_limits();
    assert_eq!(dist.lower_bound_of_secondary_conditional_indep_var(0.5), -1.0);
    assert_eq!(dist.upper_bound_of_secondary_conditional_indep_var(2.5), CUTOFF);
}

#[test]
fn cdf() {
    let mut dists: Vec<Box<dyn FullyTabularBasicBivariateDistribution<f64>>> = Vec::new();
    dists.push(Box::new(elastic::<Correlated<LogLogCosLog>>()));
    dists.push(Box::new(elastic::<UnitBaseCorrelated<LogLogCosLog>>()));
    dists.push(Box::new(elastic::<CumulativePoints<LogLogCosLog>>()));
    dists.push(Box::new(elastic::<UnitBase<LogLogCosLog>>()));

    for dist in &dists {
        assert_eq!(dist.evaluate_secondary_conditional_cdf(1.5, -1.0), 0.0);
        assert_relative_eq!(dist.evaluate_secondary_conditional_cdf(1.5, CUTOFF), 1.0, max_relative = 1e-12);

        let mut previous = 0.0;
        for i in 0..=40 {
            let y = -1.0 + (1.0 + CUTOFF) * i as f64 / 40.0;
            let cdf = dist.evaluate_secondary_conditional_cdf(1.5, y);
            assert!(cdf >= previous - 1e-6, "{}: {} < {}", y, cdf, previous);
            previous = cdf;
        }
    }
}

#[test]
fn correlated_sample_cdf_inverse() {
    let dist = elastic::<Correlated<LogLogCosLog>>();
    let mut rng = test_rng();

    for &r in &[0.1, 0.3, 0.5, 0.7, 0.9] {
        let y = dist.sample_secondary_conditional_with_random_number(1.5, &mut rng, r).unwrap();
        assert!(y >= -1.0 && y <= CUTOFF);
        assert_relative_eq!(dist.evaluate_secondary_conditional_cdf(1.5, y), r, max_relative = 1e-5);
    }
}

#[test]
fn sample() {
    let dist = elastic::<UnitBase<LogLogCosLog>>();
    let mut rng = test_rng();

    for &x in &[1.0, 1.25, 1.5, 2.0] {
        for _ in 0..100 {
            let y = dist.sample_secondary_conditional(x, &mut rng).unwrap();
            assert!(y >= -1.0 && y <= CUTOFF);

            let y = dist.sample_secondary_conditional_in_subrange(x, &mut rng, 0.5).unwrap();
            assert!(y >= -1.0 && y <= 0.5);
        }
    }
    assert!(dist.sample_secondary_conditional(2.5, &mut rng).is_err());
}

#[test]
fn nudged_cosine() {
    let dist = ElasticBasicBivariateDistribution::<UnitBase<LogNudgedLogCosLin>, f64>::new(
        vec![1.0, 2.0],
        elastic_secondaries(),
        1.0,
        Tolerances::default(),
    )
    .unwrap();
    assert_eq!(dist.upper_bound_of_secondary_conditional_indep_var(1.5), 1.0);

    let dist = ElasticBasicBivariateDistribution::<Correlated<LinLinLin>, f64>::new(
        vec![1.0, 2.0],
        elastic_secondaries(),
        CUTOFF,
        Tolerances::default(),
    )
    .unwrap();
    assert!(dist.evaluate(1.5, 0.0) > 0.0);
}
