use bivariate::univariate::{TabularDistribution, TabularUnivariateDistribution, UniformDistribution};
use std::sync::Arc;

pub type SharedDist = Arc<dyn TabularUnivariateDistribution<f64>>;

/// Primary grid of the three-bin fixture.
#[allow(dead_code)]
pub const PRIMARY_GRID: [f64; 4] = [0.1, 1.0, 2.0, 3.0];

/// Secondary distributions of the three-bin fixture.
///
/// The distribution of the first grid point is reused at the last one.
#[allow(dead_code)]
pub fn three_bin_secondaries() -> Vec<SharedDist> {
    let d0: SharedDist = Arc::new(UniformDistribution::new(2.5, 7.5, 0.1).unwrap());
    let d1: SharedDist = Arc::new(TabularDistribution::new(vec![2.0, 5.0, 10.0], vec![0.1, 1.0, 0.1]).unwrap());
    let d2: SharedDist = Arc::new(TabularDistribution::new(vec![1.0, 4.0, 8.0], vec![0.2, 0.8, 0.4]).unwrap());

    vec![d0.clone(), d1, d2, d0]
}

/// Secondary distributions of the elastic fixture at 1 and 2 MeV.
#[allow(dead_code)]
pub fn elastic_secondaries() -> Vec<SharedDist> {
    let d0: SharedDist =
        Arc::new(TabularDistribution::new(vec![-1.0, 0.0, 0.999999], vec![0.1, 0.5, 1.0]).unwrap());
    let d1: SharedDist =
        Arc::new(TabularDistribution::new(vec![-1.0, 0.0, 0.999999], vec![1.0, 5.0, 10.0]).unwrap());

    vec![d0, d1]
}
