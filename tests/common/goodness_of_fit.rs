use super::util::{erfc, test_rng};
use rand::RngCore;

/// A set of sampling bins regularly distributed between `y0` and `y1`.
///
/// Samples which do not fall within interval `[y0, y1)` are accumulated into
/// the residual.
pub struct Histogram {
    y0: f64,
    y1: f64,
    scale: f64,
    bins: Vec<u64>,
    residual: u64,
}

#[allow(dead_code)]
impl Histogram {
    pub fn new(y0: f64, y1: f64, bin_count: usize) -> Self {
        if bin_count < 1 {
            panic!("Histogram must contain at least one bin");
        }
        Self {
            y0,
            y1,
            scale: bin_count as f64 / (y1 - y0),
            bins: vec![0; bin_count],
            residual: 0,
        }
    }
    pub fn add(&mut self, y: f64) {
        let i = (y - self.y0) * self.scale;
        if i >= 0.0 && i < self.bins.len() as f64 {
            self.bins[i as usize] += 1;
        } else {
            self.residual += 1;
        }
    }
    pub fn bins(&self) -> &[u64] {
        &self.bins
    }
    pub fn residual(&self) -> u64 {
        self.residual
    }
}

/// Returns the upper tail P-value of a chi-square test.
///
/// The number of degrees of freedom `k` is assumed sufficiently large to
/// approximate the chi-square distribution with a normal distribution when
/// computing the p-value.
#[allow(dead_code)]
pub fn chi_square_test<F: Fn(f64) -> f64>(histogram: &Histogram, cdf: F) -> f64 {
    let bins = histogram.bins();
    let n = bins.iter().sum::<u64>() + histogram.residual(); // sample count
    let m = bins.len(); // bin count
    let mut k = m - 1; // degrees of freedom
    let n = n as f64;

    // Contribution to χ² over interval [y0, y1].
    let mut chi_square = 0.0;
    let mut cdf_l = cdf(histogram.y0);
    for (i, &count) in bins.iter().enumerate() {
        let y = histogram.y0 + (i + 1) as f64 / m as f64 * (histogram.y1 - histogram.y0);
        let cdf_r = cdf(y);
        let expected = (cdf_r - cdf_l) * n;
        cdf_l = cdf_r;
        if expected > 0.0 {
            let delta = count as f64 - expected;
            chi_square += delta * delta / expected;
        }
    }
    // Account for the contribution of the residual to χ² if the expected
    // residual is at least equal to 1 sample.
    let expected_residual = (cdf(histogram.y0) + 1.0 - cdf(histogram.y1)) * n;
    if expected_residual > 1.0 {
        let delta = histogram.residual() as f64 - expected_residual;
        chi_square += delta * delta / expected_residual;
        k += 1;
    }

    // Normal approximation of the χ² distribution.
    let k = k as f64;

    0.5 * erfc((chi_square - k) / (2.0 * k).sqrt() / 2f64.sqrt())
}

/// Assess goodness of fit of a sampler based on a χ² test.
#[allow(dead_code)]
pub fn goodness_of_fit<S, F>(
    mut sampler: S,
    cdf: F,
    y0: f64,
    y1: f64,
    sample_count: u64,
    bin_count: usize,
    p_value_threshold: f64,
) where
    S: FnMut(&mut dyn RngCore) -> f64,
    F: Fn(f64) -> f64,
{
    let mut histogram = Histogram::new(y0, y1, bin_count);
    let mut rng = test_rng();

    for _ in 0..sample_count {
        histogram.add(sampler(&mut rng));
    }

    let p_value = chi_square_test(&histogram, cdf);
    println!("P-value: {}", p_value);

    assert!(p_value > p_value_threshold);
}
