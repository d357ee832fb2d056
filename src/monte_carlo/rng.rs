//! Seedable random number generation for the simulators.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Reproducible generator for uniform and normal variates.
///
/// Normals use the Box–Muller transform; the second variate of each pair
/// is kept for the next call.
///
/// # Example
///
/// ```
/// use folio_analytics::monte_carlo::MonteCarloRng;
///
/// let mut a = MonteCarloRng::new(7);
/// let mut b = MonteCarloRng::new(7);
/// assert_eq!(a.normal(0.001, 0.02), b.normal(0.001, 0.02));
/// ```
#[derive(Debug, Clone)]
pub struct MonteCarloRng {
    rng: StdRng,
    seed: u64,
    spare: Option<f64>,
}

impl MonteCarloRng {
    /// Generator seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            spare: None,
        }
    }

    /// Seed this generator was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform variate in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Standard normal variate.
    pub fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        // (0, 1] keeps the logarithm finite
        let u1 = 1.0 - self.uniform();
        let u2 = self.uniform();
        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;
        self.spare = Some(radius * theta.sin());
        radius * theta.cos()
    }

    /// Normal variate with the given mean and standard deviation.
    pub fn normal(&mut self, mean: f64, std: f64) -> f64 {
        mean + std * self.standard_normal()
    }
}
