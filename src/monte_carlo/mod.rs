//! Forward-looking scenario simulation from a fitted return distribution.
//!
//! - [`monte_carlo`]: distribution of cumulative returns from i.i.d.
//!   normal periodic returns
//! - [`cppi_path`] / [`cppi_simulation`]: Constant Proportion Portfolio
//!   Insurance paths and their outcome distribution
//!
//! Both simulators are seeded by the caller. Scenarios are generated on the
//! rayon pool in blocks of [`BLOCK_SIZE`], block `b` drawing from seed
//! `seed + b`, so a seed gives the same result on any number of threads.
//!
//! # Example
//!
//! ```
//! use folio_analytics::monte_carlo::{cppi_simulation, monte_carlo, CppiParams};
//!
//! let mc = monte_carlo(0.0004, 0.012, 1_000, 126, 42).expect("valid parameters");
//! assert_eq!(mc, monte_carlo(0.0004, 0.012, 1_000, 126, 42).expect("valid parameters"));
//!
//! let params = CppiParams::new(0.0004, 0.012).with_multiplier(4.0).with_floor(0.9);
//! let cppi = cppi_simulation(&params, 500, 42, None).expect("valid parameters");
//! assert!(cppi.breach_probability <= 1.0);
//! ```

mod cppi;
mod rng;
mod simulate;

pub use cppi::{cppi_path, cppi_simulation, CppiParams, CppiPath, CppiSummary};
pub use rng::MonteCarloRng;
pub use simulate::{
    monte_carlo, monte_carlo_with_stop, MonteCarloSummary, SimulationResult, BLOCK_SIZE,
};

#[cfg(test)]
#[path = "simulation_tests.rs"]
mod tests;
